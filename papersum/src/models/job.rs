use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AnalysisResult;

/// Separator used when takeaways are persisted as a single column.
pub const TAKEAWAY_DELIMITER: &str = "|||";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// COMPLETED and FAILED are final; no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Unknown job status: {s}")),
        }
    }
}

/// One request to summarize a URL, tracked through its status lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: i64,
    pub url: String,
    pub status: JobStatus,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub takeaways: Option<Vec<String>>,
    pub methodology: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// The analysis carried by a COMPLETED job.
    pub fn analysis(&self) -> Option<AnalysisResult> {
        if self.status != JobStatus::Completed {
            return None;
        }

        Some(AnalysisResult {
            title: self.title.clone()?,
            summary: self.summary.clone()?,
            takeaways: self.takeaways.clone()?,
            methodology: self.methodology.clone()?,
        })
    }
}

/// Stand-in for a `|` that could merge with the delimiter.
const NEUTRAL_BAR: char = '\u{a6}';

/// Rewrite a takeaway so it cannot be mistaken for, or merge with, the
/// delimiter: every `|` that touches another `|` or sits at either end
/// becomes `¦`. A lone `|` in the middle of text is kept. The result is a
/// fixed point, so already-neutral text is unchanged.
pub fn neutralize_delimiter(takeaway: &str) -> String {
    let chars: Vec<char> = takeaway.chars().collect();
    let last = chars.len().saturating_sub(1);
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let touches_bar = (i > 0 && chars[i - 1] == '|') || chars.get(i + 1) == Some(&'|');
            if c == '|' && (i == 0 || i == last || touches_bar) {
                NEUTRAL_BAR
            } else {
                c
            }
        })
        .collect()
}

pub fn join_takeaways(takeaways: &[String]) -> String {
    takeaways
        .iter()
        .map(|t| neutralize_delimiter(t))
        .collect::<Vec<_>>()
        .join(TAKEAWAY_DELIMITER)
}

pub fn split_takeaways(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined
        .split(TAKEAWAY_DELIMITER)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus) -> Job {
        let now = Utc::now();
        Job {
            id: 1,
            url: "https://example.org/paper.pdf".to_string(),
            status,
            title: None,
            summary: None,
            takeaways: None,
            methodology: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_round_trips_through_its_column_form() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<JobStatus>(), Ok(status));
        }
        assert_eq!("completed".parse::<JobStatus>(), Ok(JobStatus::Completed));
        assert!("DONE".parse::<JobStatus>().is_err());
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_value(JobStatus::Processing).unwrap();
        assert_eq!(json, "PROCESSING");
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn takeaways_keep_order_through_the_delimiter() {
        let takeaways = vec![
            "First finding".to_string(),
            "Second, with a comma".to_string(),
            "Third".to_string(),
        ];
        let joined = join_takeaways(&takeaways);
        assert_eq!(joined, "First finding|||Second, with a comma|||Third");
        assert_eq!(split_takeaways(&joined), takeaways);
        assert!(split_takeaways("").is_empty());
    }

    #[test]
    fn bars_next_to_the_delimiter_survive_a_round_trip() {
        let takeaways = vec![
            "a|".to_string(),
            "b".to_string(),
            "x|||||y".to_string(),
            "|lead".to_string(),
            "either | or".to_string(),
        ];
        let stored: Vec<String> = takeaways.iter().map(|t| neutralize_delimiter(t)).collect();
        assert_eq!(
            stored,
            vec!["a\u{a6}", "b", "x\u{a6}\u{a6}\u{a6}\u{a6}\u{a6}y", "\u{a6}lead", "either | or"]
        );

        assert_eq!(split_takeaways(&join_takeaways(&takeaways)), stored);
        // Neutral text is left alone.
        for t in &stored {
            assert_eq!(&neutralize_delimiter(t), t);
        }
    }

    #[test]
    fn analysis_only_for_completed_jobs() {
        let mut completed = job(JobStatus::Completed);
        completed.title = Some("T".into());
        completed.summary = Some("S".into());
        completed.takeaways = Some(vec!["A".into()]);
        completed.methodology = Some("M".into());
        let analysis = completed.analysis().expect("completed job has analysis");
        assert_eq!(analysis.takeaways, vec!["A".to_string()]);

        assert!(job(JobStatus::Pending).analysis().is_none());
    }
}

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::config::ReplyFormat;
use crate::error::{PapersumError, Result};
use crate::models::{neutralize_delimiter, AnalysisResult};

/// `<tag>` and `</tag>`, any case, whitespace allowed inside the brackets.
struct Marker {
    tag: &'static str,
    open: Regex,
    close: Regex,
}

impl Marker {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            open: Regex::new(&format!(r"(?i)<\s*{tag}\s*>")).expect("marker pattern is valid"),
            close: Regex::new(&format!(r"(?i)<\s*/\s*{tag}\s*>"))
                .expect("marker pattern is valid"),
        }
    }
}

static TITLE: LazyLock<Marker> = LazyLock::new(|| Marker::new("title"));
static SUMMARY: LazyLock<Marker> = LazyLock::new(|| Marker::new("summary"));
static METHODOLOGY: LazyLock<Marker> = LazyLock::new(|| Marker::new("methodology"));
static TAKEAWAYS: LazyLock<Marker> = LazyLock::new(|| Marker::new("takeaways"));
static ITEM: LazyLock<Marker> = LazyLock::new(|| Marker::new("item"));

/// Turn a provider reply into an [`AnalysisResult`].
///
/// All four fields must be present and non-empty or the whole reply is
/// rejected with [`PapersumError::MalformedReply`]; there is no partial result.
pub fn parse_reply(reply: &str, format: ReplyFormat) -> Result<AnalysisResult> {
    match format {
        ReplyFormat::Tagged => parse_tagged(reply),
        ReplyFormat::Json => parse_json(reply),
    }
}

/// Parse `<title>`, `<summary>`, `<methodology>` and `<takeaways>` sections.
///
/// Markers are matched case-insensitively and may carry whitespace inside the
/// brackets. The first occurrence of each section wins. Inside `<takeaways>`
/// every `<item>` starts one takeaway, which runs to its `</item>` or, if that
/// is missing, to the next `<item>`.
pub fn parse_tagged(reply: &str) -> Result<AnalysisResult> {
    let title = section(reply, &TITLE)?;
    let summary = section(reply, &SUMMARY)?;
    let methodology = section(reply, &METHODOLOGY)?;
    let takeaways_block = section(reply, &TAKEAWAYS)?;

    let mut fragments = ITEM.open.split(takeaways_block);
    // Text before the first <item> is not a takeaway.
    fragments.next();

    let takeaways = fragments
        .map(|fragment| {
            let end = ITEM
                .close
                .find(fragment)
                .map_or(fragment.len(), |m| m.start());
            fragment[..end].trim().to_string()
        })
        .collect();

    build_result(title.trim(), summary.trim(), takeaways, methodology.trim())
}

#[derive(Debug, Deserialize)]
struct JsonReply {
    title: Option<String>,
    summary: Option<String>,
    takeaways: Option<Vec<String>>,
    methodology: Option<String>,
}

/// Parse a single JSON object with the four fields, tolerating a code fence
/// or chatter around it.
pub fn parse_json(reply: &str) -> Result<AnalysisResult> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let object = match (start, end) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => {
            return Err(PapersumError::MalformedReply(
                "no JSON object in reply".to_string(),
            ))
        }
    };

    let parsed: JsonReply = serde_json::from_str(object)
        .map_err(|e| PapersumError::MalformedReply(format!("invalid JSON: {e}")))?;

    let missing = |field: &str| PapersumError::MalformedReply(format!("missing \"{field}\""));

    let title = parsed.title.ok_or_else(|| missing("title"))?;
    let summary = parsed.summary.ok_or_else(|| missing("summary"))?;
    let takeaways = parsed.takeaways.ok_or_else(|| missing("takeaways"))?;
    let methodology = parsed.methodology.ok_or_else(|| missing("methodology"))?;

    build_result(
        title.trim(),
        summary.trim(),
        takeaways.into_iter().map(|t| t.trim().to_string()).collect(),
        methodology.trim(),
    )
}

fn build_result(
    title: &str,
    summary: &str,
    takeaways: Vec<String>,
    methodology: &str,
) -> Result<AnalysisResult> {
    for (name, value) in [
        ("title", title),
        ("summary", summary),
        ("methodology", methodology),
    ] {
        if value.is_empty() {
            return Err(PapersumError::MalformedReply(format!("empty {name}")));
        }
    }

    if takeaways.is_empty() {
        return Err(PapersumError::MalformedReply(
            "no takeaway items".to_string(),
        ));
    }

    if let Some(position) = takeaways.iter().position(String::is_empty) {
        return Err(PapersumError::MalformedReply(format!(
            "takeaway {} is empty",
            position + 1
        )));
    }

    // Stored joined by the delimiter; each item must survive the split as one entry.
    let takeaways = takeaways
        .iter()
        .map(|t| neutralize_delimiter(t))
        .collect();

    Ok(AnalysisResult {
        title: title.to_string(),
        summary: summary.to_string(),
        takeaways,
        methodology: methodology.to_string(),
    })
}

fn section<'a>(reply: &'a str, marker: &Marker) -> Result<&'a str> {
    let tag = marker.tag;
    let start = marker
        .open
        .find(reply)
        .ok_or_else(|| PapersumError::MalformedReply(format!("missing <{tag}>")))?
        .end();
    let end = marker
        .close
        .find(&reply[start..])
        .ok_or_else(|| PapersumError::MalformedReply(format!("missing </{tag}>")))?
        .start();

    Ok(&reply[start..start + end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WELL_FORMED: &str = r#"<analysis>
  <title>Sleep Helps Memory</title>
  <summary>Researchers looked at how sleep helps memory.</summary>
  <methodology>A survey of 500 students.</methodology>
  <takeaways>
    <item>Sleep helps</item>
    <item>Naps help a little</item>
  </takeaways>
</analysis>"#;

    fn malformed_reason(reply: &str) -> String {
        match parse_tagged(reply) {
            Err(PapersumError::MalformedReply(reason)) => reason,
            other => panic!("expected malformed reply, got {other:?}"),
        }
    }

    #[test]
    fn parses_well_formed_reply() {
        let result = parse_tagged(WELL_FORMED).unwrap();
        assert_eq!(result.title, "Sleep Helps Memory");
        assert_eq!(
            result.summary,
            "Researchers looked at how sleep helps memory."
        );
        assert_eq!(result.methodology, "A survey of 500 students.");
        assert_eq!(result.takeaways, vec!["Sleep helps", "Naps help a little"]);
    }

    #[test]
    fn missing_methodology_rejects_whole_reply() {
        let reply = WELL_FORMED.replace("<methodology>A survey of 500 students.</methodology>", "");
        assert_eq!(malformed_reason(&reply), "missing <methodology>");
    }

    #[test]
    fn unclosed_section_is_malformed() {
        let reply = "<title>T</title><summary>S<methodology>M</methodology><takeaways><item>A</item></takeaways>";
        assert_eq!(malformed_reason(reply), "missing </summary>");
    }

    #[test]
    fn tolerates_case_and_whitespace_in_markers() {
        let reply = "< TITLE >T</Title>\n<Summary>S</ summary >\n<methodology >M</METHODOLOGY>\n\
                     <takeaways><ITEM> one </item>< item >two</ Item></takeaways>";
        let result = parse_tagged(reply).unwrap();
        assert_eq!(result.title, "T");
        assert_eq!(result.summary, "S");
        assert_eq!(result.methodology, "M");
        assert_eq!(result.takeaways, vec!["one", "two"]);
    }

    #[test]
    fn first_occurrence_wins() {
        let reply = format!("{WELL_FORMED}\n<title>Second Title</title>");
        assert_eq!(parse_tagged(&reply).unwrap().title, "Sleep Helps Memory");
    }

    #[test]
    fn item_without_close_runs_to_next_item() {
        let reply = "<title>T</title><summary>S</summary><methodology>M</methodology>\
                     <takeaways>intro<item>first<item>second</item></takeaways>";
        let result = parse_tagged(reply).unwrap();
        assert_eq!(result.takeaways, vec!["first", "second"]);
    }

    #[test]
    fn keeps_provider_order_and_count() {
        let reply = "<title>T</title><summary>S</summary><methodology>M</methodology>\
                     <takeaways><item>c</item><item>a</item><item>b</item>\
                     <item>d</item><item>e</item></takeaways>";
        assert_eq!(
            parse_tagged(reply).unwrap().takeaways,
            vec!["c", "a", "b", "d", "e"]
        );
    }

    #[test]
    fn empty_fields_are_malformed() {
        let reply = WELL_FORMED.replace("Sleep Helps Memory", "   ");
        assert_eq!(malformed_reason(&reply), "empty title");

        let reply = "<title>T</title><summary>S</summary><methodology>M</methodology>\
                     <takeaways>none</takeaways>";
        assert_eq!(malformed_reason(reply), "no takeaway items");

        let reply = "<title>T</title><summary>S</summary><methodology>M</methodology>\
                     <takeaways><item>a</item><item> </item></takeaways>";
        assert_eq!(malformed_reason(reply), "takeaway 2 is empty");
    }

    #[test]
    fn delimiter_inside_takeaway_is_neutralized() {
        let reply = "<title>T</title><summary>S</summary><methodology>M</methodology>\
                     <takeaways><item>a|||b</item></takeaways>";
        assert_eq!(
            parse_tagged(reply).unwrap().takeaways,
            vec!["a\u{a6}\u{a6}\u{a6}b"]
        );

        let reply = "<title>T</title><summary>S</summary><methodology>M</methodology>\
                     <takeaways><item>either | or</item><item>ends with|</item></takeaways>";
        assert_eq!(
            parse_tagged(reply).unwrap().takeaways,
            vec!["either | or", "ends with\u{a6}"]
        );
    }

    #[test]
    fn parses_fenced_json_reply() {
        let reply = "Here you go:\n```json\n{\"title\": \"T\", \"summary\": \"S\", \
                     \"methodology\": \"M\", \"takeaways\": [\"x\", \"y\"]}\n```";
        let result = parse_reply(reply, ReplyFormat::Json).unwrap();
        assert_eq!(result.title, "T");
        assert_eq!(result.takeaways, vec!["x", "y"]);
    }

    #[test]
    fn json_missing_field_is_malformed() {
        let reply = r#"{"title": "T", "summary": "S", "takeaways": ["x"]}"#;
        match parse_reply(reply, ReplyFormat::Json) {
            Err(PapersumError::MalformedReply(reason)) => {
                assert_eq!(reason, "missing \"methodology\"")
            }
            other => panic!("expected malformed reply, got {other:?}"),
        }
    }

    #[test]
    fn plain_prose_is_malformed_in_both_formats() {
        assert!(matches!(
            parse_reply("I cannot help with that.", ReplyFormat::Tagged),
            Err(PapersumError::MalformedReply(_))
        ));
        assert!(matches!(
            parse_reply("I cannot help with that.", ReplyFormat::Json),
            Err(PapersumError::MalformedReply(_))
        ));
    }
}

//! Prompt templates for document summarization
//!
//! Templates use plain `format!()` interpolation. The extracted text is
//! embedded last, after the output instructions, so a truncated document
//! never cuts off the instructions.

use crate::config::{AnalysisConfig, ReplyFormat};

/// Build the summarization prompt for `text` in the configured reply format.
///
/// `text` is cut to `config.max_chars` characters (not bytes) first.
///
/// # Example
/// ```
/// use papersum::config::AnalysisConfig;
/// use papersum::llm::prompts::analysis_prompt;
///
/// let prompt = analysis_prompt("Mice that slept longer remembered mazes better.", &AnalysisConfig::default());
/// assert!(prompt.contains("<takeaways>"));
/// assert!(prompt.contains("remembered mazes"));
/// ```
pub fn analysis_prompt(text: &str, config: &AnalysisConfig) -> String {
    let text = truncate_chars(text, config.max_chars);
    match config.reply_format {
        ReplyFormat::Tagged => tagged_analysis_prompt(text, config.takeaways),
        ReplyFormat::Json => json_analysis_prompt(text, config.takeaways),
    }
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn takeaway_guidance(count: usize) -> Vec<&'static str> {
    const GUIDANCE: [&str; 4] = [
        "The single most important finding or \"so what?\" of the document.",
        "The second most important finding.",
        "A third key finding or an important limitation the authors mention.",
        "A potential real-world application of the findings, only if there is one.",
    ];

    (0..count.max(1))
        .map(|i| GUIDANCE.get(i).copied().unwrap_or("Another key finding."))
        .collect()
}

fn tagged_analysis_prompt(text: &str, takeaways: usize) -> String {
    let items = takeaway_guidance(takeaways)
        .into_iter()
        .map(|line| format!("    <item>{line}</item>"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a science communicator. Read the document below and explain it to a curious reader with no background in the field.

Reply with exactly this structure and nothing else:
<analysis>
  <title>A short, descriptive title (at most 10 words) suitable for a general audience.</title>
  <summary>One concise paragraph (around 150 words) explaining what was studied, why, and how, at a high-school reading level. Use everyday analogies for new concepts.</summary>
  <methodology>One or two plain sentences describing the study design. Avoid jargon.</methodology>
  <takeaways>
{items}
  </takeaways>
</analysis>

Write exactly {count} <item> entries inside <takeaways>.

<document>
{text}
</document>"#,
        count = takeaways.max(1),
    )
}

fn json_analysis_prompt(text: &str, takeaways: usize) -> String {
    let items = takeaway_guidance(takeaways)
        .into_iter()
        .map(|line| format!("    \"{}\"", line.replace('"', "'")))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"You are a science communicator. Read the document below and explain it to a curious reader with no background in the field.

Respond with valid JSON only, a single object with exactly these fields:
{{
  "title": "A short, descriptive title (at most 10 words) suitable for a general audience.",
  "summary": "One concise paragraph (around 150 words) explaining what was studied, why, and how, at a high-school reading level.",
  "methodology": "One or two plain sentences describing the study design. Avoid jargon.",
  "takeaways": [
{items}
  ]
}}

The "takeaways" array must contain exactly {count} strings.

<document>
{text}
</document>"#,
        count = takeaways.max(1),
    )
}

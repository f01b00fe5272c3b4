use papersum::config::{AnalysisConfig, ReplyFormat};
use papersum::llm::prompts::{analysis_prompt, truncate_chars};

#[test]
fn test_analysis_prompt_substitution() {
    let content = "Participants who slept eight hours recalled more words.";
    let prompt = analysis_prompt(content, &AnalysisConfig::default());

    assert!(prompt.contains(content));
    for marker in ["<title>", "<summary>", "<methodology>", "<takeaways>", "<item>"] {
        assert!(prompt.contains(marker), "missing {marker}");
    }
}

#[test]
fn test_document_comes_after_instructions() {
    let prompt = analysis_prompt("DOCUMENT BODY", &AnalysisConfig::default());

    let instructions = prompt.find("<takeaways>").unwrap();
    let document = prompt.find("DOCUMENT BODY").unwrap();
    assert!(instructions < document);
}

#[test]
fn test_json_prompt_requests_object() {
    let config = AnalysisConfig {
        reply_format: ReplyFormat::Json,
        ..AnalysisConfig::default()
    };
    let prompt = analysis_prompt("text", &config);

    assert!(prompt.contains("valid JSON"));
    assert!(prompt.contains(r#""takeaways""#));
    assert!(!prompt.contains("<takeaways>"));
}

#[test]
fn test_prompts_handle_special_characters() {
    let content = r#"The authors wrote "p < 0.05" & moved on {sic}"#;
    let prompt = analysis_prompt(content, &AnalysisConfig::default());
    assert!(prompt.contains(content));
}

#[test]
fn test_truncation_respects_multibyte_characters() {
    let text = "日本語のテキスト";
    assert_eq!(truncate_chars(text, 3), "日本語");

    let config = AnalysisConfig {
        max_chars: 3,
        ..AnalysisConfig::default()
    };
    let prompt = analysis_prompt(text, &config);
    assert!(prompt.contains("<document>\n日本語\n</document>"));
}

use super::*;

use client_core::{render_summary, Stage};

#[test]
fn progress_bar_fills_proportionally() {
    assert_eq!(progress_bar(0, 10), "Uploading [          ]   0%");
    assert_eq!(progress_bar(46, 10), "Uploading [####      ]  46%");
    assert_eq!(progress_bar(100, 10), "Uploading [##########] 100%");
    assert_eq!(progress_bar(250, 4), "Uploading [####] 100%");
}

#[test]
fn summary_bullets_are_indented() {
    let lines = summary_lines(&render_summary("Overview\n- Point A\n- Point B"));
    assert_eq!(lines, vec!["Overview", "  * Point A", "  * Point B"]);
}

#[test]
fn message_line_names_the_sender() {
    let question = message_line(&Message::user("What is entropy?"));
    let answer = message_line(&Message::assistant("A measure of disorder."));
    assert!(question.ends_with("  you> What is entropy?"));
    assert!(answer.ends_with("tutor> A measure of disorder."));
    assert!(question.starts_with('['));
}

#[test]
fn parses_prompt_commands() {
    assert_eq!(parse_input("  /refine "), Input::Refine);
    assert_eq!(parse_input("/transcript"), Input::Transcript);
    assert_eq!(parse_input("/exit"), Input::Quit);
    assert_eq!(parse_input("   "), Input::Empty);
    assert_eq!(parse_input("/help"), Input::Unknown("/help".to_string()));
    assert_eq!(
        parse_input(" why is the sky blue? "),
        Input::Question("why is the sky blue?".to_string())
    );
}

#[test]
fn stage_changes_are_not_shown_as_notices() {
    let changed = WorkflowEvent::StageChanged {
        from: Stage::Idle,
        to: Stage::Uploading,
    };
    assert_eq!(notice_text(&changed), None);

    let failed = WorkflowEvent::UploadFailed {
        message: "Upload failed. Try again.".to_string(),
    };
    assert_eq!(
        notice_text(&failed).as_deref(),
        Some("! Upload failed. Try again.")
    );
}

#[test]
fn empty_transcript_renders_nothing() {
    assert!(transcript_lines(&ConversationLog::new()).is_empty());
}

//! Plain-text rendering of workflow state for the terminal.

use client_core::{ConversationLog, Message, SummaryBlock, WorkflowEvent};
use shared::domain::Sender;

pub const PROGRESS_BAR_WIDTH: usize = 30;

pub const INTERACTIVE_HELP: &str =
    "Ask a question about the document. Commands: /refine, /transcript, /quit";

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Question(String),
    Refine,
    Transcript,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    match line {
        "/refine" => Input::Refine,
        "/transcript" => Input::Transcript,
        "/quit" | "/exit" => Input::Quit,
        command if command.starts_with('/') => Input::Unknown(command.to_string()),
        question => Input::Question(question.to_string()),
    }
}

pub fn progress_bar(percent: u8, width: usize) -> String {
    let percent = percent.min(100);
    let filled = width * usize::from(percent) / 100;
    format!(
        "Uploading [{}{}] {percent:>3}%",
        "#".repeat(filled),
        " ".repeat(width - filled)
    )
}

pub fn summary_lines(blocks: &[SummaryBlock]) -> Vec<String> {
    blocks
        .iter()
        .map(|block| match block {
            SummaryBlock::Bullet(item) => format!("  * {item}"),
            SummaryBlock::Paragraph(text) => text.clone(),
        })
        .collect()
}

pub fn message_line(message: &Message) -> String {
    let who = match message.sender() {
        Sender::User => "you",
        Sender::Assistant => "tutor",
    };
    format!(
        "[{}] {who:>5}> {}",
        message.sent_at().format("%H:%M:%S"),
        message.text()
    )
}

pub fn transcript_lines(log: &ConversationLog) -> Vec<String> {
    log.iter().map(message_line).collect()
}

/// Text shown for a notice, or `None` for events that only matter to logs.
pub fn notice_text(event: &WorkflowEvent) -> Option<String> {
    match event {
        WorkflowEvent::StageChanged { .. } => None,
        WorkflowEvent::UploadFailed { message } => Some(format!("! {message}")),
        WorkflowEvent::RefineFailed { message } => {
            Some(format!("! Could not refine the summary: {message}"))
        }
        WorkflowEvent::ReplyDegraded { reason } => Some(format!("! Tutor unreachable: {reason}")),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;

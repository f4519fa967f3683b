/// One rendered line of a document summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryBlock {
    /// Line that started with `-`; the marker and surrounding whitespace are stripped.
    Bullet(String),
    Paragraph(String),
}

/// Splits on `\n` only: a trailing newline yields a final empty paragraph and
/// `\r` is kept as part of the line text.
pub fn render_summary(text: &str) -> Vec<SummaryBlock> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| match line.strip_prefix('-') {
            Some(item) => SummaryBlock::Bullet(item.trim().to_string()),
            None => SummaryBlock::Paragraph(line.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_lines_become_bullets() {
        assert_eq!(
            render_summary("- Point A\n- Point B"),
            vec![
                SummaryBlock::Bullet("Point A".to_string()),
                SummaryBlock::Bullet("Point B".to_string()),
            ]
        );
    }

    #[test]
    fn other_lines_stay_paragraphs() {
        assert_eq!(
            render_summary("Overview\n-Tight bullet\n  - indented"),
            vec![
                SummaryBlock::Paragraph("Overview".to_string()),
                SummaryBlock::Bullet("Tight bullet".to_string()),
                SummaryBlock::Paragraph("  - indented".to_string()),
            ]
        );
    }

    #[test]
    fn trailing_newline_and_carriage_returns_are_kept() {
        assert_eq!(
            render_summary("- Point A\r\nClosing\n"),
            vec![
                SummaryBlock::Bullet("Point A".to_string()),
                SummaryBlock::Paragraph("Closing".to_string()),
                SummaryBlock::Paragraph(String::new()),
            ]
        );
        assert_eq!(
            render_summary("Intro\r\n"),
            vec![
                SummaryBlock::Paragraph("Intro\r".to_string()),
                SummaryBlock::Paragraph(String::new()),
            ]
        );
    }

    #[test]
    fn empty_summary_renders_nothing() {
        assert!(render_summary("").is_empty());
    }
}

//! Text shaping for narrative sections.

use crate::document::NarrativeBlock;

/// Extract the overview paragraph from a narrative.
///
/// Everything before the first line starting with `1.` (leading whitespace
/// ignored) is the overview; without such a line the whole text is. A first
/// line starting with `0.` is the section heading and is dropped.
pub fn split_overview(narrative: &str) -> String {
    let mut lines: Vec<&str> = narrative
        .lines()
        .take_while(|line| !line.trim_start().starts_with("1."))
        .collect();

    if lines
        .first()
        .is_some_and(|first| first.trim_start().starts_with("0."))
    {
        lines.remove(0);
    }
    lines.join("\n").trim().to_string()
}

/// Whether a line reads as a numbered section heading (`1.` to `7.`).
fn is_heading(line: &str) -> bool {
    line.chars().take(4).any(|c| ('1'..='7').contains(&c))
}

/// Re-flow the full narrative into headings, bullets and paragraphs.
pub fn reflow(narrative: &str) -> Vec<NarrativeBlock> {
    narrative
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let trimmed = line.trim();
            if is_heading(line) {
                NarrativeBlock::Heading(trimmed.to_string())
            } else if trimmed.starts_with('-') {
                NarrativeBlock::Bullet(trimmed.to_string())
            } else {
                NarrativeBlock::Paragraph(trimmed.to_string())
            }
        })
        .collect()
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const NARRATIVE: &str = "0. Overview\n\
        Acme Corp shows steady adoption.\n\
        \n\
        1. Document Management & Compliance\n\
        - Master record coverage is 40%\n\
        Coverage is improving.\n\
        2. Ownership & Accountability\n\
        - Most live contracts are owned";

    #[test]
    fn overview_is_text_before_first_section() {
        assert_eq!(split_overview(NARRATIVE), "Acme Corp shows steady adoption.");
    }

    #[test]
    fn overview_without_marker_is_whole_text() {
        let text = "Acme Corp is doing well.\nAdoption is high.";
        assert_eq!(split_overview(text), text);
    }

    #[test]
    fn marker_detection_ignores_leading_whitespace() {
        let text = "Intro line\n   1. Section\nbody";
        assert_eq!(split_overview(text), "Intro line");
    }

    #[test]
    fn reflow_classifies_lines() {
        let blocks = reflow(NARRATIVE);
        assert_eq!(blocks[0], NarrativeBlock::Paragraph("0. Overview".into()));
        assert_eq!(
            blocks[2],
            NarrativeBlock::Heading("1. Document Management & Compliance".into())
        );
        assert_eq!(
            blocks[3],
            NarrativeBlock::Bullet("- Master record coverage is 40%".into())
        );
        assert_eq!(blocks[4], NarrativeBlock::Paragraph("Coverage is improving.".into()));
        assert_eq!(blocks.len(), 7);
    }

    #[test]
    fn digits_early_in_a_line_make_a_heading() {
        // Any digit 1-7 in the first four characters counts, matching numbered list output.
        assert!(is_heading("12. Extra"));
        assert!(is_heading("  3) Events"));
        assert!(!is_heading("8. Out of range"));
        assert!(!is_heading("Overall 5 risks"));
    }

    #[test]
    fn title_case_handles_punctuation() {
        assert_eq!(title_case("acme corp"), "Acme Corp");
        assert_eq!(title_case("O'NEIL & sons-LTD"), "O'Neil & Sons-Ltd");
        assert_eq!(title_case("3m inc"), "3M Inc");
    }
}

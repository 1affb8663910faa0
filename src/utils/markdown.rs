//! Markdown normalisation for AI-generated paper insights.

use regex::Regex;
use std::sync::OnceLock;

/// Section titles promoted to `##` headers when they stand on a line of their own
const SECTION_TITLES: &[&str] = &[
    "Executive Summary",
    "Key Findings",
    "Methodology",
    "Significance",
    "Impact",
    "Technical Innovation",
    "Background",
    "Results",
    "Conclusion",
    "Discussion",
    "Future Work",
];

struct Patterns {
    fence: Regex,
    header: Regex,
    bullet: Regex,
    numbered: Regex,
    bold_span: Regex,
    emphasis: Regex,
    blank_run: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            fence: Regex::new(r"```(?:markdown)?[ \t]*\n?")?,
            header: Regex::new(r"^#{2,}[ \t]*(.+)$")?,
            bullet: Regex::new(r"^[ \t]*[-•][ \t]*(.+)$")?,
            numbered: Regex::new(r"^[ \t]*(\d+)\.[ \t]*(\D.*)$")?,
            bold_span: Regex::new(r"\*\*[^*]+\*\*")?,
            emphasis: Regex::new(r"\b\d+(?:\.\d+)?%|\b[A-Z]{2,}\b")?,
            blank_run: Regex::new(r"\n{3,}")?,
        })
    }
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| Patterns::compile().ok())
        .as_ref()
}

/// Normalise raw insights text into clean markdown.
///
/// Code fences are stripped, known section titles become `##` headers padded with blank
/// lines, bullets and numbered items are normalised, and percentages and upper-case
/// acronyms are bolded unless already inside bold text.
pub fn format_insights(raw: &str) -> String {
    let Some(p) = patterns() else {
        return raw.trim().to_string();
    };

    let text = p.fence.replace_all(raw, "");

    let mut lines = Vec::new();
    for line in text.lines() {
        let line = line.trim_end();

        if let Some(title) = section_title(line, p) {
            lines.push(String::new());
            lines.push(format!("## {}", title));
            lines.push(String::new());
            continue;
        }

        let line = if let Some(caps) = p.bullet.captures(line) {
            format!("- {}", emphasize(&caps[1], p))
        } else if let Some(caps) = p.numbered.captures(line) {
            format!("{}. {}", &caps[1], emphasize(&caps[2], p))
        } else {
            emphasize(line, p)
        };
        lines.push(line);
    }

    let joined = lines.join("\n");
    p.blank_run.replace_all(&joined, "\n\n").trim().to_string()
}

fn section_title<'a>(line: &'a str, p: &Patterns) -> Option<&'a str> {
    if let Some(caps) = p.header.captures(line) {
        return caps.get(1).map(|m| m.as_str().trim());
    }

    let candidate = line.trim().trim_end_matches(':').trim_end();
    SECTION_TITLES
        .iter()
        .any(|t| *t == candidate)
        .then_some(candidate)
}

/// Bold percentages and acronyms outside existing `**bold**` spans
fn emphasize(line: &str, p: &Patterns) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for bold in p.bold_span.find_iter(line) {
        out.push_str(&p.emphasis.replace_all(&line[last..bold.start()], "**$0**"));
        out.push_str(bold.as_str());
        last = bold.end();
    }
    out.push_str(&p.emphasis.replace_all(&line[last..], "**$0**"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fences_and_promotes_titles() {
        let raw = "```markdown\nExecutive Summary\nThe model works.\nKey Findings:\n• Faster\n```";
        assert_eq!(
            format_insights(raw),
            "## Executive Summary\n\nThe model works.\n\n## Key Findings\n\n- Faster"
        );
    }

    #[test]
    fn test_bolds_percentages_once() {
        assert_eq!(
            format_insights("Accuracy rose by 12.5% and recall by 7%."),
            "Accuracy rose by **12.5%** and recall by **7%**."
        );
    }

    #[test]
    fn test_bolds_acronyms_not_already_bold() {
        assert_eq!(
            format_insights("A **CNN** beats the GRU baseline."),
            "A **CNN** beats the **GRU** baseline."
        );
    }

    #[test]
    fn test_numbered_lists() {
        assert_eq!(
            format_insights("  1.First step\n2.   Second step"),
            "1. First step\n2. Second step"
        );
        // a leading decimal is not a list item
        assert_eq!(format_insights("3.5% better"), "**3.5%** better");
    }

    #[test]
    fn test_existing_headers_padded() {
        assert_eq!(
            format_insights("Intro\n## Results\nGood\n\n\n\nEnd"),
            "Intro\n\n## Results\n\nGood\n\nEnd"
        );
    }

    #[test]
    fn test_unknown_title_untouched() {
        assert_eq!(format_insights("Related Work"), "Related Work");
    }
}

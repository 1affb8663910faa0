//! Citation formatting for arXiv papers.
//!
//! Supports APA and BibTeX.

use crate::models::PaperRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Citation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    /// APA
    Apa,
    /// BibTeX
    Bibtex,
}

/// Format a paper citation in the specified style
pub fn format_citation(paper: &PaperRecord, style: CitationStyle) -> String {
    match style {
        CitationStyle::Apa => format_apa(paper),
        CitationStyle::Bibtex => format_bibtex(paper),
    }
}

/// Format authors as "Last, F. M., Last, F."
fn format_authors_apa(authors: &[&str]) -> String {
    if authors.is_empty() {
        return "Anonymous".to_string();
    }

    authors
        .iter()
        .map(|a| format_author_apa_single(a))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_author_apa_single(author: &str) -> String {
    let words: Vec<&str> = author.split_whitespace().collect();
    match words.split_last() {
        Some((last, rest)) if !rest.is_empty() => {
            let initials: Vec<String> = rest
                .iter()
                .filter_map(|n| n.chars().next())
                .map(|c| format!("{}.", c))
                .collect();
            format!("{}, {}", last, initials.join(" "))
        }
        _ => author.trim().to_string(),
    }
}

fn year_or_nd(paper: &PaperRecord) -> String {
    paper.year().unwrap_or("n.d.").to_string()
}

/// Format: Last, F. M., Last, F. (Year). Title. arXiv preprint arXiv:ID.
fn format_apa(paper: &PaperRecord) -> String {
    let authors = format_authors_apa(&paper.author_list());
    let year = year_or_nd(paper);

    format!(
        "{} ({}). {}. arXiv preprint arXiv:{}.",
        authors, year, paper.title, paper.id
    )
}

/// Generate a BibTeX entry keyed by the id's sequence number and the year
fn format_bibtex(paper: &PaperRecord) -> String {
    let year = year_or_nd(paper);
    let sequence = paper.id.split_once('.').map_or(paper.id.as_str(), |(_, s)| s);
    let key = format!("{}{}", sequence, year);

    let authors = paper
        .metadata
        .as_ref()
        .map(|m| m.authors.trim())
        .filter(|a| !a.is_empty())
        .unwrap_or("Anonymous");

    format!(
        "@article{{{},\n  title={{{}}},\n  author={{{}}},\n  journal={{arXiv preprint arXiv:{}}},\n  year={{{}}}\n}}",
        key, paper.title, authors, paper.id, year
    )
}

/// Structured citation data for JSON output
#[derive(Debug, Serialize)]
pub struct StructuredCitation {
    pub style: CitationStyle,
    pub formatted: String,
    pub paper_id: String,
    pub title: String,
    pub year: String,
}

impl StructuredCitation {
    pub fn new(paper: &PaperRecord, style: CitationStyle) -> Self {
        Self {
            style,
            formatted: format_citation(paper, style),
            paper_id: paper.id.clone(),
            title: paper.title.clone(),
            year: year_or_nd(paper),
        }
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationStyle::Apa => write!(f, "APA"),
            CitationStyle::Bibtex => write!(f, "BibTeX"),
        }
    }
}

impl FromStr for CitationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apa" => Ok(CitationStyle::Apa),
            "bibtex" | "bib" => Ok(CitationStyle::Bibtex),
            other => Err(format!("Unknown citation style: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperRecordBuilder;

    fn paper() -> PaperRecord {
        PaperRecordBuilder::new("2502.05707", "Sparse Attention at Scale")
            .authors("Ada Mary Lovelace, Alan Turing")
            .year("2025")
            .build()
    }

    #[test]
    fn test_apa() {
        assert_eq!(
            format_citation(&paper(), CitationStyle::Apa),
            "Lovelace, A. M., Turing, A. (2025). Sparse Attention at Scale. arXiv preprint arXiv:2502.05707."
        );
    }

    #[test]
    fn test_bibtex() {
        let bib = format_citation(&paper(), CitationStyle::Bibtex);
        assert!(bib.starts_with("@article{057072025,\n"));
        assert!(bib.contains("  author={Ada Mary Lovelace, Alan Turing},\n"));
        assert!(bib.contains("  journal={arXiv preprint arXiv:2502.05707},\n"));
        assert!(bib.ends_with("  year={2025}\n}"));
    }

    #[test]
    fn test_missing_metadata() {
        let bare = PaperRecord::new("2401.00001", "Untitled");
        assert_eq!(
            format_citation(&bare, CitationStyle::Apa),
            "Anonymous (n.d.). Untitled. arXiv preprint arXiv:2401.00001."
        );
        assert!(format_citation(&bare, CitationStyle::Bibtex).contains("author={Anonymous}"));
    }

    #[test]
    fn test_single_word_author() {
        assert_eq!(format_author_apa_single("Plato"), "Plato");
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("APA".parse::<CitationStyle>().unwrap(), CitationStyle::Apa);
        assert_eq!("bibtex".parse::<CitationStyle>().unwrap(), CitationStyle::Bibtex);
        assert!("mla".parse::<CitationStyle>().is_err());
    }
}

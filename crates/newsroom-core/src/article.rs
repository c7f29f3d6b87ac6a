//! The writer's output contract: a headline plus a fixed number of paragraphs.
//!
//! Raw model output is turned into an [`Article`] through [`Article::parse`],
//! which either yields the full structure or names the structural defect.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    headline: String,
    paragraphs: Vec<String>,
}

/// Why a generated response could not be read as an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureDefect {
    EmptyResponse,
    MissingHeadline,
    ParagraphCount { expected: usize, found: usize },
}

impl fmt::Display for StructureDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "the response was empty"),
            Self::MissingHeadline => write!(f, "the response has no headline line"),
            Self::ParagraphCount { expected, found } => {
                write!(f, "expected exactly {} paragraphs after the headline, found {}", expected, found)
            }
        }
    }
}

impl Article {
    pub fn headline(&self) -> &str { &self.headline }
    pub fn paragraphs(&self) -> &[String] { &self.paragraphs }

    /// Parses `raw` into a headline and exactly `expected_paragraphs` paragraphs.
    ///
    /// The first non-empty line is the headline. The remaining text is split on
    /// blank lines; if that does not give the expected count but the body has
    /// exactly that many non-empty lines, each line is taken as a paragraph.
    pub fn parse(raw: &str, expected_paragraphs: usize) -> Result<Self, StructureDefect> {
        let normalized = raw.replace("\r\n", "\n");
        let text = normalized.trim();
        if text.is_empty() {
            return Err(StructureDefect::EmptyResponse);
        }

        let mut lines = text.lines();
        let first = lines.by_ref().find(|l| !l.trim().is_empty()).unwrap_or_default();
        let headline = clean_headline(first);
        if headline.is_empty() {
            return Err(StructureDefect::MissingHeadline);
        }

        let body: Vec<&str> = lines.collect();
        let mut paragraphs = blank_line_blocks(&body);
        if paragraphs.len() != expected_paragraphs {
            let single_lines: Vec<String> = body
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            if single_lines.len() == expected_paragraphs {
                paragraphs = single_lines;
            }
        }
        if paragraphs.len() != expected_paragraphs {
            return Err(StructureDefect::ParagraphCount { expected: expected_paragraphs, found: paragraphs.len() });
        }

        Ok(Self { headline, paragraphs })
    }

    /// Plain-text rendering: headline, blank line, paragraphs separated by blank lines.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.headline.len() + self.paragraphs.iter().map(|p| p.len() + 2).sum::<usize>());
        out.push_str(&self.headline);
        for p in &self.paragraphs {
            out.push_str("\n\n");
            out.push_str(p);
        }
        out
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn clean_headline(line: &str) -> String {
    let mut h = line.trim().trim_start_matches('#').trim().trim_matches('*').trim();
    if h.get(..9).is_some_and(|p| p.eq_ignore_ascii_case("headline:")) {
        h = h[9..].trim();
    }
    h = h.trim_matches('*').trim();
    h = h.trim_matches(|c| c == '"' || c == '\u{201c}' || c == '\u{201d}').trim();
    h.to_string()
}

fn blank_line_blocks(lines: &[&str]) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        let t = line.trim();
        if t.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(t);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join(" "));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headline_and_blank_separated_paragraphs() {
        let raw = "# **Cats Rule the Internet**\n\nFirst para.\n\nSecond para\ncontinues.\n\nThird para.";
        let a = Article::parse(raw, 3).expect("parse");
        assert_eq!(a.headline(), "Cats Rule the Internet");
        assert_eq!(a.paragraphs()[1], "Second para continues.");
    }

    #[test]
    fn falls_back_to_line_paragraphs() {
        let raw = "Headline: \"Rockets Rise\"\nOne.\nTwo.\nThree.";
        let a = Article::parse(raw, 3).expect("parse");
        assert_eq!(a.headline(), "Rockets Rise");
        assert_eq!(a.paragraphs().len(), 3);
    }

    #[test]
    fn strips_bold_around_headline_label() {
        let a = Article::parse("**Headline:** Cats Rule

One.

Two.

Three.", 3).expect("parse");
        assert_eq!(a.headline(), "Cats Rule");
        let b = Article::parse("## **Headline: Rockets Rise**

One.

Two.

Three.", 3).expect("parse");
        assert_eq!(b.headline(), "Rockets Rise");
    }

    #[test]
    fn reports_paragraph_count_defect() {
        let err = Article::parse("Title\n\nOnly one.", 3).unwrap_err();
        assert_eq!(err, StructureDefect::ParagraphCount { expected: 3, found: 1 });
        assert_eq!(Article::parse("  \n ", 3).unwrap_err(), StructureDefect::EmptyResponse);
        assert_eq!(Article::parse("###\n\na\n\nb\n\nc", 3).unwrap_err(), StructureDefect::MissingHeadline);
    }

    #[test]
    fn text_rendering_round_trips() {
        let a = Article::parse("T\n\na\n\nb\n\nc", 3).expect("parse");
        assert_eq!(Article::parse(&a.to_text(), 3).expect("reparse"), a);
    }
}

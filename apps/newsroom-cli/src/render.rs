use newsroom_agents::Mode;
use newsroom_core::{Article, RetrievalResult};

pub const BYLINE_PREFIX: &str = "By AI News Desk | Generated with";

/// Newspaper layout for the terminal: headline, byline, paragraphs.
pub fn article(article: &Article, mode: Mode) -> String {
    let mut out = String::new();
    out.push_str(article.headline());
    out.push('\n');
    out.push_str(&format!("{} {}\n", BYLINE_PREFIX, mode.label()));
    for p in article.paragraphs() {
        out.push('\n');
        out.push_str(p);
        out.push('\n');
    }
    out
}

/// Default file name for a saved article, e.g. `article_Electric_cars.txt`.
pub fn output_file_name(topic: &str) -> String {
    let slug: String = topic
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("article_{}.txt", slug)
}

/// Ranked passages, one block per hit.
pub fn passages(result: &RetrievalResult, preview_chars: usize) -> String {
    let mut out = String::new();
    for (rank, hit) in result.iter().enumerate() {
        let text: String = hit.chunk.text().split_whitespace().collect::<Vec<_>>().join(" ");
        let preview: String = text.chars().take(preview_chars).collect();
        let ellipsis = if text.chars().count() > preview_chars { "..." } else { "" };
        out.push_str(&format!(
            "{:>2}. [{:.3}] {}\n    {}{}\n",
            rank + 1,
            hit.similarity(),
            hit.chunk.id(),
            preview,
            ellipsis
        ));
    }
    out
}

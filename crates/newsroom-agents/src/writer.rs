use tracing::{info, warn};

use newsroom_core::config::{WriterSettings, MAX_REPAIR_ATTEMPTS};
use newsroom_core::traits::GenerativeProvider;
use newsroom_core::{Article, ContextBundle, Error, Result, StructureDefect};

/// Turns a context bundle into an [`Article`] through a generative provider.
///
/// Responses that do not parse as a headline plus `paragraphs` paragraphs get
/// one re-prompt naming the defect when `repair_attempts` is 1. Provider errors are
/// returned as-is, without retrying.
pub struct WriterAgent<G> {
    generator: G,
    paragraphs: usize,
    repair_attempts: usize,
}

impl<G: GenerativeProvider> WriterAgent<G> {
    pub fn new(generator: G, paragraphs: usize, repair_attempts: usize) -> Result<Self> {
        if paragraphs == 0 {
            return Err(Error::InvalidParameter("paragraph count must be greater than 0".to_string()));
        }
        if repair_attempts > MAX_REPAIR_ATTEMPTS {
            return Err(Error::InvalidParameter(format!(
                "repair_attempts must be at most {}, got {}",
                MAX_REPAIR_ATTEMPTS, repair_attempts
            )));
        }
        Ok(Self { generator, paragraphs, repair_attempts })
    }

    pub fn from_settings(generator: G, settings: &WriterSettings) -> Result<Self> {
        Self::new(generator, settings.paragraphs, settings.repair_attempts)
    }

    pub fn paragraphs(&self) -> usize { self.paragraphs }

    pub fn write(&self, topic: &str, bundle: &ContextBundle) -> Result<Article> {
        let prompt = self.prompt(topic, bundle);
        let mut response = self.generator.generate(&prompt)?;
        let mut attempt = 0usize;
        loop {
            match Article::parse(&response, self.paragraphs) {
                Ok(article) => {
                    info!(topic, attempt, "article written");
                    return Ok(article);
                }
                Err(defect) if attempt < self.repair_attempts => {
                    attempt += 1;
                    warn!(topic, %defect, attempt, "writer response malformed, asking for a repair");
                    response = self.generator.generate(&repair_prompt(&prompt, &defect, &response, self.paragraphs))?;
                }
                Err(defect) => {
                    return Err(Error::MalformedGeneration(format!(
                        "{} (after {} repair attempt{})",
                        defect,
                        attempt,
                        if attempt == 1 { "" } else { "s" }
                    )));
                }
            }
        }
    }

    /// The instruction prompt sent for `topic` grounded in `bundle`.
    pub fn prompt(&self, topic: &str, bundle: &ContextBundle) -> String {
        let mut p = format!(
            "You are a journalist writing a newspaper article about '{topic}'. \
             Use the retrieved information to write a catchy headline followed by exactly {count} \
             paragraphs (3-5 sentences each). Keep the tone informative and engaging.\n\n\
             Put the headline alone on the first line, then a blank line, then the paragraphs \
             separated by blank lines. Do not label the headline or number the paragraphs.\n\n",
            topic = topic,
            count = count_word(self.paragraphs),
        );
        if bundle.is_empty() {
            p.push_str(
                "No source material was found for this topic. Write in general terms and do not \
                 invent specific names, dates, figures or quotations.\n",
            );
        } else {
            p.push_str("Use only facts stated in the retrieved information below.\n\nRetrieved information:\n");
            p.push_str(&bundle.text);
            p.push('\n');
        }
        p
    }
}

fn repair_prompt(original: &str, defect: &StructureDefect, rejected: &str, paragraphs: usize) -> String {
    format!(
        "{original}\n\
         Your previous answer could not be used: {defect}.\n\
         Previous answer:\n---\n{rejected}\n---\n\
         Reply again with only the headline on the first line followed by exactly {count} \
         paragraphs separated by blank lines.",
        original = original,
        defect = defect,
        rejected = rejected.trim(),
        count = count_word(paragraphs),
    )
}

fn count_word(n: usize) -> String {
    const WORDS: [&str; 10] = ["zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine"];
    WORDS.get(n).map_or_else(|| n.to_string(), |w| (*w).to_string())
}

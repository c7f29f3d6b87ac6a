use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use newsroom_agents::WriterAgent;
use newsroom_core::config::WriterSettings;
use newsroom_core::traits::GenerativeProvider;
use newsroom_core::{ContextBundle, Error, ProviderError, ProviderErrorCode};

/// Replays canned responses in order and records every prompt it receives.
#[derive(Default)]
struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self { responses: Mutex::new(responses.into()), prompts: Mutex::default() })
    }

    fn prompts(&self) -> Vec<String> { self.prompts.lock().unwrap().clone() }
}

impl GenerativeProvider for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::invalid_response("script exhausted")))
    }
}

const GOOD: &str = "AI Reshapes the Newsroom\n\nFirst paragraph.\n\nSecond paragraph.\n\nThird paragraph.";

fn bundle() -> ContextBundle {
    ContextBundle::from_text("AI", "Artificial intelligence is used in journalism.")
}

#[test]
fn writes_article_on_first_try() {
    let gen = ScriptedGenerator::new(vec![Ok(GOOD.to_string())]);
    let writer = WriterAgent::new(gen.clone(), 3, 1).unwrap();
    let article = writer.write("AI", &bundle()).unwrap();

    assert_eq!(article.headline(), "AI Reshapes the Newsroom");
    assert_eq!(article.paragraphs().len(), 3);
    let prompts = gen.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("newspaper article about 'AI'"));
    assert!(prompts[0].contains("exactly three"));
    assert!(prompts[0].contains("Artificial intelligence is used in journalism."));
}

#[test]
fn repairs_once_after_structural_defect() {
    let gen = ScriptedGenerator::new(vec![Ok("Just a headline".to_string()), Ok(GOOD.to_string())]);
    let writer = WriterAgent::new(gen.clone(), 3, 1).unwrap();
    let article = writer.write("AI", &bundle()).unwrap();

    assert_eq!(article.paragraphs()[2], "Third paragraph.");
    let prompts = gen.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with(&prompts[0]));
    assert!(prompts[1].contains("expected exactly 3 paragraphs"));
    assert!(prompts[1].contains("Just a headline"));
}

#[test]
fn second_defect_is_malformed_generation() {
    let gen = ScriptedGenerator::new(vec![Ok("???".to_string()), Ok("still\n\nwrong".to_string())]);
    let writer = WriterAgent::new(gen.clone(), 3, 1).unwrap();
    let err = writer.write("AI", &bundle()).unwrap_err();

    assert!(matches!(err, Error::MalformedGeneration(_)));
    assert_eq!(gen.prompts().len(), 2);
}

#[test]
fn zero_repair_attempts_fail_immediately() {
    let gen = ScriptedGenerator::new(vec![Ok(String::new())]);
    let writer = WriterAgent::new(gen.clone(), 3, 0).unwrap();
    assert!(matches!(writer.write("AI", &bundle()), Err(Error::MalformedGeneration(_))));
    assert_eq!(gen.prompts().len(), 1);
}

#[test]
fn provider_errors_are_not_retried() {
    let gen = ScriptedGenerator::new(vec![
        Err(ProviderError::new(ProviderErrorCode::RateLimited, "slow down")),
        Ok(GOOD.to_string()),
    ]);
    let writer = WriterAgent::new(gen.clone(), 3, 1).unwrap();
    match writer.write("AI", &bundle()) {
        Err(Error::Provider(e)) => assert_eq!(e.code, ProviderErrorCode::RateLimited),
        other => panic!("expected provider error, got {:?}", other),
    }
    assert_eq!(gen.prompts().len(), 1);
}

#[test]
fn empty_bundle_prompt_forbids_invention() {
    let gen = ScriptedGenerator::new(vec![]);
    let writer = WriterAgent::new(gen, 2, 1).unwrap();
    let prompt = writer.prompt("Quantum cats", &ContextBundle::from_text("Quantum cats", "   "));
    assert!(prompt.contains("No source material was found"));
    assert!(prompt.contains("exactly two"));
    assert!(!prompt.contains("Retrieved information:"));
}

#[test]
fn rejects_zero_paragraphs() {
    assert!(matches!(WriterAgent::new(ScriptedGenerator::new(vec![]), 0, 1), Err(Error::InvalidParameter(_))));
}

#[test]
fn allows_at_most_one_repair() {
    let err = WriterAgent::new(ScriptedGenerator::new(vec![]), 3, 5).err().expect("five repairs rejected");
    assert!(matches!(err, Error::InvalidParameter(_)));

    let mut settings = WriterSettings::default();
    settings.repair_attempts = 2;
    assert!(WriterAgent::from_settings(ScriptedGenerator::new(vec![]), &settings).is_err());

    // Always-malformed output stops after the single repair.
    let gen = ScriptedGenerator::new(vec![Ok("bad".to_string()), Ok("bad".to_string()), Ok("bad".to_string())]);
    settings.repair_attempts = 1;
    let writer = WriterAgent::from_settings(gen.clone(), &settings).unwrap();
    assert!(matches!(writer.write("AI", &bundle()), Err(Error::MalformedGeneration(_))));
    assert_eq!(gen.prompts().len(), 2);
}

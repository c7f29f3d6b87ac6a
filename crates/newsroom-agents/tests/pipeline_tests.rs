use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use newsroom_agents::{Mode, Pipeline, PipelineState, ResearchAgent, RunRequest, Stage, WriterAgent};
use newsroom_core::sources::StaticSource;
use newsroom_core::traits::{DocumentSource, GenerativeProvider, SnapshotStore};
use newsroom_core::{ChunkingConfig, ContextBundle, Error, ProviderError, ProviderErrorCode, Result, SourceDocument};
use newsroom_embed::HashingEmbedder;
use newsroom_retrieval::Retriever;
use newsroom_vector::{MemorySnapshotStore, VectorIndex};

#[derive(Default)]
struct ScriptedGenerator {
    responses: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<std::result::Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self { responses: Mutex::new(responses.into()), prompts: Mutex::default() })
    }

    fn prompts(&self) -> Vec<String> { self.prompts.lock().unwrap().clone() }
}

impl GenerativeProvider for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::invalid_response("script exhausted")))
    }
}

/// Counts how often documents are requested.
struct CountingSource {
    inner: StaticSource,
    calls: Mutex<usize>,
}

impl DocumentSource for CountingSource {
    fn documents(&self, topic: &str) -> Result<Vec<SourceDocument>> {
        *self.calls.lock().unwrap() += 1;
        self.inner.documents(topic)
    }
}

struct FailingSource;

impl DocumentSource for FailingSource {
    fn documents(&self, _topic: &str) -> Result<Vec<SourceDocument>> {
        Err(Error::Provider(ProviderError::new(ProviderErrorCode::Transport, "network down")))
    }
}

const ARTICLE: &str = "Cats Take Over\n\nOne.\n\nTwo.\n\nThree.";

fn docs() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new("cats", "Cats are mammals that purr. Cats sleep a lot during the day."),
        SourceDocument::new("rockets", "Rockets burn fuel to reach orbit. Rocket engines are loud."),
    ]
}

fn pipeline(gen: Arc<ScriptedGenerator>) -> Pipeline<HashingEmbedder, Arc<ScriptedGenerator>> {
    let retriever = Retriever::new(HashingEmbedder::new(128), ChunkingConfig { chunk_size: 60, overlap: 10 }, 1).unwrap();
    let research = ResearchAgent::new(retriever, 4).unwrap();
    let writer = WriterAgent::new(gen, 3, 1).unwrap();
    Pipeline::new(research, writer)
}

#[test]
fn two_stage_run_visits_every_stage() {
    let gen = ScriptedGenerator::new(vec![Ok(ARTICLE.to_string())]);
    let p = pipeline(gen.clone());
    let source = StaticSource::new(docs());
    let run = p.execute(&RunRequest::new("cats", &source, Mode::TwoStage, 2));

    assert_eq!(
        run.history,
        vec![
            PipelineState::Idle,
            PipelineState::Building,
            PipelineState::Retrieving,
            PipelineState::Writing,
            PipelineState::Done
        ]
    );
    assert_eq!(run.outcome.unwrap().headline(), "Cats Take Over");
    assert!(gen.prompts()[0].contains("Cats are mammals that purr."));
}

#[test]
fn single_stage_run_produces_article() {
    let gen = ScriptedGenerator::new(vec![Ok(ARTICLE.to_string())]);
    let article = pipeline(gen).run("rockets", &docs(), Mode::SingleStage, 4).unwrap();
    assert_eq!(article.paragraphs(), &["One.", "Two.", "Three."]);
}

#[test]
fn empty_sources_fail_in_retrieving_per_mode() {
    let empty = StaticSource::new(vec![SourceDocument::new("blank", "")]);

    let two = pipeline(ScriptedGenerator::new(vec![])).execute(&RunRequest::new("cats", &empty, Mode::TwoStage, 4));
    let err = two.outcome.unwrap_err();
    assert_eq!(err.stage, Stage::Retrieving);
    assert!(matches!(err.source, Error::NoRelevantContext(_)));
    assert!(matches!(two.history.last(), Some(PipelineState::Failed { stage: Stage::Retrieving, .. })));

    let single = pipeline(ScriptedGenerator::new(vec![])).run("cats", &[], Mode::SingleStage, 4).unwrap_err();
    assert_eq!(single.stage, Stage::Retrieving);
    assert!(matches!(single.source, Error::EmptyIndex));
}

#[test]
fn blank_topic_and_zero_k_fail_in_idle() {
    let gen = ScriptedGenerator::new(vec![]);
    let p = pipeline(gen.clone());
    let source = StaticSource::new(docs());

    let run = p.execute(&RunRequest::new("   ", &source, Mode::TwoStage, 4));
    assert_eq!(run.history.len(), 2);
    assert!(matches!(run.history[1], PipelineState::Failed { stage: Stage::Idle, .. }));
    assert!(matches!(run.outcome.unwrap_err().source, Error::InvalidParameter(_)));

    let err = p.run("cats", &docs(), Mode::TwoStage, 0).unwrap_err();
    assert_eq!(err.stage, Stage::Idle);
    assert!(gen.prompts().is_empty());
}

#[test]
fn source_failure_is_tagged_building() {
    let p = pipeline(ScriptedGenerator::new(vec![]));
    let run = p.execute(&RunRequest::new("cats", &FailingSource, Mode::TwoStage, 4));
    let err = run.outcome.unwrap_err();
    assert_eq!(err.stage, Stage::Building);
    assert!(err.to_string().contains("building"));
    assert_eq!(run.history[..2], [PipelineState::Idle, PipelineState::Building]);
}

#[test]
fn malformed_generation_is_tagged_writing() {
    let gen = ScriptedGenerator::new(vec![Ok("nope".to_string()), Ok("still nope".to_string())]);
    let err = pipeline(gen).run("cats", &docs(), Mode::TwoStage, 4).unwrap_err();
    assert_eq!(err.stage, Stage::Writing);
    assert!(matches!(err.source, Error::MalformedGeneration(_)));
}

#[test]
fn supplied_context_goes_straight_to_writing() {
    let gen = ScriptedGenerator::new(vec![Ok(ARTICLE.to_string())]);
    let p = pipeline(gen.clone());
    let run = p.execute_with_context("cats", ContextBundle::from_text("cats", "Uploaded notes about cats."));

    assert_eq!(run.history, vec![PipelineState::Idle, PipelineState::Writing, PipelineState::Done]);
    assert!(run.outcome.is_ok());
    assert!(gen.prompts()[0].contains("Uploaded notes about cats."));

    let err = p.run_with_context("", ContextBundle::from_text("", "x")).unwrap_err();
    assert_eq!(err.stage, Stage::Idle);
}

#[test]
fn snapshot_is_saved_then_reused() {
    let store = Arc::new(MemorySnapshotStore::new());
    let gen = ScriptedGenerator::new(vec![Ok(ARTICLE.to_string()), Ok(ARTICLE.to_string())]);
    let p = pipeline(gen).with_snapshot_store(store.clone());
    let source = CountingSource { inner: StaticSource::new(docs()), calls: Mutex::new(0) };

    let first = p.execute(&RunRequest::new("cats", &source, Mode::TwoStage, 2).with_snapshot("pets"));
    assert!(first.outcome.is_ok());
    assert_eq!(store.names(), vec!["pets".to_string()]);

    let second = p.execute(&RunRequest::new("cats", &source, Mode::TwoStage, 2).with_snapshot("pets"));
    assert!(second.outcome.is_ok());
    assert_eq!(*source.calls.lock().unwrap(), 1, "second run restores instead of fetching");

    let restored = VectorIndex::restore(&store.load("pets").unwrap().unwrap(), 128).unwrap();
    assert!(!restored.is_empty());
}

#[test]
fn snapshot_with_wrong_dimension_fails_building() {
    let store = Arc::new(MemorySnapshotStore::new());
    let mut other = VectorIndex::new();
    other.insert(newsroom_core::Chunk::new("x", 0, "x"), vec![1.0; 7]).unwrap();
    store.save("pets", &other.snapshot().unwrap()).unwrap();

    let p = pipeline(ScriptedGenerator::new(vec![])).with_snapshot_store(store);
    let source = StaticSource::new(docs());
    let err = p.execute(&RunRequest::new("cats", &source, Mode::TwoStage, 2).with_snapshot("pets")).outcome.unwrap_err();
    assert_eq!(err.stage, Stage::Building);
    assert!(matches!(err.source, Error::DimensionMismatch { expected: 128, actual: 7 }));
}

#[test]
fn mode_parses_from_cli_names() {
    assert_eq!("two-stage".parse::<Mode>().unwrap(), Mode::TwoStage);
    assert_eq!("single-stage".parse::<Mode>().unwrap(), Mode::SingleStage);
    assert!("three-stage".parse::<Mode>().is_err());
    assert_eq!(Mode::TwoStage.label(), "AGENTS");
}

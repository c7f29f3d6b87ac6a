//! Run orchestration: `Idle -> Building -> Retrieving -> Writing -> Done`,
//! or `Idle -> Writing -> Done` when the caller already holds the context.
//! Any failure ends the run in `Failed`; stages are never retried.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use newsroom_core::config::Settings;
use newsroom_core::sources::StaticSource;
use newsroom_core::traits::{DocumentSource, EmbeddingProvider, GenerativeProvider, SnapshotStore};
use newsroom_core::{Article, ContextBundle, Error, Result, SourceDocument};
use newsroom_retrieval::Retriever;
use newsroom_vector::VectorIndex;

use crate::research::ResearchAgent;
use crate::writer::WriterAgent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Building,
    Retrieving,
    Writing,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Retrieving => "retrieving",
            Self::Writing => "writing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Building,
    Retrieving,
    Writing,
    Done,
    Failed { stage: Stage, reason: String },
}

/// How context is gathered before writing.
///
/// `TwoStage` hands off through the research agent and reports an empty index
/// as `NoRelevantContext`; `SingleStage` queries the retriever directly and
/// reports `EmptyIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    SingleStage,
    #[default]
    TwoStage,
}

impl Mode {
    /// Short label used in article bylines.
    pub fn label(self) -> &'static str {
        match self {
            Self::SingleStage => "RAG",
            Self::TwoStage => "AGENTS",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SingleStage => "single-stage",
            Self::TwoStage => "two-stage",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single-stage" | "single" | "rag" => Ok(Self::SingleStage),
            "two-stage" | "two" | "agents" => Ok(Self::TwoStage),
            other => Err(format!("unknown mode '{}' (expected single-stage or two-stage)", other)),
        }
    }
}

/// A run failure tagged with the stage it happened in.
#[derive(Debug, Error)]
#[error("pipeline failed while {stage}: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub source: Error,
}

fn at(stage: Stage) -> impl FnOnce(Error) -> PipelineError {
    move |source| PipelineError { stage, source }
}

pub struct RunRequest<'a> {
    pub topic: String,
    pub source: &'a dyn DocumentSource,
    pub mode: Mode,
    pub k: usize,
    /// Snapshot to restore instead of building, or to save after building.
    pub snapshot: Option<String>,
}

impl<'a> RunRequest<'a> {
    pub fn new(topic: impl Into<String>, source: &'a dyn DocumentSource, mode: Mode, k: usize) -> Self {
        Self { topic: topic.into(), source, mode, k, snapshot: None }
    }

    pub fn with_snapshot(mut self, name: impl Into<String>) -> Self {
        self.snapshot = Some(name.into());
        self
    }
}

/// Visited states plus the final outcome of one run.
#[derive(Debug)]
pub struct PipelineRun {
    pub history: Vec<PipelineState>,
    pub outcome: std::result::Result<Article, PipelineError>,
}

pub struct Pipeline<E, G> {
    research: ResearchAgent<E>,
    writer: WriterAgent<G>,
    store: Option<Box<dyn SnapshotStore>>,
}

impl<E: EmbeddingProvider, G: GenerativeProvider> Pipeline<E, G> {
    pub fn new(research: ResearchAgent<E>, writer: WriterAgent<G>) -> Self {
        Self { research, writer, store: None }
    }

    pub fn from_settings(embedder: E, generator: G, settings: &Settings) -> Result<Self> {
        let retriever = Retriever::from_settings(embedder, settings)?;
        let research = ResearchAgent::new(retriever, settings.retrieval.top_k)?;
        let writer = WriterAgent::from_settings(generator, &settings.writer)?;
        Ok(Self::new(research, writer))
    }

    pub fn with_snapshot_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn research(&self) -> &ResearchAgent<E> { &self.research }
    pub fn writer(&self) -> &WriterAgent<G> { &self.writer }

    pub fn run(
        &self,
        topic: &str,
        sources: &[SourceDocument],
        mode: Mode,
        k: usize,
    ) -> std::result::Result<Article, PipelineError> {
        let source = StaticSource::new(sources.to_vec());
        self.execute(&RunRequest::new(topic, &source, mode, k)).outcome
    }

    pub fn execute(&self, req: &RunRequest<'_>) -> PipelineRun {
        let mut history = vec![PipelineState::Idle];
        let outcome = self.drive(req, &mut history);
        finish(history, outcome)
    }

    /// Writes directly from a caller-supplied bundle (`Idle -> Writing`).
    pub fn run_with_context(&self, topic: &str, bundle: ContextBundle) -> std::result::Result<Article, PipelineError> {
        self.execute_with_context(topic, bundle).outcome
    }

    pub fn execute_with_context(&self, topic: &str, bundle: ContextBundle) -> PipelineRun {
        let mut history = vec![PipelineState::Idle];
        let outcome = validate_topic(topic).map_err(at(Stage::Idle)).and_then(|topic| {
            enter(&mut history, PipelineState::Writing, topic);
            self.writer.write(topic, &bundle).map_err(at(Stage::Writing))
        });
        finish(history, outcome)
    }

    fn drive(&self, req: &RunRequest<'_>, history: &mut Vec<PipelineState>) -> std::result::Result<Article, PipelineError> {
        let topic = validate_topic(&req.topic).map_err(at(Stage::Idle))?;
        if req.k == 0 {
            return Err(at(Stage::Idle)(Error::InvalidParameter("k must be greater than 0".to_string())));
        }

        enter(history, PipelineState::Building, topic);
        let index = self.build_index(req, topic).map_err(at(Stage::Building))?;

        enter(history, PipelineState::Retrieving, topic);
        let bundle = match req.mode {
            Mode::TwoStage => self.research.retrieve(&index, topic, req.k),
            Mode::SingleStage => self
                .research
                .retriever()
                .query(&index, topic, req.k)
                .map(|result| ContextBundle::from_retrieval(topic, &result)),
        }
        .map_err(at(Stage::Retrieving))?;

        enter(history, PipelineState::Writing, topic);
        self.writer.write(topic, &bundle).map_err(at(Stage::Writing))
    }

    fn build_index(&self, req: &RunRequest<'_>, topic: &str) -> Result<VectorIndex> {
        let (name, store) = match (req.snapshot.as_deref(), self.store.as_deref()) {
            (Some(name), Some(store)) => (name, store),
            (Some(name), None) => {
                warn!(snapshot = name, "snapshot requested but no snapshot store configured");
                return self.build_fresh(req, topic);
            }
            _ => return self.build_fresh(req, topic),
        };

        if let Some(bytes) = store.load(name)? {
            let index = VectorIndex::restore(&bytes, self.research.retriever().embedder().dim())?;
            info!(snapshot = name, entries = index.len(), "index restored from snapshot");
            return Ok(index);
        }

        let index = self.build_fresh(req, topic)?;
        match index.snapshot().and_then(|bytes| store.save(name, &bytes)) {
            Ok(()) => info!(snapshot = name, entries = index.len(), "index snapshot saved"),
            Err(e) => warn!(snapshot = name, error = %e, "failed to save index snapshot"),
        }
        Ok(index)
    }

    fn build_fresh(&self, req: &RunRequest<'_>, topic: &str) -> Result<VectorIndex> {
        let docs = req.source.documents(topic)?;
        match req.mode {
            Mode::TwoStage => self.research.build(&docs),
            Mode::SingleStage => self.research.retriever().build(&docs),
        }
    }
}

fn validate_topic(topic: &str) -> Result<&str> {
    let trimmed = topic.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidParameter("topic must not be empty".to_string()));
    }
    Ok(trimmed)
}

fn enter(history: &mut Vec<PipelineState>, state: PipelineState, topic: &str) {
    info!(topic, state = ?state, "pipeline stage");
    history.push(state);
}

fn finish(mut history: Vec<PipelineState>, outcome: std::result::Result<Article, PipelineError>) -> PipelineRun {
    match &outcome {
        Ok(_) => history.push(PipelineState::Done),
        Err(e) => {
            warn!(stage = %e.stage, error = %e.source, "pipeline failed");
            history.push(PipelineState::Failed { stage: e.stage, reason: e.source.to_string() });
        }
    }
    PipelineRun { history, outcome }
}

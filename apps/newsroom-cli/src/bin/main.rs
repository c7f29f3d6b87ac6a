use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use newsroom_agents::{Mode, OpenAiChat, Pipeline, RunRequest};
use newsroom_cli::{render, WikipediaSource};
use newsroom_core::config::{Config, Settings};
use newsroom_core::sources::FileSystemSource;
use newsroom_core::traits::{DocumentSource, EmbeddingProvider, SnapshotStore};
use newsroom_retrieval::Retriever;
use newsroom_vector::{FileSnapshotStore, VectorIndex};

#[derive(Parser)]
#[command(name = "newsroom", version, about = "Write short news articles grounded in retrieved sources")]
struct Cli {
    /// Directory holding config.toml / config.<env>.toml
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Research a topic and write an article about it
    Write(WriteArgs),
    /// Build an index from local files and save it as a snapshot
    Index(IndexArgs),
    /// Print the passages a snapshot returns for a topic
    Query(QueryArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    Wikipedia,
    Files,
}

#[derive(Args)]
struct WriteArgs {
    #[arg(long)]
    topic: String,
    #[arg(long, value_enum, default_value_t = SourceKind::Wikipedia)]
    source: SourceKind,
    /// Files or directories of .txt/.md/.pdf documents (with --source files)
    #[arg(long = "path")]
    paths: Vec<PathBuf>,
    #[arg(long, default_value = "two-stage")]
    mode: Mode,
    /// Passages to retrieve (default: retrieval.top_k)
    #[arg(long)]
    k: Option<usize>,
    /// Wikipedia pages to fetch (default: sources.max_pages)
    #[arg(long)]
    max_pages: Option<usize>,
    /// Reuse this index snapshot if present, otherwise save it after building
    #[arg(long)]
    snapshot: Option<String>,
    /// Also save the article as plain text (a directory gets article_<topic>.txt)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct IndexArgs {
    #[arg(long = "path", required = true)]
    paths: Vec<PathBuf>,
    #[arg(long)]
    snapshot: String,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long)]
    snapshot: String,
    #[arg(long)]
    topic: String,
    #[arg(long)]
    k: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config_dir)?;
    match cli.command {
        Command::Write(args) => write(&mut settings, args),
        Command::Index(args) => index(&settings, args),
        Command::Query(args) => query(&settings, args),
    }
}

fn load_settings(dir: &Path) -> Result<Settings> {
    let config = Config::load_from(dir).context("failed to load configuration")?;
    config.settings().context("invalid configuration")
}

fn write(settings: &mut Settings, args: WriteArgs) -> Result<()> {
    if let Some(pages) = args.max_pages {
        settings.sources.max_pages = pages;
    }
    let k = args.k.unwrap_or(settings.retrieval.top_k);

    let source: Box<dyn DocumentSource> = match args.source {
        SourceKind::Wikipedia => Box::new(WikipediaSource::from_settings(&settings.sources)?),
        SourceKind::Files => {
            if args.paths.is_empty() {
                bail!("--source files needs at least one --path");
            }
            Box::new(FileSystemSource::new(args.paths.iter()))
        }
    };

    let embedder = newsroom_embed::from_settings(&settings.embedding).context("embedding provider")?;
    let generator = OpenAiChat::from_settings(&settings.writer).context("generation provider")?;
    let mut pipeline = Pipeline::from_settings(embedder, generator, settings)?;
    if args.snapshot.is_some() {
        pipeline = pipeline.with_snapshot_store(FileSnapshotStore::new(settings.snapshots.dir_path()));
    }

    let mut request = RunRequest::new(args.topic.as_str(), source.as_ref(), args.mode, k);
    if let Some(name) = &args.snapshot {
        request = request.with_snapshot(name.as_str());
    }

    let spinner = spinner(format!("Writing about '{}' ({})", args.topic, args.mode));
    let run = pipeline.execute(&request);
    spinner.finish_and_clear();
    info!(states = ?run.history, "run finished");
    let article = run.outcome?;

    println!("{}", render::article(&article, args.mode));

    if let Some(output) = &args.output {
        let path = if output.is_dir() { output.join(render::output_file_name(&args.topic)) } else { output.clone() };
        fs::write(&path, article.to_text()).with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Saved article to {}", path.display());
    }
    Ok(())
}

fn index(settings: &Settings, args: IndexArgs) -> Result<()> {
    let embedder = newsroom_embed::from_settings(&settings.embedding).context("embedding provider")?;
    let retriever = Retriever::from_settings(embedder, settings)?;
    let docs = FileSystemSource::new(args.paths.iter()).load()?;

    let spinner = spinner(format!("Indexing {} documents", docs.len()));
    let built = retriever.build(&docs);
    spinner.finish_and_clear();
    let index = built?;

    let store = FileSnapshotStore::new(settings.snapshots.dir_path());
    store.save(&args.snapshot, &index.snapshot()?)?;
    println!(
        "Indexed {} documents into {} chunks; snapshot '{}' saved to {}",
        docs.len(),
        index.len(),
        args.snapshot,
        store.path_for(&args.snapshot)?.display()
    );
    Ok(())
}

fn query(settings: &Settings, args: QueryArgs) -> Result<()> {
    let embedder = newsroom_embed::from_settings(&settings.embedding).context("embedding provider")?;
    let store = FileSnapshotStore::new(settings.snapshots.dir_path());
    let Some(bytes) = store.load(&args.snapshot)? else {
        bail!("no snapshot named '{}' in {}", args.snapshot, store.dir().display());
    };
    let index = VectorIndex::restore(&bytes, embedder.dim())
        .with_context(|| format!("snapshot '{}' does not match provider {}", args.snapshot, embedder.id()))?;

    let retriever = Retriever::from_settings(embedder, settings)?;
    let k = args.k.unwrap_or(settings.retrieval.top_k);
    let result = retriever.query(&index, &args.topic, k)?;
    print!("{}", render::passages(&result, 240));
    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

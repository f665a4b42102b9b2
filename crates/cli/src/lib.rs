use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use codeqa_provider::Capabilities;
use codeqa_search::{EngineConfig, RetrievalEngine, SessionContext};
use std::io;
use std::path::{Path, PathBuf};

mod flags;
mod report;

use flags::{EmbedMode, RoleFlag};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "codeqa")]
#[command(about = "Question answering over a codebase: index, retrieve, rank", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for results)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the embedding backend for this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Config file (defaults to <project>/.codeqa.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index of a project directory
    Index(IndexArgs),

    /// Retrieve ranked context for a question
    Query(QueryArgs),

    /// Classify a question without touching the index
    Classify(ClassifyArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Project directory to index (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Output the index report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct QueryArgs {
    /// Question about the code
    text: String,

    /// Project directory (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Upper bound on returned chunks (the query's own complexity cap still applies)
    #[arg(short = 'n', long)]
    max_results: Option<usize>,

    /// Asker's role, shifts intent classification
    #[arg(long, value_enum)]
    role: Option<RoleFlag>,

    /// Output JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Question to classify
    text: String,

    /// Asker's role, shifts intent classification
    #[arg(long, value_enum)]
    role: Option<RoleFlag>,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match &cli.command {
        Commands::Index(args) => run_index(&cli, args).await,
        Commands::Query(args) => run_query(&cli, args).await,
        Commands::Classify(args) => run_classify(args),
    }
}

/// Config for `root` with the global CLI overrides on top
fn load_config(cli: &Cli, root: &Path) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(root, cli.config.as_deref())
        .with_context(|| format!("Failed to load config for {}", root.display()))?;
    if let Some(mode) = cli.embed_mode {
        config.provider.embedding_mode = mode.as_domain();
    }
    Ok(config)
}

async fn open_engine(cli: &Cli, path: &Path) -> Result<RetrievalEngine> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Invalid project path {}", path.display()))?;
    let config = load_config(cli, &root)?;
    let capabilities =
        Capabilities::from_config(&config.provider).context("Invalid provider configuration")?;
    RetrievalEngine::open(&root, config, capabilities)
        .await
        .with_context(|| format!("Failed to open index for {}", root.display()))
}

async fn run_index(cli: &Cli, args: &IndexArgs) -> Result<()> {
    let engine = open_engine(cli, &args.path).await?;
    let report = engine
        .index_codebase()
        .await
        .with_context(|| format!("Indexing {} failed", engine.root().display()))?;

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&report)?)?;
    } else {
        print_stdout(report::render_index_report(engine.root(), &report).trim_end())?;
    }
    Ok(())
}

async fn run_query(cli: &Cli, args: &QueryArgs) -> Result<()> {
    let engine = open_engine(cli, &args.path).await?;
    let session = session_for(args.role);
    let response = engine
        .query_with_session(&args.text, args.max_results, &session)
        .await
        .context("Query failed")?;

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&response)?)?;
    } else {
        print_stdout(report::render_query_response(&response).trim_end())?;
    }
    Ok(())
}

fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let intent = codeqa_search::IntentClassifier::classify(&args.text, &session_for(args.role));
    print_stdout(report::render_intent(&intent).trim_end())
}

fn session_for(role: Option<RoleFlag>) -> SessionContext {
    role.map_or_else(SessionContext::default, |role| {
        SessionContext::default().with_role(role.as_domain())
    })
}

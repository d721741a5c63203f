use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mediaidx::index::prune::prune_cache;
use mediaidx::index::range::{correct_range, RangePatch};
use mediaidx::index::stats::{format_size, show_cache};
use mediaidx::index::{
    parse_reuse_flag, ColorRange, ExtensionRegistry, IndexKind, Indexer, IndexingPolicy,
    ToolLocator,
};
use mediaidx::output::{describe_patch, print_outcome, print_records, print_rejected};
use mediaidx::utils::{get_config_path, progress, AppConfig, LogSink};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mediaidx")]
#[command(about = "Create and cache frame index files for video sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of the one in the app data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show informational log records
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or reuse index files for the given sources
    Index(IndexArgs),
    /// Resolve and print the path of an indexer executable
    Which {
        /// Index kind (d2v or ffindex)
        kind: IndexKind,

        /// Directory holding the tool
        #[arg(long)]
        tool_dir: Option<PathBuf>,

        /// Directory tried when the tool is not on PATH
        #[arg(long)]
        fallback_tool_dir: Option<PathBuf>,
    },
    /// Set the color range flag of a d2v file
    Range {
        /// d2v file to patch
        artifact: PathBuf,

        /// limited or full
        range: ColorRange,
    },
    /// List cached manifests and their artifacts
    List {
        /// Cache directory (defaults to indexing_dir from the config)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Remove orphaned artifacts and superseded manifests from the cache
    Prune {
        /// Cache directory (defaults to indexing_dir from the config)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Only report what would be removed
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct IndexArgs {
    /// Source files to index
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Index kind; inferred from each source's extension when omitted
    #[arg(short, long)]
    kind: Option<IndexKind>,

    /// Shared cache directory for artifacts
    #[arg(long, conflicts_with = "co_located")]
    cache_dir: Option<PathBuf>,

    /// Place artifacts next to their sources
    #[arg(long)]
    co_located: bool,

    /// Reuse existing artifacts (true or false)
    #[arg(long, value_name = "BOOL", value_parser = parse_reuse_flag, conflicts_with = "force")]
    reuse: Option<bool>,

    /// Always run the indexer, same as --reuse false
    #[arg(short, long)]
    force: bool,

    /// Directory holding the indexer
    #[arg(long)]
    tool_dir: Option<PathBuf>,

    /// Directory tried when the indexer is not on PATH
    #[arg(long)]
    fallback_tool_dir: Option<PathBuf>,

    /// Options passed to the indexer, replacing the configured ones
    #[arg(long, allow_hyphen_values = true)]
    options: Option<String>,
}

impl IndexArgs {
    /// Apply command line overrides on top of the configured policy
    fn apply(&self, mut policy: IndexingPolicy) -> IndexingPolicy {
        if let Some(dir) = &self.cache_dir {
            policy = policy.cache_dir(dir);
        }
        if self.co_located {
            policy.cache_dir = None;
        }
        if let Some(reuse) = self.reuse {
            policy.reuse = reuse;
        }
        if self.force {
            policy.reuse = false;
        }
        if let Some(dir) = &self.tool_dir {
            policy = policy.tool_dir(dir);
        }
        if let Some(dir) = &self.fallback_tool_dir {
            policy = policy.fallback_tool_dir(dir);
        }
        if let Some(options) = &self.options {
            policy.tool_options = options.clone();
        }
        policy
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // LogSink records are printed by print_records; RUST_LOG=mediaidx=info also logs them
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,mediaidx=off"),
    )
    .init();

    let color = !cli.no_color;
    let mut log = LogSink::new();
    let config = load_config(cli.config.as_deref(), &mut log);
    print_records(&log.drain(), cli.verbose, color)?;
    let config = config?;

    match cli.command {
        Commands::Index(args) => run_index(&config, &args, cli.verbose, color),
        Commands::Which {
            kind,
            tool_dir,
            fallback_tool_dir,
        } => {
            let tool_dir = tool_dir.unwrap_or_else(|| config.tool_dir(kind).to_path_buf());
            let fallback = fallback_tool_dir.unwrap_or_else(|| config.fallback_tool_dir.clone());
            let policy = IndexingPolicy::new(kind).tool_dir(tool_dir).fallback_tool_dir(fallback);

            let result = ToolLocator::from_env().resolve(
                policy.tool_dir.as_deref(),
                kind.tool_name(),
                policy.fallback_tool_dir.as_deref(),
                &mut log,
            );
            print_records(&log.drain(), cli.verbose, color)?;
            let path = result?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Range { artifact, range } => {
            if !artifact.is_file() {
                bail!("not a file: {}", artifact.display());
            }
            let patch = correct_range(&artifact, range, &mut log);
            print_records(&log.drain(), cli.verbose, color)?;
            println!("{}: {}", artifact.display(), describe_patch(patch));
            Ok(match patch {
                RangePatch::Skipped => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            })
        }
        Commands::List { cache_dir } => {
            let cache_dir = cache_dir_or_config(cache_dir, &config)?;
            show_cache(&cache_dir)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Prune { cache_dir, dry_run } => {
            let cache_dir = cache_dir_or_config(cache_dir, &config)?;
            let report = prune_cache(&cache_dir, dry_run, &mut log);
            print_records(&log.drain(), cli.verbose, color)?;
            let report = report?;

            if report.is_empty() {
                println!("Nothing to prune in {}", cache_dir.display());
                return Ok(ExitCode::SUCCESS);
            }
            let verb = if dry_run { "Would remove" } else { "Removed" };
            for path in report.manifests.iter().chain(&report.artifacts) {
                println!("  {}", path.display());
            }
            println!(
                "{} {} artifact(s) and {} manifest(s), {}",
                verb,
                report.artifacts.len(),
                report.manifests.len(),
                format_size(report.bytes)
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { init } => {
            let path = match cli.config {
                Some(path) => path,
                None => get_config_path()?,
            };
            if init {
                AppConfig::default().save_to(&path)?;
                println!("Wrote default config to {}", path.display());
                return Ok(ExitCode::SUCCESS);
            }
            show_config(&path, &config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>, log: &mut LogSink) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path, log),
        None => AppConfig::load(log),
    }
}

fn cache_dir_or_config(cache_dir: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    let dir = cache_dir.unwrap_or_else(|| config.indexing_dir.clone());
    if dir.as_os_str().is_empty() {
        bail!("no cache directory configured (indexing_dir is empty), pass --cache-dir");
    }
    Ok(dir)
}

fn run_index(config: &AppConfig, args: &IndexArgs, verbose: bool, color: bool) -> Result<ExitCode> {
    let registry =
        ExtensionRegistry::from_config(config).context("Invalid indexers configuration")?;
    let mut log = LogSink::new();
    let mut failed = 0;

    for source in &args.sources {
        let (kind, options) = match args.kind {
            Some(kind) => (kind, config.indexers.get(kind).options.clone()),
            None => match registry.lookup(source) {
                Some(entry) => (entry.kind, entry.tool_options.clone()),
                None => {
                    print_rejected(source, "no indexer is configured for this extension", color)?;
                    failed += 1;
                    continue;
                }
            },
        };

        let policy = args.apply(config.policy_for(kind).tool_options(options));
        let indexer = Indexer::new(kind);

        let spinner = progress::spinner(format!("{} {}", kind.tool_name(), source.display()));
        let result = indexer.index(source, &policy, &mut log);
        spinner.finish_and_clear();

        print_records(&log.drain(), verbose, color)?;
        match result {
            Ok(outcome) => {
                print_outcome(source, &outcome, color)?;
                if outcome.is_failed() {
                    failed += 1;
                }
            }
            Err(e) => {
                print_rejected(source, &e.to_string(), color)?;
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} source(s) failed", failed, args.sources.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn show_config(path: &Path, config: &AppConfig) -> Result<()> {
    println!("Config file: {}", path.display());
    println!();
    println!("{}", serde_json::to_string_pretty(config).context("Failed to serialize config")?);
    println!();

    let registry =
        ExtensionRegistry::from_config(config).context("Invalid indexers configuration")?;
    println!("Extensions:");
    for kind in IndexKind::ALL {
        println!("  {:8} {}", kind.tool_name(), registry.extensions(kind).join(" "));
    }
    Ok(())
}

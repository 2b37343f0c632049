//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use docbuild_core::builder::{BuildResult, ExternalGenerator};
use docbuild_core::install::{GitRef, InstallSource};
use docbuild_core::pipeline::{ProgressReporter, RunConfig, RunSummary};
use docbuild_shared::{
    AppConfig, ProjectDescriptor, init_config, load_config, load_config_from, validate_git_url,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docbuild — build generator projects and index their documentation.
#[derive(Parser)]
#[command(
    name = "docbuild",
    version,
    about = "Build every generator project in a repository and write index.json.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Repository root (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file (defaults to <root>/docbuild.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Install the generator, build all projects, and write the index.
    Build(BuildArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for `docbuild build`.
#[derive(Args)]
#[command(group(
    ArgGroup::new("source")
        .args(["branch", "tag", "rev", "path"])
        .multiple(false)
))]
pub(crate) struct BuildArgs {
    /// Install the generator from this git branch.
    #[arg(long)]
    pub branch: Option<String>,

    /// Install the generator from this git tag.
    #[arg(long)]
    pub tag: Option<String>,

    /// Install the generator from this git revision.
    #[arg(long)]
    pub rev: Option<String>,

    /// Install the generator from a local checkout.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Skip installing the generator.
    #[arg(long)]
    pub no_install: bool,

    /// Generator backend (defaults to the configured one, normally `json`).
    #[arg(long)]
    pub backend: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a docbuild.toml with defaults into the repository root.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docbuild=info",
        1 => "docbuild=debug",
        _ => "docbuild=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = resolve_root(cli.root.as_deref())?;
    match cli.command {
        Command::Build(args) => cmd_build(&root, cli.config.as_deref(), &args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(&root, cli.config.as_deref()),
        },
    }
}

fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    let root = match root {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().wrap_err("cannot determine working directory")?,
    };
    std::fs::canonicalize(&root)
        .wrap_err_with(|| format!("repository root '{}' is not accessible", root.display()))
}

fn resolve_config(root: &Path, config: Option<&Path>) -> Result<AppConfig> {
    let config = match config {
        Some(path) => load_config_from(path)?,
        None => load_config(root)?,
    };
    Ok(config)
}

/// Pick the install source from the mutually exclusive build flags.
fn install_source(args: &BuildArgs, config: &AppConfig) -> Result<Option<InstallSource>> {
    if args.no_install {
        return Ok(None);
    }
    if let Some(path) = &args.path {
        return Ok(Some(InstallSource::Path(path.clone())));
    }

    let reference = match (&args.branch, &args.tag, &args.rev) {
        (Some(b), _, _) => Some(GitRef::Branch(b.clone())),
        (_, Some(t), _) => Some(GitRef::Tag(t.clone())),
        (_, _, Some(r)) => Some(GitRef::Rev(r.clone())),
        _ => None,
    };

    Ok(Some(InstallSource::Git {
        url: validate_git_url(config)?,
        reference,
    }))
}

async fn cmd_build(root: &Path, config_path: Option<&Path>, args: &BuildArgs) -> Result<()> {
    let config = resolve_config(root, config_path)?;

    let mut run_config = RunConfig::resolve(root, &config, args.backend.as_deref());
    run_config.install = install_source(args, &config)?;

    if run_config.backend.trim().is_empty() {
        return Err(eyre!("backend must not be empty"));
    }

    info!(
        root = %root.display(),
        backend = %run_config.backend,
        install = run_config.install.is_some(),
        "building projects"
    );

    let generator = ExternalGenerator::new(config.generator.program.clone());
    let reporter = CliProgress::new();
    let summary = docbuild_core::pipeline::run(&run_config, &generator, &reporter).await?;

    println!();
    println!("  Build finished!");
    println!("  Projects: {}", summary.projects_built);
    println!("  Output:   {}", run_config.output_dir.display());
    if let Some(index_path) = &summary.index_path {
        println!("  Index:    {} ({} docs)", index_path.display(), summary.documents);
    }
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        Self { spinner }
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn install_started(&self, source: &InstallSource) {
        // No tick yet: cargo streams straight to the terminal.
        eprintln!("Installing generator from {source}");
    }

    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
        self.spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    }

    fn project_started(&self, project: &ProjectDescriptor, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Building [{current}/{total}] {}",
            project.relative_dir.display()
        ));
    }

    fn build_failed(&self, project: &ProjectDescriptor, result: &BuildResult) {
        self.spinner.finish_and_clear();
        eprintln!("Error building {}:", project.source_dir.display());
        eprint!("{}", result.diagnostics());
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(root, config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

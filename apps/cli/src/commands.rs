//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use postpress_core::{
    FixedPacing, PostOutcome, PostReport, ProgressReporter, PublishConfig, Publisher, RunReport,
};
use postpress_markdown::RenderOptions;
use postpress_shared::{
    AppConfig, PostIndex, WpConfig, config_dir, init_config, load_config, load_config_from,
};
use postpress_wordpress::WpClient;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// postpress: publish a markdown blog to WordPress.
#[derive(Parser)]
#[command(
    name = "postpress",
    version,
    about = "Publish a markdown blog corpus to a WordPress site, idempotently by slug.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./postpress.toml, then ~/.postpress/postpress.toml).
    #[arg(long = "config", global = true, env = "POSTPRESS_CONFIG")]
    pub config_file: Option<PathBuf>,

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
    /// Publish every post in the index (create or update by slug).
    Publish {
        /// Path to the JSON post index.
        #[arg(long)]
        index: Option<PathBuf>,

        /// Directory holding `<slug>.md` files.
        #[arg(long)]
        content_dir: Option<PathBuf>,

        /// Only publish these slugs (repeatable).
        #[arg(long = "only", value_name = "SLUG")]
        only: Vec<String>,

        /// Look everything up but create, update and upload nothing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Verify the site is reachable and the credentials are accepted.
    Check,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init {
        /// Directory to write `postpress.toml` into (defaults to ~/.postpress).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Crates whose events the default filter lets through.
const LOG_TARGETS: &[&str] = &[
    "postpress",
    "postpress_core",
    "postpress_wordpress",
    "postpress_markdown",
    "postpress_shared",
];

fn default_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// the per-post status lines.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_file.as_deref();
    match cli.command {
        Command::Publish {
            index,
            content_dir,
            only,
            dry_run,
        } => {
            cmd_publish(
                config_path,
                index.as_deref(),
                content_dir.as_deref(),
                &only,
                dry_run,
            )
            .await
        }
        Command::Check => cmd_check().await,
        Command::Config { action } => match action {
            ConfigAction::Init { dir } => cmd_config_init(dir.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// Build a client and probe the site. Fails before any post is touched.
async fn connect(site: &WpConfig) -> Result<WpClient> {
    let client = WpClient::new(site)?;
    client.check_connectivity().await?;
    info!(site = %site.base_url, user = %site.username, "connected");
    Ok(client)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_publish(
    config_path: Option<&Path>,
    index: Option<&Path>,
    content_dir: Option<&Path>,
    only: &[String],
    dry_run: bool,
) -> Result<()> {
    // Site settings first: a missing variable ends the run before any
    // file is read or request is sent.
    let site = WpConfig::from_env()?;
    let config = app_config(config_path)?;

    let index_path = index
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.content.index_path));
    let content_dir = content_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.content.content_dir));

    let index = PostIndex::load(&index_path)?.filtered(only);
    for slug in only {
        if !index.posts.iter().any(|p| &p.slug == slug) {
            warn!(slug = %slug, "--only slug not found in index");
        }
    }

    let client = connect(&site).await?;

    info!(
        site = %site.base_url,
        index = %index_path.display(),
        posts = index.posts.len(),
        dry_run,
        "publishing"
    );

    let publish_config = PublishConfig {
        content_dir,
        render: RenderOptions {
            strip_title: config.content.strip_title,
        },
        category: config.publish.category.clone(),
        existing_statuses: config.publish.existing_statuses.clone(),
        dry_run,
    };
    let pacing = FixedPacing::from(&config.pacing);

    let reporter = CliProgress::new(index.posts.len());
    let mut publisher = Publisher::new(&client, &publish_config, &pacing);
    let report = publisher.publish_all(&index, &reporter).await;

    print_summary(&report, dry_run);

    if report.has_failures() {
        return Err(eyre!("{} post(s) failed to publish", report.failed.len()));
    }
    Ok(())
}

async fn cmd_check() -> Result<()> {
    let site = WpConfig::from_env()?;
    connect(&site).await?;
    println!("Connected to {} as {}", site.base_url, site.username);
    Ok(())
}

fn cmd_config_init(dir: Option<&Path>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => config_dir()?,
    };
    let path = init_config(&dir)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_summary(report: &RunReport, dry_run: bool) {
    println!();
    if dry_run {
        println!("  Dry run complete (nothing was written)");
        println!("  Would create: {}", report.would_create);
        println!("  Would update: {}", report.would_update);
    } else {
        println!("  Publish complete");
        println!("  Created: {}", report.created);
        println!("  Updated: {}", report.updated);
    }
    println!("  Skipped: {}", report.skipped);
    println!("  Failed:  {}", report.failed.len());
    println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());

    if report.has_failures() {
        println!();
        for failure in &report.failed {
            println!("  ✗ {} ({}): {}", failure.slug, failure.title, failure.error);
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter: an indicatif bar plus one status line per post.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn post_started(&self, slug: &str, current: usize, _total: usize) {
        self.bar.set_position(current.saturating_sub(1) as u64);
        self.bar.set_message(slug.to_string());
    }

    fn post_finished(&self, report: &PostReport) {
        self.bar.inc(1);
        // Printed outside the bar so the lines survive a hidden draw target.
        self.bar.suspend(|| {
            println!("{}", status_line(report));
            for degraded in &report.degraded {
                println!("      warning: {degraded}");
            }
        });
    }

    fn done(&self, _report: &RunReport) {
        self.bar.finish_and_clear();
    }
}

fn status_line(report: &PostReport) -> String {
    let detail = match &report.outcome {
        PostOutcome::Created { id } | PostOutcome::Updated { id } => format!("id {id}"),
        PostOutcome::WouldUpdate { id } => format!("existing id {id}"),
        PostOutcome::WouldCreate => String::new(),
        PostOutcome::Skipped { reason } => reason.clone(),
        PostOutcome::Failed { error } => error.to_string(),
    };
    let label = report.outcome.label();
    if detail.is_empty() {
        format!("  {label:<12} {}", report.slug)
    } else {
        format!("  {label:<12} {} ({detail})", report.slug)
    }
}

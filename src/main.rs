use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extaudit::{
    checker::{DeprecationChecker, RequirementsChecker},
    config::Config,
    model::{AuditReport, MessageBucket},
    output::{format_report_to_string, print_report, OutputFormat},
    platform,
    source::{
        ComponentSource, ComposerManifestSource, FileClassInspector, FileComponentSource,
        InstalledVersionOracle, ProjectLayout,
    },
    RuntimeConfig,
};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const FINDINGS: u8 = 2;
}

#[derive(Parser)]
#[command(name = "extaudit")]
#[command(
    author,
    version,
    about = "Audit extension modules for dependency and deprecation issues"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit the modules of a project
    Scan {
        /// Project root containing the modules and the vendor/ directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Audit only these modules, by name or composer package (repeatable)
        #[arg(short, long)]
        module: Vec<String>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<String>,

        /// Suppress "unnecessary dependency" findings
        #[arg(long)]
        hide_needless: bool,

        /// Additional whitelisted requirement names (repeatable, supports *)
        #[arg(short, long)]
        whitelist: Vec<String>,

        /// PHP version to audit against instead of detecting the interpreter
        #[arg(long)]
        php_version: Option<String>,

        /// Exit with code 2 when any finding is produced
        #[arg(long)]
        fail_on_findings: bool,

        /// Disable concurrent scanning (scan modules sequentially)
        #[arg(long)]
        no_parallel: bool,
    },

    /// List the modules discovered under a project root
    ListModules {
        /// Project root to search
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            path,
            module,
            format,
            output,
            hide_needless,
            whitelist,
            php_version,
            fail_on_findings,
            no_parallel,
        } => {
            let format_str = format.unwrap_or_else(|| config.default_format.clone());
            let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;

            let php_version = match php_version.or_else(|| config.php_version.clone()) {
                Some(version) => version,
                None => platform::php_version()
                    .context("could not detect the PHP version; pass --php-version")?,
            };

            let runtime = config.runtime_config(hide_needless, &whitelist);
            let parallel = !no_parallel && config.scan_parallel;

            run_scan(
                &path,
                &module,
                format,
                output,
                php_version,
                runtime,
                fail_on_findings,
                parallel,
            )
            .await
        }
        Commands::ListModules { path } => {
            list_modules(&path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_scan(
    path: &Path,
    module_filter: &[String],
    format: OutputFormat,
    output_file: Option<String>,
    php_version: String,
    runtime: RuntimeConfig,
    fail_on_findings: bool,
    parallel: bool,
) -> Result<u8> {
    let is_interactive = format == OutputFormat::Table;

    let layout = Arc::new(ProjectLayout::discover(path)?);
    let modules = select_modules(&layout, module_filter)?;

    let bucket = Arc::new(MessageBucket::new());
    let runtime = Arc::new(runtime);
    let php_version = Arc::new(php_version);

    // Scan modules (concurrently or sequentially)
    let errors = if parallel && modules.len() > 1 {
        scan_concurrent(
            &layout,
            &runtime,
            &bucket,
            &php_version,
            &modules,
            is_interactive,
        )
        .await?
    } else {
        scan_sequential(
            &layout,
            &runtime,
            &bucket,
            &php_version,
            &modules,
            is_interactive,
        )
    };

    for (module, error) in &errors {
        eprintln!("Error scanning {}: {:#}", module, error);
    }

    let report = AuditReport::new(modules, bucket.findings());

    // Handle output
    if let Some(file) = output_file {
        let content = format_report_to_string(&report, format)?;
        std::fs::write(&file, content).with_context(|| format!("failed to write {file}"))?;
        if is_interactive {
            println!("Results written to: {}", file);
        }
    } else {
        print_report(&report, format)?;
    }

    if !errors.is_empty() {
        return Ok(exit_codes::ERROR);
    }
    if fail_on_findings && report.has_findings() {
        return Ok(exit_codes::FINDINGS);
    }
    Ok(exit_codes::SUCCESS)
}

/// Run both checkers for one module against the shared bucket.
fn scan_module(
    layout: &ProjectLayout,
    runtime: &RuntimeConfig,
    bucket: &MessageBucket,
    php_version: &str,
    module: &str,
) -> extaudit::Result<()> {
    let manifests = ComposerManifestSource::new(layout);
    let components = FileComponentSource::new(layout);
    let inspector = FileClassInspector::new(layout);
    let oracle = InstalledVersionOracle::new(layout);

    let observed = components.components_for_module(module)?;

    RequirementsChecker::new(&manifests, &oracle, runtime, bucket, php_version)
        .scan(module, &observed)?;
    DeprecationChecker::new(&components, &inspector, bucket).scan(module)
}

/// Scan all modules concurrently on blocking tasks
async fn scan_concurrent(
    layout: &Arc<ProjectLayout>,
    runtime: &Arc<RuntimeConfig>,
    bucket: &Arc<MessageBucket>,
    php_version: &Arc<String>,
    modules: &[String],
    is_interactive: bool,
) -> Result<Vec<(String, anyhow::Error)>> {
    let progress = if is_interactive {
        let pb = ProgressBar::new(modules.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning modules...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let tasks: Vec<_> = modules
        .iter()
        .cloned()
        .map(|module| {
            let layout = Arc::clone(layout);
            let runtime = Arc::clone(runtime);
            let bucket = Arc::clone(bucket);
            let php_version = Arc::clone(php_version);
            let pb = progress.clone();
            tokio::task::spawn_blocking(move || {
                let result = scan_module(&layout, &runtime, &bucket, &php_version, &module);
                if let Some(pb) = pb {
                    pb.inc(1);
                }
                (module, result)
            })
        })
        .collect();

    let mut errors = Vec::new();
    for joined in join_all(tasks).await {
        let (module, result) = joined.context("scan task failed")?;
        if let Err(e) = result {
            errors.push((module, e.into()));
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Scanned {} modules", modules.len()));
    }

    Ok(errors)
}

/// Scan modules sequentially
fn scan_sequential(
    layout: &ProjectLayout,
    runtime: &RuntimeConfig,
    bucket: &MessageBucket,
    php_version: &str,
    modules: &[String],
    is_interactive: bool,
) -> Vec<(String, anyhow::Error)> {
    let progress = if is_interactive {
        let pb = ProgressBar::new(modules.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut errors = Vec::new();
    for module in modules {
        if let Some(ref pb) = progress {
            pb.set_message(format!("Scanning {}...", module));
        }

        if let Err(e) = scan_module(layout, runtime, bucket, php_version, module) {
            errors.push((module.clone(), e.into()));
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Scanned {} modules", modules.len()));
    }

    errors
}

fn select_modules(layout: &ProjectLayout, filter: &[String]) -> Result<Vec<String>> {
    if filter.is_empty() {
        return Ok(layout.modules().iter().map(|m| m.name.clone()).collect());
    }

    let mut names = Vec::new();
    for wanted in filter {
        let module = layout
            .module(wanted)
            .with_context(|| format!("unknown module \"{}\"", wanted))?;
        names.push(module.name.clone());
    }
    Ok(names)
}

fn list_modules(path: &Path) -> Result<()> {
    let layout = ProjectLayout::discover(path)?;

    if layout.modules().is_empty() {
        println!("No modules found under {}", path.display());
        return Ok(());
    }

    println!("Found {} modules:", layout.modules().len());
    println!();
    for module in layout.modules() {
        println!("  {:<40} {}", module.name, module.package_name);
    }
    Ok(())
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'extaudit config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

//! bundlesync: install and update a native tool bundle from the command line.
//!
//! - `status`  - show the installed bundle
//! - `check`   - compare the installed bundle with the release feed
//! - `install` - download and atomically install the matching release

mod progress;
mod signal;

use anyhow::{bail, Context, Result};
use bundlesync::{BundleError, BundleMetadata, Notifier, S3Location, Updater, UpdaterConfig};
use bundlesync_platform::Target;
use clap::{Parser, Subcommand};
use progress::BarProgress;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bundlesync", version, about = "Install and update a native tool bundle")]
struct Cli {
    /// JSON updater config; flags below override its fields.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Bundle name (installs into `<install-root>/<name>-pkg`).
    #[arg(long)]
    name: Option<String>,

    /// Release host root, e.g. https://s3.amazonaws.com/bucket/folder/
    #[arg(long, conflicts_with = "s3_bucket")]
    base_url: Option<String>,

    /// Build the release host root from an S3 bucket instead of --base-url.
    /// BUNDLESYNC_S3_URL, BUNDLESYNC_BUCKET and BUNDLESYNC_FOLDER override it.
    #[arg(long)]
    s3_bucket: Option<String>,

    #[arg(long)]
    s3_folder: Option<String>,

    #[arg(long)]
    install_root: Option<PathBuf>,

    /// Version of the host application the bundle must be compatible with.
    #[arg(long)]
    client_version: Option<String>,

    /// Override the detected platform key (darwin, linux, win).
    #[arg(long, requires = "arch")]
    platform: Option<String>,

    /// Override the detected arch key (32bit, 64bit).
    #[arg(long, requires = "platform")]
    arch: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the installed bundle's metadata.
    Status,
    /// Check the release feed for a newer bundle.
    Check,
    /// Download and install the release matching the client version.
    Install,
}

impl Cli {
    fn base_url(&self) -> Option<String> {
        match &self.s3_bucket {
            Some(bucket) => {
                let folder = self.s3_folder.clone().unwrap_or_default();
                Some(S3Location::new(bucket.clone(), folder).base_url())
            }
            None => self.base_url.clone(),
        }
    }

    fn updater_config(&self) -> Result<UpdaterConfig> {
        let base_url = self.base_url();
        let mut cfg = match &self.config {
            Some(path) => UpdaterConfig::load(path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => {
                let (Some(name), Some(base_url), Some(client_version)) =
                    (&self.name, &base_url, &self.client_version)
                else {
                    bail!("either --config or --name, --base-url (or --s3-bucket) and --client-version are required");
                };
                UpdaterConfig::new(
                    name.clone(),
                    base_url.clone(),
                    bundlesync_platform::bundles_dir(),
                    client_version.clone(),
                )
            }
        };

        if let Some(name) = &self.name {
            cfg.name = name.clone();
        }
        if let Some(url) = &base_url {
            cfg.base_url = url.clone();
        }
        if let Some(root) = &self.install_root {
            cfg.install_root = root.clone();
        }
        if let Some(v) = &self.client_version {
            cfg.client_version = v.clone();
        }
        if let (Some(platform), Some(arch)) = (&self.platform, &self.arch) {
            cfg.target = Target::new(platform.clone(), arch.clone());
        }
        Ok(cfg)
    }
}

/// What the last sequence ended with.
#[derive(Debug, Default)]
struct Outcome {
    available: Option<BundleMetadata>,
    failed: Option<String>,
    canceled: bool,
    unpacked: bool,
}

struct Printer(Rc<RefCell<Outcome>>);

impl Notifier for Printer {
    fn io_error(&mut self, error: &BundleError) {
        self.0.borrow_mut().failed = Some(error.to_string());
    }

    fn metadata_downloaded(&mut self, metadata: &BundleMetadata) {
        tracing::info!(
            "feed offers {} for client {}",
            metadata.display_version(),
            metadata.client_version
        );
    }

    fn update_available(&mut self, metadata: &BundleMetadata) {
        self.0.borrow_mut().available = Some(metadata.clone());
    }

    fn unpacked(&mut self) {
        self.0.borrow_mut().unpacked = true;
    }

    fn canceled(&mut self) {
        self.0.borrow_mut().canceled = true;
    }
}

fn print_metadata(label: &str, meta: &BundleMetadata) {
    println!("{label}: {}", meta.display_version());
    if !meta.message.is_empty() {
        println!("  {}", meta.message);
    }
    if meta.has_changes() {
        for change in &meta.changes {
            println!("  - {change}");
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = cli.updater_config()?;
    let wait = Duration::from_secs(cfg.timeout_secs.saturating_mul(2).max(1));
    let mut updater = Updater::new(cfg).context("creating updater")?;

    let outcome = Rc::new(RefCell::new(Outcome::default()));
    updater.subscribe(Box::new(Printer(outcome.clone())));

    let bar = Arc::new(BarProgress::new());
    updater.set_progress(bar.clone());
    signal::cancel_on_signals(&updater.cancel_flag()).context("installing Ctrl-C handler")?;

    match cli.command {
        Command::Status => {
            println!("bundle dir: {}", updater.bundle_path().display());
            match updater.local_metadata() {
                Some(meta) => {
                    print_metadata("installed", &meta);
                    println!("executable: {}", updater.exe_path().display());
                }
                None => println!("installed: N/A"),
            }
            return Ok(());
        }
        Command::Check => updater.check_for_update(false)?,
        Command::Install => updater.install_update(None)?,
    }

    let finished = updater.wait_idle(wait);
    bar.finish();
    if !finished {
        bail!("timed out waiting for the updater");
    }

    let outcome = outcome.borrow();
    if let Some(err) = &outcome.failed {
        bail!("{err}");
    }
    if outcome.canceled {
        bail!("canceled");
    }

    match cli.command {
        Command::Check => match &outcome.available {
            Some(meta) => print_metadata("update available", meta),
            None => println!("up to date"),
        },
        Command::Install if outcome.unpacked => {
            let installed = updater.local_metadata();
            match installed {
                Some(meta) => print_metadata("installed", &meta),
                None => println!("installed into {}", updater.bundle_path().display()),
            }
        }
        _ => {}
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bundlesync=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

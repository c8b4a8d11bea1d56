use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ghdump_clone::orchestrator::CloneOrchestrator;
use ghdump_clone::pipeline::{run_dump, DumpRequest};
use ghdump_core::config::DumpConfig;
use ghdump_core::models::clone::{CloneMode, DumpReport};
use ghdump_core::models::repo::UrlProtocol;

use crate::report;

#[derive(Parser, Debug)]
#[command(
    name = "gh-dump",
    version,
    about = "Clone every repository of a GitHub account for backup"
)]
pub struct Cli {
    /// GitHub username
    #[arg(long)]
    user: String,
    /// A folder called `gh-dump` will be created in this folder [default: home directory]
    #[arg(long)]
    dump_root: Option<PathBuf>,
    /// Config file [default: ~/.ghdump/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,
    /// Maximum clones running at once (default: all at once)
    #[arg(long)]
    jobs: Option<usize>,
    /// Clone mode (mirror, checkout)
    #[arg(long)]
    mode: Option<String>,
    /// Clone URL protocol (ssh, https)
    #[arg(long)]
    protocol: Option<String>,
    /// Stop listing after this many pages of 100 repositories
    #[arg(long)]
    max_pages: Option<u32>,
}

impl Cli {
    /// Config file contents with command-line overrides applied.
    fn resolve_config(&self) -> anyhow::Result<DumpConfig> {
        let config = match &self.config {
            Some(path) => DumpConfig::load_from(path)?,
            None => DumpConfig::load()?,
        };
        self.apply_overrides(config)
    }

    fn apply_overrides(&self, mut config: DumpConfig) -> anyhow::Result<DumpConfig> {
        if let Some(jobs) = self.jobs {
            config.max_concurrent_clones = Some(jobs);
        }
        if let Some(ref mode) = self.mode {
            config.clone_mode = mode
                .parse::<CloneMode>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        if let Some(ref protocol) = self.protocol {
            config.protocol = protocol
                .parse::<UrlProtocol>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = Some(max_pages);
        }
        config.validate()?;
        Ok(config)
    }
}

pub async fn run(args: Cli) -> anyhow::Result<ExitCode> {
    let config = args.resolve_config()?;
    let dump_root = match args.dump_root {
        Some(root) => root,
        None => DumpConfig::default_dump_root()?,
    };
    tracing::debug!(?config, "resolved configuration");

    let request = DumpRequest {
        account: args.user,
        dump_root,
    };
    let credentials = ghdump_auth::select_provider(&config);
    let lister = ghdump_host::create_lister(&config)?;
    let orchestrator = CloneOrchestrator::from_config(&config);

    let report = run_dump(&request, credentials.as_ref(), lister.as_ref(), &orchestrator).await?;
    report::print(&report);

    Ok(ExitCode::from(exit_status(&report)))
}

/// Process exit status for a finished run: 1 if any clone failed.
fn exit_status(report: &DumpReport) -> u8 {
    if report.has_failures() {
        1
    } else {
        0
    }
}

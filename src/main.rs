use anyhow::{Context, Result};
use clap::Parser;
use gatescan::cli::Cli;
use gatescan::config::Profile;
use gatescan::output::{self, OutputFormat, ProgressBarSink};
use gatescan::geolocation::GeoLocator;
use gatescan::scanner::{run_scan_with, NoProgress, ProgressSink};
use gatescan::scripts::{ScriptRunner, KNOWN_SCRIPTS};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Logs go to stderr; `--verbose` forces debug level.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list_profiles {
        list_profiles();
        return Ok(());
    }
    if cli.list_scripts {
        list_scripts();
        return Ok(());
    }

    let settings = cli.load_settings().context("failed to load settings")?;
    let config = cli.scan_config(&settings)?;
    let (range, policy) = config.validate()?;
    let format = OutputFormat::from_flags(cli.json, cli.quiet);

    let scripts = ScriptRunner::new();
    if !config.script_list().is_empty() && !scripts.is_available().await {
        output::print_warning("nmap not found in PATH; script results will be errors");
    }

    let bar = if format.is_interactive() {
        output::print_scan_header(&config.host, range.len(), policy.max_workers.min(range.len()));
        Some(Arc::new(ProgressBarSink::new(range.len())))
    } else {
        None
    };
    let sink: Arc<dyn ProgressSink> = match &bar {
        Some(bar) => bar.clone(),
        None => Arc::new(NoProgress),
    };

    let report = run_scan_with(&config, sink, &GeoLocator::new(), &scripts).await;
    if let Some(bar) = &bar {
        bar.finish();
    }
    let report = report?;

    output::print_report(&report, format, cli.verbose).context("failed to write results")?;
    Ok(())
}

fn list_profiles() {
    for profile in Profile::ALL {
        let preset = profile.preset();
        println!(
            "{:<14} {:>4} workers  {:>5}ms timeout  {:>3}ms rate limit  {}",
            profile.to_string(),
            preset.workers,
            preset.timeout.as_millis(),
            preset.rate_limit.as_millis(),
            profile.description()
        );
    }
}

fn list_scripts() {
    for (name, description) in KNOWN_SCRIPTS {
        println!("{:<18} {}", name, description);
    }
}

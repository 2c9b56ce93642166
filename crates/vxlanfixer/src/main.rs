//! vxlanfixer - VXLAN forwarding table repair tool
//!
//! Entry point: loads the configuration, resolves the overlay network,
//! runs one reconciliation pass and prints the report on stdout.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use vxlanfix_common::{SetnsEntry, ShellRunner};
use vxlanfixer::{
    render_endpoints, ConsulDirectory, DockerClient, FixerConfig, FixerError, NamespaceLocator,
    VxlanContext, VxlanFixer,
};

/// Fix stale VXLAN forwarding entries of a Docker overlay network
#[derive(Parser, Debug)]
#[command(name = "vxlanfixer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short = 'c', long = "config", value_name = "config_file")]
    config_file: PathBuf,
}

/// Initializes tracing on stderr; stdout carries the report
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

// Namespace switches are per thread; keep every await on the main thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "vxlanfixer: run aborted");
            let code = e
                .downcast_ref::<FixerError>()
                .map(FixerError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let config = FixerConfig::load(&args.config_file)?;
    info!(
        network = %config.netns,
        device = %config.device,
        dry_run = config.dry_run,
        "Starting vxlanfixer"
    );

    let docker = DockerClient::new(config.docker.base_url(), config.timeout())?;
    let locator =
        NamespaceLocator::new(config.netns_dir.clone()).with_overrides(config.netns_map.clone());
    let context = VxlanContext::resolve(&config, &docker, &locator).await?;

    let directory = ConsulDirectory::new(
        config.consul.base_url(),
        config.kv_prefix.as_str(),
        config.timeout(),
    )?;
    let fixer = VxlanFixer::new(
        context,
        Arc::new(directory),
        Arc::new(ShellRunner),
        Arc::new(SetnsEntry),
    );

    if config.dump_endpoints {
        let canonical = fixer.canonical_endpoints().await?;
        println!("{}", render_endpoints("Consul endpoints", canonical));
        let observed = fixer.observed_endpoints().await?;
        println!("{}", render_endpoints("FDB endpoints", observed));
    }

    let report = fixer.run(config.dry_run).await?;
    print!("{}", report);
    Ok(())
}

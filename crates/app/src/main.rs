// Composition root: wires the filesystem index into the repository finder

use anyhow::{Context, Result};
use clap::Parser;
use repofinder::adapters::FsDiscoveryAdapter;
use repofinder::cli::CliArgs;
use repofinder::config::Config;
use repofinder::RepositoryFinder;
use repofinder_core::domain::FinderEvent;
use repofinder_core::ports::{ChannelObserver, MetadataIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean list of paths
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli_args = CliArgs::parse();
    let config = Config::from_cli_and_file(&cli_args)?;
    info!("Loaded config with {} scope(s)", config.search.scopes.len());

    let watch = config.search.live_updates;
    let index: Arc<dyn MetadataIndex> =
        Arc::new(FsDiscoveryAdapter::with_options(config.discovery_options()));
    let finder = RepositoryFinder::new(config.scopes(), config.repository_matcher(), index)
        .context("Failed to create repository finder")?;

    let (observer, mut events) = ChannelObserver::new();
    finder.set_observer(&observer);
    finder.start_query();

    let deadline = async {
        match cli_args.timeout {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(deadline, interrupt);

    let mut deadline_passed = false;
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    FinderEvent::StartedSearching => {
                        info!("Searching {:?}", finder.scopes());
                    }
                    FinderEvent::FoundRepositories(found) => {
                        for candidate in found {
                            println!("+ {}", candidate.path.display());
                        }
                    }
                    FinderEvent::RemovedRepositories(removed) => {
                        for id in removed {
                            println!("- {}", id);
                        }
                    }
                    FinderEvent::FinishedInitialScan(results) => {
                        eprintln!("Initial scan finished: {} repositories", results.len());
                        if !watch {
                            finder.stop_query();
                        }
                    }
                    FinderEvent::Failed(e) => {
                        eprintln!("warning: {}", e);
                    }
                    FinderEvent::StoppedSearching => break,
                }
            }

            _ = &mut deadline, if !deadline_passed => {
                deadline_passed = true;
                info!("Timeout reached, stopping search");
                finder.stop_query();
            }

            signal = &mut interrupt, if !interrupted => {
                interrupted = true;
                match signal {
                    Ok(()) => {
                        info!("Interrupted, stopping search");
                        finder.stop_query();
                    }
                    Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
                }
            }
        }
    }

    let results = finder.results().await?;
    eprintln!("Found {} repositories", results.len());
    Ok(())
}

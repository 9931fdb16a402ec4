//! Sync command implementation

use anyhow::{bail, Result};
use tracing::info;

use studyhub::config::Config;
use studyhub::sync::ReconcileOutcome;

use super::open_hub;

/// Run one reconciliation pass, or keep running until Ctrl+C with `watch`
pub async fn sync_command(config: &Config, user_id: &str, watch: bool) -> Result<()> {
    let hub = open_hub(config)?;
    if !hub.reconciler().has_provider() {
        bail!("Sync is not configured. Set [sync] enabled = true and an access_token.");
    }

    if watch {
        let handle = hub.spawn_sync(user_id, config.sync.interval());
        info!("Syncing every {:?}, press Ctrl+C to stop", config.sync.interval());
        tokio::signal::ctrl_c().await?;
        handle.stop().await;
        return Ok(());
    }

    match hub.reconcile(user_id).await? {
        ReconcileOutcome::Completed(report) => {
            println!(
                "Pulled {} tasks: {} updated, {} orphaned, {} relinked",
                report.pulled, report.updated, report.orphaned, report.relinked
            );
            if report.deferred > 0 {
                println!("{} events skipped while being edited", report.deferred);
            }
            if report.recovered > 0 {
                println!("{} interrupted events settled", report.recovered);
            }
        }
        ReconcileOutcome::Skipped => println!("A sync pass is already running"),
        ReconcileOutcome::NoProvider => println!("No task provider configured"),
        ReconcileOutcome::ProviderUnavailable(e) => {
            eprintln!("Task provider unavailable: {}", e);
        }
    }

    Ok(())
}

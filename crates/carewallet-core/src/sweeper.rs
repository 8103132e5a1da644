//! Background expiry sweep

use std::sync::Arc;
use std::time::Duration;

use carewallet_db::Store;
use carewallet_types::WalletResult;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Rows touched by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// One-time codes deleted
    pub codes: u64,
    /// Blacklist entries deleted
    pub blacklist: u64,
    /// Intents moved to expired
    pub intents: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.codes == 0 && self.blacklist == 0 && self.intents == 0
    }
}

#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<dyn Store>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn sweep_once(&self) -> WalletResult<SweepReport> {
        let now = Utc::now();
        let report = SweepReport {
            codes: self.store.delete_expired_codes(now).await?,
            blacklist: self.store.delete_expired_blacklist(now).await?,
            intents: self.store.expire_intents(now).await?,
        };

        if report.is_empty() {
            debug!("Expiry sweep found nothing to do");
        } else {
            info!(
                codes = report.codes,
                blacklist = report.blacklist,
                intents = report.intents,
                "Expiry sweep complete"
            );
        }
        Ok(report)
    }

    /// Sweep every `interval` until `shutdown` flips to true
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval = ?interval, "Expiry sweeper started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        error!(op = "sweep_expired", error = %e, "Expiry sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Expiry sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewallet_db::MemoryStore;
    use carewallet_types::{NewOneTimeCode, OtpPurpose, UserId};

    #[tokio::test]
    async fn test_sweep_removes_stale_rows() {
        let store = MemoryStore::new();
        let past = Utc::now() - chrono::Duration::minutes(1);
        store
            .insert_code(NewOneTimeCode {
                email: "a@b.co".to_string(),
                purpose: OtpPurpose::Withdrawal,
                code_hash: "x".repeat(64),
                expires_at: past,
            })
            .await
            .unwrap();
        store.blacklist_token("jti-1", UserId::new(), past).await.unwrap();
        store
            .blacklist_token("jti-2", UserId::new(), Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        let sweeper = ExpirySweeper::new(Arc::new(store.clone()));
        let report = sweeper.sweep_once().await.unwrap();

        assert_eq!(report.codes, 1);
        assert_eq!(report.blacklist, 1);
        assert_eq!(report.intents, 0);
        assert!(store.is_token_blacklisted("jti-2").await.unwrap());
        assert!(sweeper.sweep_once().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let sweeper = ExpirySweeper::new(Arc::new(MemoryStore::new()));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            sweeper.run(Duration::from_secs(60), rx).await;
        });

        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}

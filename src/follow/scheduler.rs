use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::store::FollowStore;
use crate::error::{AppError, AppResult};

/// Runs [`FollowStore::refresh_all`] on a cron schedule.
pub struct FollowRefreshScheduler {
    scheduler: Arc<Mutex<JobScheduler>>,
    cron_expression: String,
}

impl FollowRefreshScheduler {
    /// `cron_expression` uses six fields, seconds first.
    pub async fn new(store: Arc<FollowStore>, cron_expression: &str) -> AppResult<Self> {
        let scheduler = JobScheduler::new().await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        let job = Job::new_async(cron_expression, move |_uuid, _lock| {
            let store = Arc::clone(&store);
            Box::pin(async move {
                let summary = store.refresh_all().await;
                tracing::debug!(
                    refreshed = summary.refreshed,
                    failed = summary.failed,
                    "Scheduled follow refresh finished"
                );
            })
        })
        .map_err(|e| AppError::Validation {
            field: "follows.refresh_cron".to_string(),
            reason: format!("invalid cron expression '{}': {}", cron_expression, e),
        })?;

        scheduler.add(job).await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            cron_expression: cron_expression.to_string(),
        })
    }

    pub fn cron_expression(&self) -> &str {
        &self.cron_expression
    }

    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        tracing::info!(cron = %self.cron_expression, "Follow refresh scheduler started");
        Ok(())
    }

    pub async fn stop(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        tracing::info!("Follow refresh scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::live::AdapterRegistry;
    use crate::test_support::{FakeBackend, MemoryFollowRepository};

    fn store() -> Arc<FollowStore> {
        Arc::new(FollowStore::new(
            Arc::new(MemoryFollowRepository::new()),
            AdapterRegistry::with_backend(Arc::new(FakeBackend::new())),
        ))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_valid_cron_is_scheduled() {
        let scheduler = FollowRefreshScheduler::new(store(), "0 */2 * * * *")
            .await
            .unwrap();
        assert_eq!(scheduler.cron_expression(), "0 */2 * * * *");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_cron_is_rejected() {
        let result = FollowRefreshScheduler::new(store(), "every two minutes").await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}

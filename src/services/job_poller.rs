use serde_json::Value;
use tokio::sync::watch;

use crate::{
    configuration::PollingSettings,
    domain::scrape_job::{JobStatus, ScrapeJob},
    error::PipelineError,
};

use super::ScrapeProvider;

/// Fires the paired [`CancelToken`].
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Raced against every wait of the poll loop. Dropping the handle without
/// calling `cancel` leaves the token pending forever.
#[derive(Clone)]
pub struct CancelToken {
    receiver: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    pub fn never() -> Self {
        CancelToken { receiver: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.receiver.as_ref().is_some_and(|r| *r.borrow())
    }

    pub async fn cancelled(&mut self) {
        if let Some(receiver) = self.receiver.as_mut() {
            if receiver.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (sender, receiver) = watch::channel(false);
    (
        CancelHandle { sender },
        CancelToken {
            receiver: Some(receiver),
        },
    )
}

pub struct JobPoller<'a, P> {
    provider: &'a P,
    settings: PollingSettings,
}

impl<'a, P: ScrapeProvider> JobPoller<'a, P> {
    pub fn new(provider: &'a P, settings: PollingSettings) -> Self {
        JobPoller { provider, settings }
    }

    pub async fn submit(&self, actor_id: &str, input: &Value) -> Result<ScrapeJob, PipelineError> {
        let handle = self.provider.start_run(actor_id, input).await?;
        log::info!(
            "Started run {} of actor {} with dataset {}",
            handle.id,
            actor_id,
            handle.dataset_id
        );

        Ok(ScrapeJob::new(
            handle.id,
            actor_id.to_string(),
            Some(handle.dataset_id),
        ))
    }

    /// Checks the run once per interval until it succeeds, fails, or the
    /// attempt budget runs out. The job keeps the last observed status, dataset
    /// and failure message whichever way this returns.
    pub async fn await_completion(
        &self,
        job: &mut ScrapeJob,
        cancel: &mut CancelToken,
    ) -> Result<(), PipelineError> {
        let max_attempts = self.settings.max_attempts;

        for attempt in 1..=max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::warn!("Stopped polling run {} after {} checks", job.id, attempt - 1);
                    return Err(PipelineError::Cancelled);
                }
                _ = tokio::time::sleep(self.settings.interval()) => {}
            }

            let state = self.provider.run_status(&job.id).await?;
            log::info!(
                "Run {} is {} (check {}/{})",
                job.id,
                state.status,
                attempt,
                max_attempts
            );

            job.status = JobStatus::from(state.status.as_str());
            if state.dataset_id.is_some() {
                job.dataset_id = state.dataset_id;
            }

            match job.status {
                JobStatus::Ready | JobStatus::Running => continue,
                JobStatus::Succeeded => return Ok(()),
                JobStatus::Failed => {
                    let message = state
                        .error_message
                        .unwrap_or_else(|| "Provider reported the run as failed".to_string());
                    log::error!("Run {} failed: {}", job.id, message);
                    job.error_message = Some(message.clone());
                    return Err(PipelineError::ExtractionFailed { message });
                }
                JobStatus::TimedOut | JobStatus::Unknown => {
                    return Err(PipelineError::UnexpectedStatus {
                        status: state.status,
                    });
                }
            }
        }

        job.status = JobStatus::TimedOut;
        log::error!(
            "Run {} still not finished after {} checks, started at {}",
            job.id,
            max_attempts,
            job.started_at
        );
        Err(PipelineError::Timeout {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::VecDeque,
        time::Duration,
    };

    use serde_json::{json, Value};
    use tokio::time::Instant;

    use super::{cancel_pair, CancelToken, JobPoller};
    use crate::{
        configuration::PollingSettings,
        domain::scrape_job::{JobStatus, ScrapeJob},
        error::PipelineError,
        services::{RunHandle, RunState, ScrapeProvider},
    };

    /// Replays a fixed list of statuses, repeating the last one forever.
    struct ScriptedProvider {
        statuses: RefCell<VecDeque<&'static str>>,
        last: &'static str,
        polls: Cell<u32>,
    }

    impl ScriptedProvider {
        fn new(statuses: &[&'static str]) -> Self {
            ScriptedProvider {
                statuses: RefCell::new(statuses.iter().copied().collect()),
                last: statuses.last().copied().unwrap_or("RUNNING"),
                polls: Cell::new(0),
            }
        }
    }

    impl ScrapeProvider for ScriptedProvider {
        async fn start_run(&self, _: &str, _: &Value) -> Result<RunHandle, PipelineError> {
            Ok(RunHandle {
                id: "run-1".to_string(),
                dataset_id: "ds-1".to_string(),
            })
        }

        async fn run_status(&self, _: &str) -> Result<RunState, PipelineError> {
            self.polls.set(self.polls.get() + 1);
            let status = self.statuses.borrow_mut().pop_front().unwrap_or(self.last);

            match status {
                "NETWORK" => Err(PipelineError::Provider {
                    status: 502,
                    body: "bad gateway".to_string(),
                }),
                _ => Ok(RunState {
                    status: status.to_string(),
                    error_message: (status == "FAILED").then(|| "Actor crashed".to_string()),
                    dataset_id: (status == "SUCCEEDED").then(|| "ds-final".to_string()),
                }),
            }
        }

        async fn dataset_items(&self, _: &str) -> Result<Value, PipelineError> {
            Ok(json!([]))
        }
    }

    fn job() -> ScrapeJob {
        ScrapeJob::new("run-1".into(), "actor".into(), Some("ds-1".into()))
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_exactly_four_polls() {
        let provider = ScriptedProvider::new(&["READY", "RUNNING", "RUNNING", "SUCCEEDED"]);
        let poller = JobPoller::new(&provider, PollingSettings::default());

        let mut job = job();
        poller
            .await_completion(&mut job, &mut CancelToken::never())
            .await
            .unwrap();

        assert_eq!(provider.polls.get(), 4);
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.dataset_id.as_deref(), Some("ds-final"));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_thirty_polls() {
        let provider = ScriptedProvider::new(&["RUNNING"]);
        let poller = JobPoller::new(&provider, PollingSettings::default());
        let started = Instant::now();
        let mut job = job();

        let result = poller
            .await_completion(&mut job, &mut CancelToken::never())
            .await;

        assert!(matches!(result, Err(PipelineError::Timeout { attempts: 30 })));
        assert_eq!(provider.polls.get(), 30);
        assert_eq!(job.status, JobStatus::TimedOut);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(300) && elapsed < Duration::from_secs(301));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_reports_provider_message() {
        let provider = ScriptedProvider::new(&["RUNNING", "FAILED"]);
        let poller = JobPoller::new(&provider, PollingSettings::default());
        let mut job = job();

        let result = poller
            .await_completion(&mut job, &mut CancelToken::never())
            .await;

        match result {
            Err(PipelineError::ExtractionFailed { message }) => assert_eq!(message, "Actor crashed"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(provider.polls.get(), 2);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("Actor crashed"));
    }

    #[tokio::test(start_paused = true)]
    async fn unrecognized_status_stops_polling() {
        let provider = ScriptedProvider::new(&["RUNNING", "ABORTED"]);
        let poller = JobPoller::new(&provider, PollingSettings::default());

        let result = poller
            .await_completion(&mut job(), &mut CancelToken::never())
            .await;

        match result {
            Err(PipelineError::UnexpectedStatus { status }) => assert_eq!(status, "ABORTED"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(provider.polls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_propagates_without_retry() {
        let provider = ScriptedProvider::new(&["RUNNING", "NETWORK", "SUCCEEDED"]);
        let poller = JobPoller::new(&provider, PollingSettings::default());

        let result = poller
            .await_completion(&mut job(), &mut CancelToken::never())
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::Provider { status: 502, .. })
        ));
        assert_eq!(provider.polls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_aborts_the_wait() {
        let provider = ScriptedProvider::new(&["RUNNING"]);
        let poller = JobPoller::new(&provider, PollingSettings::default());
        let (handle, mut token) = cancel_pair();

        let cancel_later = async {
            tokio::time::sleep(Duration::from_secs(15)).await;
            handle.cancel();
        };
        let mut job = job();
        let (result, _) = tokio::join!(poller.await_completion(&mut job, &mut token), cancel_later);

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert_eq!(provider.polls.get(), 1);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn submit_records_dataset_handle() {
        let provider = ScriptedProvider::new(&["RUNNING"]);
        let poller = JobPoller::new(&provider, PollingSettings::default());

        let job = poller.submit("apify/tweet-scraper", &json!({})).await.unwrap();

        assert_eq!(job.id, "run-1");
        assert_eq!(job.actor_id, "apify/tweet-scraper");
        assert_eq!(job.status, JobStatus::Ready);
        assert_eq!(job.dataset_id.as_deref(), Some("ds-1"));
    }
}

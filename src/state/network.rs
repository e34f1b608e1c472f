use crate::state::fetcher::DeadlineFetcher;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::tasks::TaskHandle;
use futures_util::FutureExt;
use log::{debug, error};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub is_loading: bool,
}

/// Runs each deadline fetch as its own task. Fetches may overlap; whichever
/// settles last is what the UI ends up showing.
///
/// The in-flight count lives on the worker loop alone. Finished fetches report
/// back over `done`, so the loading flags always alternate.
pub struct NetworkWorker {
    fetcher: Arc<DeadlineFetcher>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    done_tx: mpsc::UnboundedSender<()>,
    done_rx: mpsc::UnboundedReceiver<()>,
    in_flight: usize,
    /// Dropped with the worker, which aborts anything still running.
    fetches: Vec<TaskHandle>,
}

impl NetworkWorker {
    pub fn new(
        fetcher: Arc<DeadlineFetcher>,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            fetcher,
            requests,
            responses,
            done_tx,
            done_rx,
            in_flight: 0,
            fetches: Vec::new(),
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(NetworkRequest::FetchDeadline { reason }) => {
                        debug!("deadline fetch requested ({reason})");
                        self.fetches.retain(|fetch| !fetch.is_finished());
                        self.in_flight += 1;
                        if self.in_flight == 1 {
                            self.send_loading(true).await;
                        }
                        let fetch = self.spawn_fetch();
                        self.fetches.push(fetch);
                    }
                    None => break,
                },

                Some(()) = self.done_rx.recv() => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    if self.in_flight == 0 {
                        self.send_loading(false).await;
                    }
                }
            }
        }
        debug!("network request channel closed");
    }

    fn spawn_fetch(&self) -> TaskHandle {
        let fetcher = self.fetcher.clone();
        let responses = self.responses.clone();
        let done = self.done_tx.clone();

        TaskHandle::spawn(async move {
            let response = match AssertUnwindSafe(fetcher.fetch()).catch_unwind().await {
                Ok(outcome) => NetworkResponse::DeadlineLoaded { outcome },
                Err(_) => NetworkResponse::Error { message: "Deadline fetch crashed.".into() },
            };

            if let Err(e) = responses.send(response).await {
                error!("Failed to send network response: {e}");
            }
            let _ = done.send(());
        })
    }

    async fn send_loading(&self, is_loading: bool) {
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state: LoadingState { is_loading } })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fetcher::DeadlineSource;
    use crate::state::messages::FetchReason;
    use fpl_api::DeadlineFeed;
    use fpl_api::client::{ApiError, ApiResult};
    use futures_util::future::BoxFuture;
    use std::time::Duration;

    struct Unreachable;

    impl DeadlineSource for Unreachable {
        fn fetch_feed(&self) -> BoxFuture<'_, ApiResult<DeadlineFeed>> {
            async { Err(ApiError::Server(502, "proxy".into())) }.boxed()
        }

        fn endpoint(&self) -> &str {
            "proxy"
        }
    }

    struct Slow;

    impl DeadlineSource for Slow {
        fn fetch_feed(&self) -> BoxFuture<'_, ApiResult<DeadlineFeed>> {
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(DeadlineFeed::default())
            }
            .boxed()
        }

        fn endpoint(&self) -> &str {
            "slow"
        }
    }

    struct Immediate;

    impl DeadlineSource for Immediate {
        fn fetch_feed(&self) -> BoxFuture<'_, ApiResult<DeadlineFeed>> {
            async { Ok(DeadlineFeed::default()) }.boxed()
        }

        fn endpoint(&self) -> &str {
            "immediate"
        }
    }

    fn spawn_worker(
        source: impl DeadlineSource + 'static,
    ) -> (mpsc::Sender<NetworkRequest>, mpsc::Receiver<NetworkResponse>, TaskHandle) {
        let fetcher = Arc::new(DeadlineFetcher::new(Arc::new(source), Duration::from_secs(10)));
        let (req_tx, req_rx) = mpsc::channel(8);
        let (resp_tx, resp_rx) = mpsc::channel(8);
        let worker = TaskHandle::spawn(NetworkWorker::new(fetcher, req_rx, resp_tx).run());
        (req_tx, resp_rx, worker)
    }

    #[tokio::test]
    async fn failed_fetch_arrives_as_fallback_between_loading_flags() {
        let (requests, mut responses, _worker) = spawn_worker(Unreachable);
        requests
            .send(NetworkRequest::FetchDeadline { reason: FetchReason::Startup })
            .await
            .unwrap();

        let Some(NetworkResponse::LoadingStateChanged { loading_state }) = responses.recv().await
        else {
            panic!("expected loading to start");
        };
        assert!(loading_state.is_loading);

        let Some(NetworkResponse::DeadlineLoaded { outcome }) = responses.recv().await else {
            panic!("expected a deadline");
        };
        assert!(outcome.using_fallback);
        assert!(outcome.error_message.unwrap().contains("502"));

        let Some(NetworkResponse::LoadingStateChanged { loading_state }) = responses.recv().await
        else {
            panic!("expected loading to stop");
        };
        assert!(!loading_state.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_fetches_both_publish() {
        let (requests, mut responses, _worker) = spawn_worker(Slow);
        for reason in [FetchReason::Manual, FetchReason::Scheduled] {
            requests.send(NetworkRequest::FetchDeadline { reason }).await.unwrap();
        }

        let mut loaded = 0;
        let mut loading_flags = Vec::new();
        while loaded < 2 || loading_flags.last() != Some(&false) {
            match responses.recv().await {
                Some(NetworkResponse::DeadlineLoaded { .. }) => loaded += 1,
                Some(NetworkResponse::LoadingStateChanged { loading_state }) => {
                    loading_flags.push(loading_state.is_loading)
                }
                other => panic!("unexpected response: {other:?}"),
            }
        }
        assert_eq!(loaded, 2);
        assert_eq!(loading_flags, vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_worker_discards_in_flight_fetches() {
        let (requests, mut responses, worker) = spawn_worker(Slow);
        requests
            .send(NetworkRequest::FetchDeadline { reason: FetchReason::Manual })
            .await
            .unwrap();
        assert!(matches!(
            responses.recv().await,
            Some(NetworkResponse::LoadingStateChanged { .. })
        ));

        drop(worker);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(responses.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn loading_flags_alternate_under_back_to_back_fetches() {
        let (requests, mut responses, _worker) = spawn_worker(Immediate);
        let rounds = 50;
        let sender = requests.clone();
        tokio::spawn(async move {
            for _ in 0..rounds {
                sender
                    .send(NetworkRequest::FetchDeadline { reason: FetchReason::Manual })
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        });

        let mut loaded = 0;
        let mut loading_flags = Vec::new();
        while loaded < rounds || loading_flags.last() != Some(&false) {
            match responses.recv().await {
                Some(NetworkResponse::DeadlineLoaded { .. }) => loaded += 1,
                Some(NetworkResponse::LoadingStateChanged { loading_state }) => {
                    loading_flags.push(loading_state.is_loading)
                }
                other => panic!("unexpected response: {other:?}"),
            }
        }

        assert_eq!(loading_flags.first(), Some(&true));
        for pair in loading_flags.windows(2) {
            assert_ne!(pair[0], pair[1], "loading flags out of order: {loading_flags:?}");
        }
    }
}

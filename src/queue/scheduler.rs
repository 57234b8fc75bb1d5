//! Rate-governed request queue.
//!
//! # Responsibilities
//! - Serialize all upstream calls: at most one in flight at any instant
//! - Pace successive request starts by a minimum inter-request interval
//! - On a rate-limit failure, requeue the item at the front and cool the
//!   whole queue down before continuing
//! - Resolve or reject each submitter exactly once
//!
//! Submitters only ever append and await a oneshot reply; a single drain
//! task owns dequeue-and-execute. The `draining` flag makes a second drain
//! trigger a no-op while one is active, and the drain task exits exactly
//! when the queue empties.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::upstream::{UpstreamError, UpstreamResponse};

type WorkResult = Result<UpstreamResponse, UpstreamError>;
type Work = Arc<dyn Fn() -> BoxFuture<'static, WorkResult> + Send + Sync>;

/// One pending unit of upstream work.
struct QueueItem {
    /// Re-invokable: a rate-limited attempt re-executes the same work.
    work: Work,
    reply: oneshot::Sender<WorkResult>,
    retry_count: u32,
}

struct QueueState {
    items: VecDeque<QueueItem>,
    draining: bool,
    /// Start time of the most recently executed item.
    last_request_time: Option<Instant>,
}

/// Single-flight queue pacing outbound calls against the upstream quota.
pub struct RequestQueue {
    state: Mutex<QueueState>,
    min_interval: Duration,
    cooldown: Duration,
    max_retries: u32,
}

impl RequestQueue {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                draining: false,
                last_request_time: None,
            }),
            min_interval: config.min_interval(),
            cooldown: config.cooldown(),
            max_retries: config.max_retries,
        }
    }

    /// Submit one unit of work and await its outcome.
    ///
    /// Completes when the work finally succeeds, permanently fails, or
    /// exhausts its rate-limit retries. Retries are invisible to the caller
    /// except as latency.
    pub async fn submit<F, Fut>(self: &Arc<Self>, work: F) -> WorkResult
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WorkResult> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let item = QueueItem {
            work: Arc::new(move || work().boxed()),
            reply,
            retry_count: 0,
        };

        let start_drain = {
            let mut state = self.state.lock().await;
            state.items.push_back(item);
            if state.draining {
                false
            } else {
                state.draining = true;
                true
            }
        };

        if start_drain {
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.drain().await });
        }

        match rx.await {
            Ok(result) => result,
            // Only reachable if the drain task is aborted mid-item.
            Err(_) => Err(UpstreamError::Transport(
                "request queue dropped the reply".to_string(),
            )),
        }
    }

    /// Number of items waiting to execute.
    pub async fn depth(&self) -> usize {
        self.state.lock().await.items.len()
    }

    async fn drain(self: Arc<Self>) {
        loop {
            // Pacing wait, computed without holding the lock across sleep so
            // submitters can keep appending.
            let wait = {
                let state = self.state.lock().await;
                if state.items.is_empty() {
                    None
                } else {
                    state.last_request_time.and_then(|last| {
                        self.min_interval.checked_sub(last.elapsed())
                    })
                }
            };
            if let Some(wait) = wait {
                tokio::time::sleep(wait).await;
            }

            let item = {
                let mut state = self.state.lock().await;
                match state.items.pop_front() {
                    Some(item) => {
                        state.last_request_time = Some(Instant::now());
                        item
                    }
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };

            match (item.work)().await {
                Ok(response) => {
                    let _ = item.reply.send(Ok(response));
                }
                Err(err) if err.is_rate_limit() && item.retry_count < self.max_retries => {
                    let retry_count = item.retry_count + 1;
                    tracing::warn!(
                        retry_count,
                        max_retries = self.max_retries,
                        cooldown_ms = self.cooldown.as_millis() as u64,
                        "rate limited by upstream, requeueing at front"
                    );
                    let mut state = self.state.lock().await;
                    state.items.push_front(QueueItem {
                        work: item.work,
                        reply: item.reply,
                        retry_count,
                    });
                    drop(state);
                    tokio::time::sleep(self.cooldown).await;
                }
                Err(err) => {
                    if err.is_rate_limit() {
                        tracing::warn!(
                            retries = item.retry_count,
                            "rate-limit retries exhausted, failing item"
                        );
                    }
                    let _ = item.reply.send(Err(err));
                }
            }
        }
    }
}

//! Periodic ticker polling with a shared, always-readable feed state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::models::Ticker;

use super::MarketClient;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_REFRESH_BUDGET: Duration = Duration::from_secs(5);

/// Anything that can produce a ticker for a pair.
#[async_trait]
pub trait TickerSource: Send + Sync + 'static {
    async fn fetch_ticker(&self, pair: &str) -> Option<Ticker>;
}

#[async_trait]
impl TickerSource for MarketClient {
    async fn fetch_ticker(&self, pair: &str) -> Option<Ticker> {
        self.ticker(pair).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    Loading,
    Ready(Ticker),
    /// Last fetch failed; the previous good ticker is kept for display.
    Failed { last: Option<Ticker> },
}

impl FeedState {
    pub fn latest(&self) -> Option<&Ticker> {
        match self {
            FeedState::Loading => None,
            FeedState::Ready(ticker) => Some(ticker),
            FeedState::Failed { last } => last.as_ref(),
        }
    }

    /// Fold a fetch result in. A ticker older than the one held is ignored.
    fn apply(&mut self, fetched: Option<Ticker>) {
        match fetched {
            Some(ticker) => {
                if let Some(current) = self.latest() {
                    if current.fetched_at > ticker.fetched_at {
                        debug!(pair = %ticker.symbol, "Discarding stale ticker");
                        return;
                    }
                }
                *self = FeedState::Ready(ticker);
            }
            None => {
                let last = self.latest().cloned();
                *self = FeedState::Failed { last };
            }
        }
    }
}

/// Polls one pair on a fixed schedule.
pub struct PriceWatcher<S> {
    source: Arc<S>,
    pair: String,
    poll_interval: Duration,
    refresh_budget: Duration,
    state: Arc<RwLock<FeedState>>,
}

impl<S> Clone for PriceWatcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            pair: self.pair.clone(),
            poll_interval: self.poll_interval,
            refresh_budget: self.refresh_budget,
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: TickerSource> PriceWatcher<S> {
    pub fn new(source: Arc<S>, pair: &str, poll_interval: Duration) -> Self {
        Self {
            source,
            pair: pair.to_string(),
            poll_interval,
            refresh_budget: DEFAULT_REFRESH_BUDGET,
            state: Arc::new(RwLock::new(FeedState::Loading)),
        }
    }

    /// Upper bound on the time [`refresh`](Self::refresh) spends retrying.
    pub fn with_refresh_budget(mut self, budget: Duration) -> Self {
        self.refresh_budget = budget;
        self
    }

    pub async fn state(&self) -> FeedState {
        self.state.read().await.clone()
    }

    /// Fetch with exponential backoff until a ticker arrives or the refresh
    /// budget runs out, then fold the result into the shared state.
    pub async fn refresh(&self) -> FeedState {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_interval(Duration::from_secs(2))
            .with_max_elapsed_time(Some(self.refresh_budget))
            .build();

        let fetched = backoff::future::retry(policy, || async {
            match self.source.fetch_ticker(&self.pair).await {
                Some(ticker) => Ok(ticker),
                None => {
                    debug!(pair = %self.pair, "Ticker fetch failed, backing off");
                    Err(backoff::Error::transient(()))
                }
            }
        })
        .await
        .ok();

        record(&self.state, &self.pair, fetched).await
    }

    /// Start polling in the background. The first fetch happens immediately;
    /// each tick is a [`refresh`](Self::refresh), and a failed one never stops
    /// the schedule. `on_update` sees every new state.
    pub fn spawn<F>(&self, on_update: F) -> JoinHandle<()>
    where
        F: Fn(&FeedState) + Send + 'static,
    {
        let watcher = self.clone();

        info!(
            pair = %watcher.pair,
            interval_secs = watcher.poll_interval.as_secs(),
            "Starting price watcher"
        );

        tokio::spawn(async move {
            let mut ticks = interval(watcher.poll_interval);
            // A slow refresh pushes the schedule back instead of bunching ticks
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let current = watcher.refresh().await;
                on_update(&current);
            }
        })
    }
}

async fn record(state: &RwLock<FeedState>, pair: &str, fetched: Option<Ticker>) -> FeedState {
    if fetched.is_none() {
        warn!(pair = %pair, "Price fetch failed");
    }
    let mut guard = state.write().await;
    guard.apply(fetched);
    guard.clone()
}

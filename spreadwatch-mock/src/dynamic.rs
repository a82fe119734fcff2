use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use spreadwatch_core::{Candle, CandleRequest, CandleSource, SpreadError};

/// Instruction for how a fetch should behave for a given symbol.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(SpreadError),
    /// Hang indefinitely (simulate a stalled request).
    Hang,
}

#[derive(Default)]
struct InternalState {
    rules: HashMap<String, MockBehavior<Vec<Candle>>>,
    // One-shot behaviors consumed before falling back to `rules`
    sequences: HashMap<String, VecDeque<MockBehavior<Vec<Candle>>>>,
    requests: Vec<CandleRequest>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the standing behavior for fetches of `symbol`.
    pub async fn set_behavior(
        &self,
        symbol: impl Into<String>,
        behavior: MockBehavior<Vec<Candle>>,
    ) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(symbol.into(), behavior);
    }

    /// Queue behaviors that are consumed one per call, ahead of the standing behavior.
    ///
    /// Once the queue is drained, the last queued behavior becomes the standing one
    /// unless a standing behavior was set explicitly.
    pub async fn push_sequence(
        &self,
        symbol: impl Into<String>,
        behaviors: Vec<MockBehavior<Vec<Candle>>>,
    ) {
        let symbol = symbol.into();
        let mut guard = self.state.lock().await;
        if let Some(last) = behaviors.last().cloned() {
            guard.rules.entry(symbol.clone()).or_insert(last);
        }
        guard.sequences.entry(symbol).or_default().extend(behaviors);
    }

    /// Number of fetches observed so far, across all symbols.
    pub async fn calls(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    /// Copy of every request received, in arrival order.
    pub async fn requests(&self) -> Vec<CandleRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Clear all configured behaviors and the request log.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.rules.clear();
        guard.sequences.clear();
        guard.requests.clear();
    }
}

/// A candle source that defers all behavior to an external controller.
pub struct DynamicMockSource {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockSource {
    /// Create a new dynamic mock source and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<dyn CandleSource>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn CandleSource>, controller)
    }
}

#[async_trait]
impl CandleSource for DynamicMockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    async fn fetch(&self, req: &CandleRequest) -> Result<Vec<Candle>, SpreadError> {
        // Snapshot the behavior without holding the lock across await points
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.requests.push(req.clone());
            let queued = guard
                .sequences
                .get_mut(&req.symbol)
                .and_then(VecDeque::pop_front);
            queued.or_else(|| guard.rules.get(&req.symbol).cloned())
        };

        match behavior {
            Some(MockBehavior::Return(candles)) => Ok(candles),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => std::future::pending().await,
            None => Err(SpreadError::Rejected {
                connector: self.name.to_string(),
                status: 404,
                msg: format!("no mock behavior for {}", req.symbol),
            }),
        }
    }
}

//! Model lifecycle
//!
//! `Unloaded -> Loading -> Ready | Failed`. The state lives in a watch
//! channel so transitions are compare-and-set under the channel lock and
//! waiters can observe the end of a load. The summarizer handle is written
//! once, before the state flips to `Ready`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tokio::sync::watch;

use super::model::Summarizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl ModelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelState::Unloaded => "unloaded",
            ModelState::Loading => "loading",
            ModelState::Ready => "ready",
            ModelState::Failed => "failed",
        }
    }
}

pub(crate) struct ModelSlot {
    state: watch::Sender<ModelState>,
    handle: OnceLock<Arc<dyn Summarizer>>,
    attempts: AtomicU64,
}

impl ModelSlot {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ModelState::Unloaded);
        Self {
            state,
            handle: OnceLock::new(),
            attempts: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> ModelState {
        *self.state.borrow()
    }

    pub(crate) fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Claim the single load slot if the state is one of `from`.
    /// Exactly one concurrent caller wins.
    pub(crate) fn begin_load(&self, from: &[ModelState]) -> bool {
        let won = self.state.send_if_modified(|state| {
            if from.contains(state) {
                *state = ModelState::Loading;
                true
            } else {
                false
            }
        });
        if won {
            self.attempts.fetch_add(1, Ordering::SeqCst);
        }
        won
    }

    pub(crate) fn finish_ready(&self, summarizer: Arc<dyn Summarizer>) {
        // Ready is terminal, so the cell is only ever filled once.
        let _ = self.handle.set(summarizer);
        self.state.send_replace(ModelState::Ready);
    }

    pub(crate) fn finish_failed(&self) {
        self.state.send_replace(ModelState::Failed);
    }

    /// The summarizer, only while `Ready`
    pub(crate) fn summarizer(&self) -> Option<Arc<dyn Summarizer>> {
        if self.state() == ModelState::Ready {
            self.handle.get().cloned()
        } else {
            None
        }
    }

    /// Wait for an in-flight load to finish; returns immediately otherwise.
    pub(crate) async fn settled(&self) -> ModelState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|state| *state != ModelState::Loading).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        settled
    }
}

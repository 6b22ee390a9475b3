use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Why a build stopped admitting tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The user interrupted the build.
    Requested,
    /// A task failed and fail-fast is enabled.
    FailFast,
    Custom(String),
}

/// Cooperative, monotonic cancellation flag shared by everything in one build.
///
/// Cancelling stops new tasks from being admitted; tasks already executing run to
/// completion unless their action chooses to observe the token.
#[derive(Debug, Clone, Default)]
pub struct BuildCancellationToken {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl BuildCancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this call cancelled the token. The first reason is kept.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let first = self.reason.set(reason.clone()).is_ok();
        if first {
            tracing::warn!(?reason, "build cancelled");
        }
        self.token.cancel();
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().cloned()
    }

    /// Resolves once the token is cancelled; immediately if it already is.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

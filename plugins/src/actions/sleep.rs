use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use kiln_core::api::{TaskAction, TaskContext};

/// Waits for a fixed time. Returns early, successfully, if the build is cancelled.
pub struct SleepAction {
    duration: Duration,
}

impl SleepAction {
    pub fn new(millis: u64) -> Self {
        Self {
            duration: Duration::from_millis(millis),
        }
    }
}

#[async_trait]
impl TaskAction for SleepAction {
    fn describe(&self) -> String {
        format!("sleep {}ms", self.duration.as_millis())
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<()> {
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => {}
            _ = ctx.cancel.cancelled() => {
                tracing::debug!(task = %ctx.path, "sleep interrupted by cancellation");
            }
        }
        Ok(())
    }
}

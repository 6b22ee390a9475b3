use anyhow::Result;
use async_trait::async_trait;
use kiln_core::api::{TaskAction, TaskContext};

/// Always fails with the configured message.
pub struct FailAction {
    message: String,
}

impl FailAction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl TaskAction for FailAction {
    fn describe(&self) -> String {
        "fail".to_string()
    }

    async fn execute(&self, _ctx: &TaskContext) -> Result<()> {
        Err(anyhow::anyhow!(self.message.clone()))
    }
}

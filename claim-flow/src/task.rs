use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{context::Context, error::Result};

/// Result of a task execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Next action to take
    pub next_action: NextAction,
    /// Short human readable description of what the task did
    pub status_message: Option<String>,
}

impl TaskResult {
    pub fn new_with_status(next_action: NextAction, status_message: impl Into<String>) -> Self {
        Self {
            next_action,
            status_message: Some(status_message.into()),
        }
    }
}

/// Defines what should happen after a task completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Follow the outgoing edges of the task
    Continue,
    /// Jump to a specific task by ID
    GoTo(String),
    /// Stop the graph execution
    End,
}

/// Core trait that all pipeline steps implement
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique identifier for this task
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Execute the task with the given context
    async fn run(&self, context: Context) -> Result<TaskResult>;
}

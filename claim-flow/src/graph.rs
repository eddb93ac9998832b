use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    context::Context,
    error::{FlowError, Result},
    task::{NextAction, Task},
};

/// Default bound on how many tasks a single execution may run.
pub const DEFAULT_MAX_STEPS: usize = 64;

/// Type alias for edge condition functions
pub type EdgeCondition = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Edge between tasks in the graph
#[derive(Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub condition: Option<EdgeCondition>,
}

/// A graph of tasks that is executed front to back against a shared [`Context`]
pub struct Graph {
    pub id: String,
    tasks: DashMap<String, Arc<dyn Task>>,
    edges: Vec<Edge>,
    start_task_id: Option<String>,
    max_steps: usize,
}

/// One executed step of a graph run
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub task_id: String,
    pub status_message: Option<String>,
}

/// Trail of a completed graph run
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    pub steps: Vec<StepRecord>,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: DashMap::new(),
            edges: Vec::new(),
            start_task_id: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Run the graph from its start task until a task ends it or no edge applies.
    pub async fn execute(&self, context: Context) -> Result<ExecutionSummary> {
        let mut summary = ExecutionSummary::default();
        let Some(mut current) = self.start_task_id.clone() else {
            return Ok(summary);
        };

        loop {
            if summary.steps.len() >= self.max_steps {
                return Err(FlowError::StepLimitExceeded(self.max_steps));
            }

            let task = self
                .get_task(&current)
                .ok_or_else(|| FlowError::TaskNotFound(current.clone()))?;

            debug!(graph_id = %self.id, task_id = %current, "Running task");
            let result = task.run(context.clone()).await?;

            summary.steps.push(StepRecord {
                task_id: current.clone(),
                status_message: result.status_message,
            });

            match result.next_action {
                NextAction::End => break,
                NextAction::GoTo(target_id) => {
                    if !self.tasks.contains_key(&target_id) {
                        return Err(FlowError::TaskNotFound(target_id));
                    }
                    current = target_id;
                }
                NextAction::Continue => match self.find_next_task(&current, &context) {
                    Some(next) => current = next,
                    None => break,
                },
            }
        }

        Ok(summary)
    }

    /// Find the next task based on edges and conditions; the first matching edge wins.
    pub fn find_next_task(&self, current_task_id: &str, context: &Context) -> Option<String> {
        self.edges
            .iter()
            .filter(|edge| edge.from == current_task_id)
            .find(|edge| edge.condition.as_ref().is_none_or(|condition| condition(context)))
            .map(|edge| edge.to.clone())
    }

    pub fn get_task(&self, task_id: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(task_id).map(|entry| entry.clone())
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(id),
        }
    }

    /// Add a task; the first task added becomes the start task.
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let task_id = task.id().to_string();
        if self.graph.tasks.is_empty() {
            self.graph.start_task_id = Some(task_id.clone());
        }
        self.graph.tasks.insert(task_id, task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: None,
        });
        self
    }

    pub fn add_conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        condition: F,
    ) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.graph.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: Some(Arc::new(condition)),
        });
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.graph.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

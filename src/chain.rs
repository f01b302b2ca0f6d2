//! Dependency chaining of recurring task instances.
//!
//! Each instance depends on the task created just before it. The id of that
//! task only exists once the server has answered, so links are assigned one
//! at a time while the chain is submitted:
//!
//! ```text
//! AwaitingPredecessor --link--> Submitted --record(id)--> Linked --link--> Submitted ...
//! ```

use crate::error::ChainError;
use crate::task::{TaskId, TaskInstance};

/// Where the chain currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainState {
    /// Nothing submitted yet; the next instance depends on `cursor`.
    AwaitingPredecessor { cursor: Option<TaskId> },
    /// `occurrence` was handed out and its creation is in flight.
    Submitted { cursor: Option<TaskId>, occurrence: u32 },
    /// The last submitted instance was created as `last`.
    Linked { last: TaskId },
}

impl ChainState {
    fn name(&self) -> &'static str {
        match self {
            ChainState::AwaitingPredecessor { .. } => "awaiting-predecessor",
            ChainState::Submitted { .. } => "submitted",
            ChainState::Linked { .. } => "linked",
        }
    }
}

/// Linear chain of predecessor links for a single submission.
#[derive(Debug, Clone)]
pub struct DependencyChain {
    state: ChainState,
    linked: Vec<TaskId>,
}

impl DependencyChain {
    /// Start a chain whose head depends on `initial` (usually `None`).
    pub fn new(initial: Option<TaskId>) -> Self {
        Self {
            state: ChainState::AwaitingPredecessor { cursor: initial },
            linked: Vec::new(),
        }
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Ids recorded so far, in chain order.
    pub fn linked(&self) -> &[TaskId] {
        &self.linked
    }

    pub fn into_linked(self) -> Vec<TaskId> {
        self.linked
    }

    /// Id the next linked instance will depend on.
    pub fn cursor(&self) -> Option<&TaskId> {
        match &self.state {
            ChainState::AwaitingPredecessor { cursor } | ChainState::Submitted { cursor, .. } => {
                cursor.as_ref()
            }
            ChainState::Linked { last } => Some(last),
        }
    }

    /// Point `instance` at the current predecessor and mark it in flight.
    pub fn link(&mut self, mut instance: TaskInstance) -> Result<TaskInstance, ChainError> {
        let cursor = match &self.state {
            ChainState::AwaitingPredecessor { cursor } => cursor.clone(),
            ChainState::Linked { last } => Some(last.clone()),
            state @ ChainState::Submitted { .. } => {
                return Err(ChainError::InvalidTransition {
                    action: "link",
                    state: state.name(),
                })
            }
        };
        instance.dependent_task_id = cursor.clone();
        self.state = ChainState::Submitted {
            cursor,
            occurrence: instance.occurrence,
        };
        Ok(instance)
    }

    /// Record the server id of the in-flight instance.
    pub fn record(&mut self, id: TaskId) -> Result<(), ChainError> {
        if !matches!(self.state, ChainState::Submitted { .. }) {
            return Err(ChainError::InvalidTransition {
                action: "record",
                state: self.state.name(),
            });
        }
        self.linked.push(id.clone());
        self.state = ChainState::Linked { last: id };
        Ok(())
    }
}

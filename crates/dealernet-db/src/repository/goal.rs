//! # Goal Repository
//!
//! Goals are keyed by `{month}-{entityId}-{type}`, so setting a goal twice
//! replaces the earlier target.

use tracing::debug;

use dealernet_core::Goal;

use crate::document::{Collection, DocumentStore};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct GoalRepository {
    store: DocumentStore,
}

impl GoalRepository {
    pub fn new(store: DocumentStore) -> Self {
        GoalRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Goal>> {
        self.store.get_all(Collection::Goals).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Goal>> {
        self.store.get(Collection::Goals, id).await
    }

    /// Creates or replaces a goal.
    pub async fn set(&self, goal: &Goal) -> DbResult<()> {
        debug!(id = %goal.id, target = goal.target, "Setting goal");
        self.store.set(Collection::Goals, &goal.id, goal).await
    }
}

//! # User Repository

use tracing::debug;

use dealernet_core::{CoreError, User};

use crate::document::{Collection, DocumentStore, WriteBatch};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct UserRepository {
    store: DocumentStore,
}

impl UserRepository {
    pub fn new(store: DocumentStore) -> Self {
        UserRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        self.store.get_all(Collection::Users).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<User>> {
        self.store.get(Collection::Users, id).await
    }

    /// Like [`get`](Self::get), but a missing user is an error.
    pub async fn require(&self, id: &str) -> DbResult<User> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(id.to_string()).into())
    }

    /// Stores a new user. Fails if the id is taken.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = ?user.role, "Inserting user");
        let mut batch = WriteBatch::new();
        batch.insert(Collection::Users, &user.id, user)?;
        self.store.commit(batch).await
    }

    /// Removes the user. Sales and goals that reference them stay behind.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        if !self.store.delete(Collection::Users, id).await? {
            return Err(CoreError::UserNotFound(id.to_string()).into());
        }
        debug!(id = %id, "User deleted");
        Ok(())
    }
}

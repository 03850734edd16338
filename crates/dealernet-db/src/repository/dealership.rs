//! # Dealership Repository

use tracing::debug;

use dealernet_core::{CoreError, Dealership};

use crate::document::{Collection, DocumentStore, WriteBatch};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct DealershipRepository {
    store: DocumentStore,
}

impl DealershipRepository {
    pub fn new(store: DocumentStore) -> Self {
        DealershipRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Dealership>> {
        self.store.get_all(Collection::Dealerships).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Dealership>> {
        self.store.get(Collection::Dealerships, id).await
    }

    pub async fn require(&self, id: &str) -> DbResult<Dealership> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::DealershipNotFound(id.to_string()).into())
    }

    pub async fn insert(&self, dealership: &Dealership) -> DbResult<()> {
        debug!(id = %dealership.id, name = %dealership.name, "Inserting dealership");
        let mut batch = WriteBatch::new();
        batch.insert(Collection::Dealerships, &dealership.id, dealership)?;
        self.store.commit(batch).await
    }

    /// Removes the dealership. Its staff, vehicles and sales are untouched.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        if !self.store.delete(Collection::Dealerships, id).await? {
            return Err(CoreError::DealershipNotFound(id.to_string()).into());
        }
        debug!(id = %id, "Dealership deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::{database, dealership};

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let db = database().await;
        db.dealerships().insert(&dealership("d-2", "Alberta")).await.unwrap();
        db.dealerships().insert(&dealership("d-1", "Ontario")).await.unwrap();

        let ids: Vec<String> = db
            .dealerships()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["d-1", "d-2"]);

        assert!(matches!(
            db.dealerships().require("d-9").await,
            Err(DbError::Core(CoreError::DealershipNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = database().await;
        db.dealerships().insert(&dealership("d-1", "Ontario")).await.unwrap();

        db.dealerships().delete("d-1").await.unwrap();
        assert!(db.dealerships().list().await.unwrap().is_empty());
        assert!(matches!(
            db.dealerships().delete("d-1").await,
            Err(DbError::Core(CoreError::DealershipNotFound(_)))
        ));
    }
}

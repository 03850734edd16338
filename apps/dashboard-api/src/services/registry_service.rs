//! Users, dealerships and monthly goals.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use dealernet_core::registry::{
    authorize_goal, authorize_removal, authorize_user_creation, create_dealership, create_goal,
    create_user, NewDealership, NewGoal, NewUser,
};
use dealernet_core::{CoreError, Dealership, Goal, User};

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::services::caller_user;
use crate::AppState;

/// Body of `deleteUser`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    pub user_id: String,
}

/// Body of `removeDealership`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDealershipRequest {
    pub dealership_id: String,
}

/// Registry service implementation.
pub struct RegistryService {
    state: Arc<AppState>,
}

impl RegistryService {
    pub fn new(state: Arc<AppState>) -> Self {
        RegistryService { state }
    }

    pub async fn create_user(&self, caller: &Caller, input: &NewUser) -> ApiResult<User> {
        let actor = caller_user(&self.state.db, caller).await?;
        authorize_user_creation(&actor, input)?;

        if let Some(dealership_id) = input.dealership_id.as_deref().filter(|id| !id.trim().is_empty()) {
            self.state.db.dealerships().require(dealership_id.trim()).await?;
        }

        let user = create_user(input)?;
        self.state.db.users().insert(&user).await?;

        info!(user_id = %user.id, role = ?user.role, created_by = %actor.id, "User created");
        Ok(user)
    }

    pub async fn add_dealership(&self, caller: &Caller, input: &NewDealership) -> ApiResult<Dealership> {
        let actor = caller_user(&self.state.db, caller).await?;
        let dealership = create_dealership(&actor, input)?;
        self.state.db.dealerships().insert(&dealership).await?;

        info!(dealership_id = %dealership.id, name = %dealership.name, "Dealership added");
        Ok(dealership)
    }

    /// Deletes the user document and returns what was removed.
    pub async fn delete_user(&self, caller: &Caller, request: &DeleteUserRequest) -> ApiResult<User> {
        let actor = caller_user(&self.state.db, caller).await?;
        authorize_removal(&actor, "delete users")?;

        let users = self.state.db.users();
        let user = users.require(&request.user_id).await?;
        users.delete(&user.id).await?;

        info!(user_id = %user.id, deleted_by = %actor.id, "User deleted");
        Ok(user)
    }

    /// Deletes the dealership document and returns what was removed.
    pub async fn remove_dealership(
        &self,
        caller: &Caller,
        request: &RemoveDealershipRequest,
    ) -> ApiResult<Dealership> {
        let actor = caller_user(&self.state.db, caller).await?;
        authorize_removal(&actor, "remove dealerships")?;

        let dealerships = self.state.db.dealerships();
        let dealership = dealerships.require(&request.dealership_id).await?;
        dealerships.delete(&dealership.id).await?;

        info!(dealership_id = %dealership.id, removed_by = %actor.id, "Dealership removed");
        Ok(dealership)
    }

    /// Creates or replaces the goal keyed by month, entity and type.
    pub async fn set_goal(&self, caller: &Caller, input: &NewGoal) -> ApiResult<Goal> {
        let actor = caller_user(&self.state.db, caller).await?;
        let entity_dealership = self.entity_dealership(&input.entity_id).await?;
        authorize_goal(&actor, entity_dealership.as_deref())?;

        let goal = create_goal(input)?;
        self.state.db.goals().set(&goal).await?;
        Ok(goal)
    }

    /// The dealership a goal's entity belongs to. Entity ids name either a
    /// dealership or a user.
    async fn entity_dealership(&self, entity_id: &str) -> ApiResult<Option<String>> {
        if let Some(dealership) = self.state.db.dealerships().get(entity_id).await? {
            return Ok(Some(dealership.id));
        }
        match self.state.db.users().get(entity_id).await? {
            Some(user) => Ok(user.dealership_id),
            None => Err(CoreError::UserNotFound(entity_id.to_string()).into()),
        }
    }
}

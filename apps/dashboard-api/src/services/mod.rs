//! Service implementations behind the HTTP routes.
//!
//! Each service loads what it needs from [`dealernet_db`], applies the
//! rules from [`dealernet_core`], and returns wire-ready values. Handlers in
//! [`crate::routes`] only extract, call, and wrap.

pub mod forecast_service;
pub mod health_service;
pub mod inventory_service;
pub mod metrics_service;
pub mod registry_service;
pub mod report_service;
pub mod transfer_service;

use dealernet_core::User;
use dealernet_db::Database;

use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};

/// Loads the caller's user record. An authenticated caller without one may
/// not act on anything.
pub(crate) async fn caller_user(db: &Database, caller: &Caller) -> ApiResult<User> {
    db.users().get(&caller.user_id).await?.ok_or_else(|| {
        ApiError::PermissionDenied(format!("User {} has no profile", caller.user_id))
    })
}

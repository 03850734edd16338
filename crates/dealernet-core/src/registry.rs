//! # Registry
//!
//! Creation and removal rules for users, dealerships and monthly goals.
//!
//! ## Who May Do What
//! ```text
//! ┌──────────────────┬──────────────────────────┬──────────────────────────┐
//! │ Action           │ Factory                  │ DealershipAdmin          │
//! ├──────────────────┼──────────────────────────┼──────────────────────────┤
//! │ add dealership   │ yes                      │ no                       │
//! │ remove dealer    │ yes                      │ no                       │
//! │ delete user      │ yes                      │ no                       │
//! │ create user      │ any role                 │ salespeople, own dealer  │
//! │ set goal         │ any entity               │ own dealer + its staff   │
//! └──────────────────┴──────────────────────────┴──────────────────────────┘
//! ```
//! Salespeople manage nothing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Coords, Dealership, Goal, GoalType, Role, User};
use crate::validation::{validate_commission_rate, validate_goal_target, validate_month, validate_name};
use crate::DEFAULT_COMMISSION_RATE_BPS;

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Identity-provider id. Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub dealership_id: Option<String>,
    #[serde(default)]
    pub commission_rate_bps: Option<u32>,
}

/// Checks that `actor` may create `input`.
pub fn authorize_user_creation(actor: &User, input: &NewUser) -> CoreResult<()> {
    let allowed = match actor.role {
        Role::Factory => true,
        Role::DealershipAdmin => {
            input.role == Role::Salesperson
                && input.dealership_id.is_some()
                && input.dealership_id == actor.dealership_id
        }
        Role::Salesperson => false,
    };
    if !allowed {
        return Err(CoreError::not_authorized(&actor.id, "create this user"));
    }
    Ok(())
}

/// Builds a user. Salespeople get the default commission rate unless one is
/// given; other roles carry no rate.
pub fn create_user(input: &NewUser) -> CoreResult<User> {
    validate_name("username", &input.username)?;
    validate_name("name", &input.name)?;

    let dealership_id = input
        .dealership_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    if input.role.requires_dealership() && dealership_id.is_none() {
        return Err(ValidationError::required("dealershipId").into());
    }

    let commission_rate_bps = match input.role {
        Role::Salesperson => {
            let bps = input.commission_rate_bps.unwrap_or(DEFAULT_COMMISSION_RATE_BPS);
            validate_commission_rate(bps)?;
            Some(bps)
        }
        _ => None,
    };

    Ok(User {
        id: input
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        username: input.username.trim().to_string(),
        name: input.name.trim().to_string(),
        role: input.role,
        dealership_id: match input.role {
            Role::Factory => None,
            _ => dealership_id.map(str::to_string),
        },
        commission_rate_bps,
    })
}

// =============================================================================
// Dealerships
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewDealership {
    pub name: String,
    pub city: String,
    pub province: String,
    #[serde(default)]
    pub coords: Option<Coords>,
}

pub fn create_dealership(actor: &User, input: &NewDealership) -> CoreResult<Dealership> {
    if actor.role != Role::Factory {
        return Err(CoreError::not_authorized(&actor.id, "add dealerships"));
    }
    validate_name("name", &input.name)?;
    validate_name("city", &input.city)?;
    validate_name("province", &input.province)?;

    Ok(Dealership {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        city: input.city.trim().to_string(),
        province: input.province.trim().to_string(),
        coords: input.coords.unwrap_or_default(),
    })
}

// =============================================================================
// Goals
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub entity_id: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub target: i64,
    pub month: String,
}

/// `entity_dealership` is the dealership the goal's entity belongs to: the
/// dealership itself, or the user's dealership.
pub fn authorize_goal(actor: &User, entity_dealership: Option<&str>) -> CoreResult<()> {
    let allowed = match actor.role {
        Role::Factory => true,
        Role::DealershipAdmin => entity_dealership.is_some_and(|id| actor.is_admin_of(id)),
        Role::Salesperson => false,
    };
    if !allowed {
        return Err(CoreError::not_authorized(&actor.id, "set this goal"));
    }
    Ok(())
}

/// Builds a goal keyed by month, entity and type. Setting the same key again
/// replaces the previous target.
pub fn create_goal(input: &NewGoal) -> CoreResult<Goal> {
    validate_name("entityId", &input.entity_id)?;
    validate_month(&input.month)?;
    validate_goal_target(input.target)?;

    Ok(Goal {
        id: Goal::document_id(&input.month, &input.entity_id, input.goal_type),
        entity_id: input.entity_id.clone(),
        goal_type: input.goal_type,
        target: input.target,
        month: input.month.clone(),
    })
}

// =============================================================================
// Removal
// =============================================================================

/// Only the factory removes users and dealerships. Nothing cascades: sales,
/// vehicles and goals that point at the removed document stay, and the
/// dashboard join drops the sales that no longer resolve.
pub fn authorize_removal(actor: &User, action: &str) -> CoreResult<()> {
    if actor.role != Role::Factory {
        return Err(CoreError::not_authorized(&actor.id, action));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

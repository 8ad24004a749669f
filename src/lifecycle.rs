//! Admin-driven activation and deactivation of accounts.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::{Status, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activate,
    Deactivate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("User is already active.")]
    AlreadyActive,
    #[error("User is already inactive.")]
    AlreadyInactive,
    #[error("You cannot deactivate your own account.")]
    SelfDeactivation,
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl Transition {
    pub fn target_status(self) -> Status {
        match self {
            Transition::Activate => Status::Active,
            Transition::Deactivate => Status::Inactive,
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Transition::Activate => "activated",
            Transition::Deactivate => "deactivated",
        }
    }

    fn already(self) -> LifecycleError {
        match self {
            Transition::Activate => LifecycleError::AlreadyActive,
            Transition::Deactivate => LifecycleError::AlreadyInactive,
        }
    }

    /// Decides whether `actor` may move `target` to the new status.
    /// Self-deactivation is refused before the current status is looked at.
    pub fn plan(self, actor: Uuid, target: &User) -> Result<Status, LifecycleError> {
        if self == Transition::Deactivate && actor == target.id {
            return Err(LifecycleError::SelfDeactivation);
        }
        let next = self.target_status();
        if target.status == next {
            return Err(self.already());
        }
        Ok(next)
    }
}

/// Loads the target, validates the transition and persists it.
pub async fn apply(
    pool: &PgPool,
    actor: Uuid,
    target_id: Uuid,
    transition: Transition,
) -> Result<User, AppError> {
    let target = db::users::find_by_id(pool, target_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let next = transition.plan(actor, &target)?;

    // Conditional update: a concurrent identical transition leaves zero rows.
    let updated = db::users::transition_status(pool, target.id, next)
        .await?
        .ok_or(transition.already())?;

    tracing::info!(
        actor = %actor,
        user_id = %updated.id,
        status = updated.status.as_str(),
        "account status changed"
    );
    Ok(updated)
}

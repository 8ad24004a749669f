//! Access predicates over an authenticated principal.
//!
//! Each endpoint lists the permissions it needs; they are checked in order and
//! the first one that fails decides the response.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;

pub const INACTIVE: &str = "Your account is inactive. Please contact an administrator.";
pub const NOT_ADMIN: &str = "You must be an admin to perform this action.";
pub const NOT_OWNER: &str = "You do not have permission to access this resource.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Active,
    Admin,
    /// The principal owns the resource (its id equals the owner id) or is an admin.
    OwnerOrAdmin(Uuid),
}

impl Permission {
    pub fn allows(self, principal: &User) -> bool {
        match self {
            Permission::Active => principal.is_active(),
            Permission::Admin => principal.is_admin(),
            Permission::OwnerOrAdmin(owner) => principal.is_admin() || principal.id == owner,
        }
    }

    pub fn denial(self) -> &'static str {
        match self {
            Permission::Active => INACTIVE,
            Permission::Admin => NOT_ADMIN,
            Permission::OwnerOrAdmin(_) => NOT_OWNER,
        }
    }
}

pub fn enforce(principal: &User, permissions: &[Permission]) -> Result<(), AppError> {
    match permissions.iter().find(|p| !p.allows(principal)) {
        Some(denied) => Err(AppError::Forbidden(denied.denial().to_string())),
        None => Ok(()),
    }
}

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::validation::PasswordPolicy;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub password_policy: Arc<dyn PasswordPolicy>,
}

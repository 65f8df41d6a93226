//! The admin sub-router (§6): login plus the account-pool mutators, guarded
//! by a JWT issued against `ADMIN_USERNAME`/`ADMIN_PASSWORD`. Everything
//! beyond this thin credential check (an admin UI, richer audit logging) is
//! out of scope.

pub mod auth;
pub mod handlers;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(handlers::login))
        .route("/admin/accounts", get(handlers::list_accounts).post(handlers::add_account))
        .route("/admin/accounts/{email}", delete(handlers::delete_account))
        .route("/admin/accounts/{email}/revalidate", post(handlers::revalidate_account))
        .route("/admin/reset-cooldowns", post(handlers::reset_cooldowns))
        .route("/admin/clear-caches", post(handlers::clear_caches))
}

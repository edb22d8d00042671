mod dto;
mod error;
pub mod handlers;
mod memory;
mod repo;
pub mod repo_types;
mod seed;
mod services;
mod stats;

use crate::state::AppState;
use axum::Router;

pub use memory::MemoryMealStore;
pub use repo::{MealStore, PgMealStore};
pub use seed::seed_if_empty;
pub use services::MealManager;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}

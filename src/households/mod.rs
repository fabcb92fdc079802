pub mod cache;
mod dto;
pub mod handlers;
mod repo;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/households",
            get(handlers::list_households)
                .post(handlers::create_household)
                .patch(handlers::update_household),
        )
        .route("/households/me", get(handlers::get_my_household))
        .route("/households/check", get(handlers::check_household))
        .route("/households/leave", post(handlers::leave_household))
        .route("/households/:id/members", get(handlers::get_household_members))
        .route("/households/:id/join", post(handlers::join_household))
}

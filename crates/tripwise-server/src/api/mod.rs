pub mod conversations;
pub mod health;
pub mod messages;

use axum::Router;

use crate::state::AppState;

pub fn api_routes(state: AppState) -> Router {
    Router::new().nest(
        "/api",
        health::routes()
            .merge(conversations::routes())
            .merge(messages::routes())
            .with_state(state),
    )
}

mod admin;
mod public;

use axum::Router;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(public::routes())
        .nest("/admin", admin::routes())
}

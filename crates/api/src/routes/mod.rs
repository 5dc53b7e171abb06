//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod assets;
pub mod health;
pub mod materials;
pub mod products;
pub mod quotes;
pub mod vat_rates;


/// Creates the API router: `/health` is public, everything else needs a
/// bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(vat_rates::routes())
        .merge(products::routes())
        .merge(assets::routes())
        .merge(materials::routes())
        .merge(quotes::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

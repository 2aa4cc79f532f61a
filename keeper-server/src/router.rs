//! The fixed URL map of §6, wired to the handlers in [`crate::handlers`].
//! Every `/api/data/*` route sits behind [`crate::auth::require_token`];
//! registration is the sole unauthenticated endpoint.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use keeper_store::RemoteStore;
use keeper_wire::endpoints;
use tower_http::trace::TraceLayer;

use crate::auth::require_token;
use crate::handlers;
use crate::state::AppState;

pub fn router<R: RemoteStore + 'static>(state: Arc<AppState<R>>) -> Router {
    let protected = Router::new()
        .route(
            endpoints::DATA_BINARY,
            put(handlers::update_record::<R>)
                .post(handlers::create_record::<R>)
                .get(handlers::load_record::<R>)
                .delete(handlers::delete_record::<R>),
        )
        .route(endpoints::DATA_BINARIES, get(handlers::list_records::<R>))
        .route(
            endpoints::DATA_WALLET,
            put(handlers::create_card::<R>).delete(handlers::delete_card::<R>),
        )
        .route(endpoints::DATA_WALLETS, get(handlers::list_cards::<R>))
        .route(
            endpoints::DATA_SECRET,
            put(handlers::create_secret::<R>)
                .get(handlers::get_secret::<R>)
                .delete(handlers::delete_secret::<R>),
        )
        .route(endpoints::DATA_SECRETS, get(handlers::list_secrets::<R>))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token::<R>));

    Router::new()
        .route(endpoints::REGISTER, put(handlers::register::<R>))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

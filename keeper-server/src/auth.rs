//! Auth middleware (§4.5). Resolves the `token` header to a login and hands
//! handlers an explicit [`Principal`] extractor -- the §9 "Ambient request
//! identity" redesign flag applied: no stringly-typed context lookup,
//! handlers never re-read credentials.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use keeper_store::RemoteStore;
use keeper_wire::dto::HEADER_TOKEN;

use crate::error::ServerError;
use crate::state::AppState;

/// The authenticated identity attached to a request after the token
/// resolves. Consumed via `Extension<Principal>` -- handlers never touch
/// headers directly once past this middleware.
#[derive(Debug, Clone)]
pub struct Principal {
    pub login: String,
}

pub async fn require_token<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = req
        .headers()
        .get(HEADER_TOKEN)
        .ok_or(ServerError::BadRequest)?
        .to_str()
        .map_err(|_| ServerError::BadRequest)?
        .to_string();

    let login = state
        .store
        .resolve_token(&token)
        .await
        .map_err(ServerError::from)?;

    req.extensions_mut().insert(Principal { login });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use keeper_store::MemoryRemoteStore;
    use tower::ServiceExt;

    use crate::token::TokenMinter;

    fn app() -> (Router, Arc<AppState<MemoryRemoteStore>>) {
        let store = Arc::new(MemoryRemoteStore::new());
        let state = Arc::new(AppState::new(store, TokenMinter::new(&[1u8; 16]).unwrap()));

        let router = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
            .with_state(state.clone());

        (router, state)
    }

    #[tokio::test]
    async fn missing_token_is_bad_request() {
        let (app, _state) = app();
        let response = app
            .oneshot(Request::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let (app, _state) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("token", "nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn known_token_reaches_handler() {
        let (app, state) = app();
        state.store.register("alice", "pw-ct", "tok-1").await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .header("token", "tok-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

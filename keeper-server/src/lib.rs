//! The server half of the protocol (§4.3/§4.5/§6): axum handlers and auth
//! middleware over a [`keeper_store::RemoteStore`]. Generic over the store
//! implementation so the same router runs against `PgRemoteStore` in
//! production and `MemoryRemoteStore` in tests.

mod auth;
mod error;
mod handlers;
mod router;
mod state;
mod token;

pub use auth::Principal;
pub use error::{ErrorResponse, ServerError};
pub use router::router;
pub use state::AppState;
pub use token::TokenMinter;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use keeper_store::MemoryRemoteStore;
    use keeper_wire::{endpoints, dto::HEADER_TOKEN, RegisterResponse};
    use tower::ServiceExt;

    use super::*;

    fn test_state() -> Arc<AppState<MemoryRemoteStore>> {
        Arc::new(AppState::new(
            Arc::new(MemoryRemoteStore::new()),
            TokenMinter::new(&[5u8; 16]).unwrap(),
        ))
    }

    async fn register(app: &mut axum::Router, login: &str, password: &str) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(endpoints::REGISTER)
                    .header("login", login)
                    .header("password", password)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: RegisterResponse = serde_json::from_slice(&body).unwrap();
        parsed.token
    }

    #[tokio::test]
    async fn register_twice_returns_identical_token() {
        let state = test_state();
        let mut app = router(state);

        let first = register(&mut app, "alice", "pw-ct").await;
        let second = register(&mut app, "alice", "pw-ct").await;
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[tokio::test]
    async fn create_then_get_record_round_trips() {
        let state = test_state();
        let mut app = router(state);
        let token = register(&mut app, "alice", "pw-ct").await;

        let create = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(endpoints::DATA_BINARY)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, &token)
                    .body(Body::from(r#"{"key":"note","data":"ct-a"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(create.status(), StatusCode::OK);

        let get = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(endpoints::DATA_BINARY)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, &token)
                    .body(Body::from(r#"{"key":"note"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(get.status(), StatusCode::OK);

        let body = to_bytes(get.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, r#"{"key":"note","data":"ct-a","revision":1}"#.as_bytes());
    }

    #[tokio::test]
    async fn update_with_stale_revision_is_conflict() {
        let state = test_state();
        let mut app = router(state);
        let token = register(&mut app, "alice", "pw-ct").await;

        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(endpoints::DATA_BINARY)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, &token)
                    .body(Body::from(r#"{"key":"note","data":"ct-a"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let stale = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(endpoints::DATA_BINARY)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, &token)
                    .body(Body::from(r#"{"key":"note","data":"ct-b","revision":2}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(stale.status(), StatusCode::CONFLICT);

        let correct = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(endpoints::DATA_BINARY)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, &token)
                    .body(Body::from(r#"{"key":"note","data":"ct-b","revision":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(correct.status(), StatusCode::OK);

        // The server-observed revision must have advanced -- a successful
        // update is never a same-revision no-op on the wire.
        let get = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(endpoints::DATA_BINARY)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, &token)
                    .body(Body::from(r#"{"key":"note"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(get.status(), StatusCode::OK);
        let body = to_bytes(get.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, r#"{"key":"note","data":"ct-b","revision":2}"#.as_bytes());
    }

    #[tokio::test]
    async fn repeated_update_revision_is_strictly_increasing() {
        let state = test_state();
        let mut app = router(state);
        let token = register(&mut app, "alice", "pw-ct").await;

        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(endpoints::DATA_BINARY)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, &token)
                    .body(Body::from(r#"{"key":"note","data":"ct-a"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let update = |revision: u64, data: &str| {
            Request::builder()
                .method("PUT")
                .uri(endpoints::DATA_BINARY)
                .header("content-type", "application/json")
                .header(HEADER_TOKEN, &token)
                .body(Body::from(format!(
                    r#"{{"key":"note","data":"{data}","revision":{revision}}}"#
                )))
                .unwrap()
        };

        let first = app.clone().oneshot(update(1, "ct-b")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.clone().oneshot(update(2, "ct-c")).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);

        // Sending the now-stale revision 2 again must be rejected: the
        // server has already advanced past it.
        let stale_again = app.oneshot(update(2, "ct-d")).await.unwrap();
        assert_eq!(stale_again.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unauthorized_token_is_rejected() {
        let state = test_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(endpoints::DATA_BINARY)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, "nope")
                    .body(Body::from(r#"{"key":"note"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_collision_is_conflict() {
        let state = test_state();
        let mut app = router(state);
        let token = register(&mut app, "alice", "pw-ct").await;

        let make_create = || {
            Request::builder()
                .method("POST")
                .uri(endpoints::DATA_BINARY)
                .header("content-type", "application/json")
                .header(HEADER_TOKEN, &token)
                .body(Body::from(r#"{"key":"note","data":"ct-a"}"#))
                .unwrap()
        };

        app.clone().oneshot(make_create()).await.unwrap();
        let second = app.oneshot(make_create()).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn wallet_create_then_list_round_trips() {
        let state = test_state();
        let mut app = router(state);
        let token = register(&mut app, "alice", "pw-ct").await;

        app.clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(endpoints::DATA_WALLET)
                    .header("content-type", "application/json")
                    .header(HEADER_TOKEN, &token)
                    .body(Body::from(r#"{"number":"1234123412341234","data":"ct"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let list = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(endpoints::DATA_WALLETS)
                    .header(HEADER_TOKEN, &token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(list.status(), StatusCode::OK);

        let body = to_bytes(list.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            body,
            r#"{"cards":[{"number":"1234123412341234","data":"ct"}]}"#.as_bytes()
        );
    }
}

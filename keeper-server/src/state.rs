//! Shared axum state: the remote store and the token minter, generic over
//! the `RemoteStore` implementation so tests can swap in
//! `keeper_store::MemoryRemoteStore` for `PgRemoteStore`.

use std::sync::Arc;

use keeper_store::RemoteStore;

use crate::token::TokenMinter;

pub struct AppState<R: RemoteStore> {
    pub store: Arc<R>,
    pub token_minter: TokenMinter,
}

impl<R: RemoteStore> AppState<R> {
    pub fn new(store: Arc<R>, token_minter: TokenMinter) -> Self {
        Self { store, token_minter }
    }
}

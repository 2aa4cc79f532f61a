//! Handlers for every endpoint in §6. Each one calls exactly one
//! `RemoteStore` operation and translates its result into the wire DTOs of
//! `keeper-wire`; none of them read headers directly -- the register
//! handler is the sole exception, since it's the one endpoint the auth
//! middleware never runs for.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use keeper_domain::{Card, Record, StoredSecret};
use keeper_store::RemoteStore;
use keeper_wire::{
    dto::{HEADER_LOGIN, HEADER_PASSWORD},
    CardCreateRequest, CardDeleteRequest, CardListResponse, CardResponse, RecordDeleteRequest,
    RecordGetRequest, RecordGetResponse, RecordListResponse, RecordSaveRequest,
    RecordUpdateRequest, RegisterResponse, SecretCreateRequest, SecretDeleteRequest,
    SecretGetRequest, SecretGetResponse, SecretListResponse,
};

use crate::auth::Principal;
use crate::error::ServerError;
use crate::state::AppState;

fn header(headers: &HeaderMap, name: &str) -> Result<String, ServerError> {
    headers
        .get(name)
        .ok_or(ServerError::BadRequest)?
        .to_str()
        .map_err(|_| ServerError::BadRequest)
        .map(ToString::to_string)
}

pub async fn register<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
) -> Result<Json<RegisterResponse>, ServerError> {
    let login = header(&headers, HEADER_LOGIN)?;
    let password = header(&headers, HEADER_PASSWORD)?;

    let token = state
        .token_minter
        .mint(&login, &password)
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    state.store.register(&login, &password, &token).await?;

    Ok(Json(RegisterResponse { token }))
}

// -- Records ------------------------------------------------------------

pub async fn create_record<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<RecordSaveRequest>,
) -> Result<StatusCode, ServerError> {
    let record = Record::new(req.key, req.data);
    state.store.create_record(&principal.login, &record).await?;
    Ok(StatusCode::OK)
}

pub async fn update_record<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<RecordUpdateRequest>,
) -> Result<StatusCode, ServerError> {
    state
        .store
        .update_record(&principal.login, &req.key, &req.data, req.revision)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn load_record<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<RecordGetRequest>,
) -> Result<Json<RecordGetResponse>, ServerError> {
    let record = state.store.load_record(&principal.login, &req.key).await?;
    Ok(Json(RecordGetResponse {
        key: record.name,
        data: record.data,
        revision: record.revision,
    }))
}

pub async fn delete_record<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<RecordDeleteRequest>,
) -> Result<StatusCode, ServerError> {
    state.store.delete_record(&principal.login, &req.key).await?;
    Ok(StatusCode::OK)
}

pub async fn list_records<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<RecordListResponse>, ServerError> {
    let records = state.store.list_records(&principal.login).await?;
    Ok(Json(RecordListResponse {
        data: records
            .into_iter()
            .map(|r| RecordGetResponse {
                key: r.name,
                data: r.data,
                revision: r.revision,
            })
            .collect(),
    }))
}

// -- Cards ----------------------------------------------------------------

pub async fn create_card<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CardCreateRequest>,
) -> Result<StatusCode, ServerError> {
    let card = Card {
        number: req.number,
        data: req.data,
    };
    state.store.create_card(&principal.login, &card).await?;
    Ok(StatusCode::OK)
}

pub async fn delete_card<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CardDeleteRequest>,
) -> Result<StatusCode, ServerError> {
    state.store.delete_card(&principal.login, &req.number).await?;
    Ok(StatusCode::OK)
}

pub async fn list_cards<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<CardListResponse>, ServerError> {
    let cards = state.store.list_cards(&principal.login).await?;
    Ok(Json(CardListResponse {
        cards: cards
            .into_iter()
            .map(|c| CardResponse {
                number: c.number,
                data: c.data,
            })
            .collect(),
    }))
}

// -- Secrets ----------------------------------------------------------------

pub async fn create_secret<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SecretCreateRequest>,
) -> Result<StatusCode, ServerError> {
    let secret = StoredSecret {
        name: req.key,
        data: req.value,
    };
    state.store.create_secret(&principal.login, &secret).await?;
    Ok(StatusCode::OK)
}

pub async fn get_secret<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SecretGetRequest>,
) -> Result<Json<SecretGetResponse>, ServerError> {
    let secret = state.store.get_secret(&principal.login, &req.key).await?;
    Ok(Json(SecretGetResponse {
        key: secret.name,
        data: secret.data,
    }))
}

pub async fn delete_secret<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SecretDeleteRequest>,
) -> Result<StatusCode, ServerError> {
    state.store.delete_secret(&principal.login, &req.key).await?;
    Ok(StatusCode::OK)
}

pub async fn list_secrets<R: RemoteStore + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SecretListResponse>, ServerError> {
    let secrets = state.store.list_secrets(&principal.login).await?;
    Ok(Json(SecretListResponse {
        data: secrets
            .into_iter()
            .map(|s| SecretGetResponse {
                key: s.name,
                data: s.data,
            })
            .collect(),
    }))
}

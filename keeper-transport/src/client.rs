//! The JSON/HTTP client (§4.4): fixed URL map, retry-with-backoff on
//! transport-level failures only, status-to-error translation.

use std::time::Duration;

use keeper_wire::{
    dto::{HEADER_LOGIN, HEADER_PASSWORD, HEADER_TOKEN},
    endpoints, CardCreateRequest, CardDeleteRequest, CardListResponse, CardResponse,
    RecordDeleteRequest, RecordGetRequest, RecordGetResponse, RecordListResponse,
    RecordSaveRequest, RecordUpdateRequest, RegisterResponse, SecretCreateRequest,
    SecretDeleteRequest, SecretGetRequest, SecretGetResponse, SecretListResponse,
};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::warn;

use crate::error::TransportError;

const RETRY_BACKOFF: [Duration; 3] = [
    Duration::from_millis(100),
    Duration::from_millis(300),
    Duration::from_millis(500),
];

/// HTTP client for the Keeper server, addressed by `hostport` (e.g.
/// `http://localhost:8080`).
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(hostport: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: hostport.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Perform one request, retrying up to 4 attempts total on
    /// transport-level failures (connection refused, timeout, DNS) only --
    /// never on a non-2xx response, which is inherently not retriable by
    /// this layer.
    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        login_password: Option<(&str, &str)>,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<reqwest::Response, TransportError> {
        let mut attempt = 0;

        loop {
            let mut req = self.http.request(method.clone(), self.url(path));
            req = req.header("Content-Type", "application/json");

            if let Some(token) = token {
                req = req.header(HEADER_TOKEN, token);
            }
            if let Some((login, password)) = login_password {
                req = req.header(HEADER_LOGIN, login).header(HEADER_PASSWORD, password);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(response) => return Ok(response),
                Err(err) if (err.is_connect() || err.is_timeout()) && attempt < RETRY_BACKOFF.len() => {
                    warn!(attempt, error = %err, "retrying after transport error");
                    tokio::time::sleep(RETRY_BACKOFF[attempt]).await;
                    attempt += 1;
                }
                Err(err) => return Err(TransportError::Network(err)),
            }
        }
    }

    fn translate_status(status: StatusCode) -> Result<(), TransportError> {
        match status {
            StatusCode::OK | StatusCode::ACCEPTED => Ok(()),
            StatusCode::UNAUTHORIZED => Err(TransportError::Unauthorized),
            StatusCode::NOT_FOUND => Err(TransportError::NotFound),
            StatusCode::CONFLICT => Err(TransportError::Conflict),
            other => Err(TransportError::Http(other.as_u16())),
        }
    }

    async fn do_void(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        login_password: Option<(&str, &str)>,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<(), TransportError> {
        let response = self.send(method, path, token, login_password, body).await?;
        Self::translate_status(response.status())
    }

    async fn do_json<R: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<R, TransportError> {
        let response = self.send(method, path, Some(token), None, body).await?;
        Self::translate_status(response.status())?;
        response
            .json::<R>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    pub async fn register(&self, login: &str, password: &str) -> Result<String, TransportError> {
        let response = self
            .send(
                Method::PUT,
                endpoints::REGISTER,
                None,
                Some((login, password)),
                None::<&()>,
            )
            .await?;
        Self::translate_status(response.status())?;
        let parsed: RegisterResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(parsed.token)
    }

    pub async fn create_record(&self, token: &str, key: &str, data: &str) -> Result<(), TransportError> {
        let body = RecordSaveRequest {
            key: key.to_string(),
            data: data.to_string(),
        };
        self.do_void(Method::POST, endpoints::DATA_BINARY, Some(token), None, Some(&body))
            .await
    }

    pub async fn update_record(
        &self,
        token: &str,
        key: &str,
        data: &str,
        revision: u64,
    ) -> Result<(), TransportError> {
        let body = RecordUpdateRequest {
            key: key.to_string(),
            data: data.to_string(),
            revision,
        };
        self.do_void(Method::PUT, endpoints::DATA_BINARY, Some(token), None, Some(&body))
            .await
    }

    pub async fn load_record(&self, token: &str, key: &str) -> Result<RecordGetResponse, TransportError> {
        let body = RecordGetRequest { key: key.to_string() };
        self.do_json(Method::GET, endpoints::DATA_BINARY, token, Some(&body))
            .await
    }

    pub async fn list_records(&self, token: &str) -> Result<Vec<RecordGetResponse>, TransportError> {
        let resp: RecordListResponse = self
            .do_json(Method::GET, endpoints::DATA_BINARIES, token, None::<&()>)
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_record(&self, token: &str, key: &str) -> Result<(), TransportError> {
        let body = RecordDeleteRequest { key: key.to_string() };
        self.do_void(Method::DELETE, endpoints::DATA_BINARY, Some(token), None, Some(&body))
            .await
    }

    pub async fn create_card(&self, token: &str, number: &str, data: &str) -> Result<(), TransportError> {
        let body = CardCreateRequest {
            number: number.to_string(),
            data: data.to_string(),
        };
        self.do_void(Method::PUT, endpoints::DATA_WALLET, Some(token), None, Some(&body))
            .await
    }

    pub async fn delete_card(&self, token: &str, number: &str) -> Result<(), TransportError> {
        let body = CardDeleteRequest { number: number.to_string() };
        self.do_void(Method::DELETE, endpoints::DATA_WALLET, Some(token), None, Some(&body))
            .await
    }

    pub async fn list_cards(&self, token: &str) -> Result<Vec<CardResponse>, TransportError> {
        let resp: CardListResponse = self
            .do_json(Method::GET, endpoints::DATA_WALLETS, token, None::<&()>)
            .await?;
        Ok(resp.cards)
    }

    pub async fn create_secret(&self, token: &str, key: &str, value: &str) -> Result<(), TransportError> {
        let body = SecretCreateRequest {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.do_void(Method::PUT, endpoints::DATA_SECRET, Some(token), None, Some(&body))
            .await
    }

    pub async fn get_secret(&self, token: &str, key: &str) -> Result<SecretGetResponse, TransportError> {
        let body = SecretGetRequest { key: key.to_string() };
        self.do_json(Method::GET, endpoints::DATA_SECRET, token, Some(&body))
            .await
    }

    pub async fn list_secrets(&self, token: &str) -> Result<Vec<SecretGetResponse>, TransportError> {
        let resp: SecretListResponse = self
            .do_json(Method::GET, endpoints::DATA_SECRETS, token, None::<&()>)
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_secret(&self, token: &str, key: &str) -> Result<(), TransportError> {
        let body = SecretDeleteRequest { key: key.to_string() };
        self.do_void(Method::DELETE, endpoints::DATA_SECRET, Some(token), None, Some(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_translation_matches_section_4_4() {
        assert!(Client::translate_status(StatusCode::OK).is_ok());
        assert!(Client::translate_status(StatusCode::ACCEPTED).is_ok());
        assert!(matches!(
            Client::translate_status(StatusCode::UNAUTHORIZED),
            Err(TransportError::Unauthorized)
        ));
        assert!(matches!(
            Client::translate_status(StatusCode::NOT_FOUND),
            Err(TransportError::NotFound)
        ));
        assert!(matches!(
            Client::translate_status(StatusCode::CONFLICT),
            Err(TransportError::Conflict)
        ));
        assert!(matches!(
            Client::translate_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(TransportError::Http(500))
        ));
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = Client::new("http://localhost:8080");
        assert_eq!(client.url(endpoints::REGISTER), "http://localhost:8080/api/user/register");
    }
}

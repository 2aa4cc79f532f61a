//! The server-side remote store: a single PostgreSQL database shared by
//! every client, reached through the [`RemoteStore`] capability trait.
//! Every operation validates the caller's token and runs inside one
//! transaction with a 5-second deadline.

use async_trait::async_trait;
use keeper_domain::{Card, Record, StoredSecret};

use crate::error::StoreError;

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Register a new login, or idempotently re-confirm an existing one
    /// whose stored password matches. Returns the (possibly unchanged) token.
    async fn register(&self, login: &str, password: &str, token: &str) -> Result<(), StoreError>;

    /// Resolve a bearer token to the login it belongs to.
    async fn resolve_token(&self, token: &str) -> Result<String, StoreError>;

    async fn create_record(&self, user: &str, record: &Record) -> Result<(), StoreError>;
    async fn update_record(
        &self,
        user: &str,
        name: &str,
        data: &str,
        client_revision: u64,
    ) -> Result<(), StoreError>;
    async fn load_record(&self, user: &str, name: &str) -> Result<Record, StoreError>;
    async fn list_records(&self, user: &str) -> Result<Vec<Record>, StoreError>;
    async fn delete_record(&self, user: &str, name: &str) -> Result<(), StoreError>;

    async fn create_card(&self, user: &str, card: &Card) -> Result<(), StoreError>;
    async fn list_cards(&self, user: &str) -> Result<Vec<Card>, StoreError>;
    async fn delete_card(&self, user: &str, number: &str) -> Result<(), StoreError>;

    async fn create_secret(&self, user: &str, secret: &StoredSecret) -> Result<(), StoreError>;
    async fn get_secret(&self, user: &str, name: &str) -> Result<StoredSecret, StoreError>;
    async fn list_secrets(&self, user: &str) -> Result<Vec<StoredSecret>, StoreError>;
    async fn delete_secret(&self, user: &str, name: &str) -> Result<(), StoreError>;
}

#[cfg(feature = "postgres")]
pub use postgres_impl::PgRemoteStore;
pub use memory_impl::MemoryRemoteStore;

/// In-memory [`RemoteStore`], for tests and for running the server without
/// a PostgreSQL instance -- one `RwLock`-guarded map per table, no
/// transactions needed since every operation only ever touches one map
/// under one lock acquisition.
mod memory_impl {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;
    use keeper_domain::{Card, Record, StoredSecret};

    use super::RemoteStore;
    use crate::error::StoreError;

    #[derive(Default)]
    struct UserRow {
        password: String,
        token: String,
    }

    /// In-memory remote store. Thread-safe via `RwLock`; no retry or
    /// transaction semantics apply since there is no connection to lose.
    pub struct MemoryRemoteStore {
        users: RwLock<HashMap<String, UserRow>>,
        tokens: RwLock<HashMap<String, String>>,
        records: RwLock<HashMap<(String, String), Record>>,
        cards: RwLock<HashMap<(String, String), Card>>,
        secrets: RwLock<HashMap<(String, String), StoredSecret>>,
    }

    impl MemoryRemoteStore {
        pub fn new() -> Self {
            Self {
                users: RwLock::new(HashMap::new()),
                tokens: RwLock::new(HashMap::new()),
                records: RwLock::new(HashMap::new()),
                cards: RwLock::new(HashMap::new()),
                secrets: RwLock::new(HashMap::new()),
            }
        }
    }

    impl Default for MemoryRemoteStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl RemoteStore for MemoryRemoteStore {
        async fn register(&self, login: &str, password: &str, token: &str) -> Result<(), StoreError> {
            let mut users = self.users.write().unwrap();

            match users.get(login) {
                Some(existing) if existing.password == password => Ok(()),
                Some(_) => Err(StoreError::BadPassword),
                None => {
                    users.insert(
                        login.to_string(),
                        UserRow {
                            password: password.to_string(),
                            token: token.to_string(),
                        },
                    );
                    self.tokens
                        .write()
                        .unwrap()
                        .insert(token.to_string(), login.to_string());
                    Ok(())
                }
            }
        }

        async fn resolve_token(&self, token: &str) -> Result<String, StoreError> {
            self.tokens
                .read()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(StoreError::UnknownUser)
        }

        async fn create_record(&self, user: &str, record: &Record) -> Result<(), StoreError> {
            let mut records = self.records.write().unwrap();
            let key = (user.to_string(), record.name.clone());
            if records.contains_key(&key) {
                return Err(StoreError::AlreadyExists(record.name.clone()));
            }
            records.insert(key, record.clone());
            Ok(())
        }

        async fn update_record(
            &self,
            user: &str,
            name: &str,
            data: &str,
            client_revision: u64,
        ) -> Result<(), StoreError> {
            let mut records = self.records.write().unwrap();
            let key = (user.to_string(), name.to_string());
            let stored = records
                .get_mut(&key)
                .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

            if stored.revision != client_revision {
                return Err(StoreError::BadRevision {
                    expected: stored.revision,
                    actual: client_revision,
                });
            }

            if stored.data != data {
                stored.data = data.to_string();
                stored.revision += 1;
            }
            Ok(())
        }

        async fn load_record(&self, user: &str, name: &str) -> Result<Record, StoreError> {
            self.records
                .read()
                .unwrap()
                .get(&(user.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| StoreError::NotFound(name.to_string()))
        }

        async fn list_records(&self, user: &str) -> Result<Vec<Record>, StoreError> {
            Ok(self
                .records
                .read()
                .unwrap()
                .iter()
                .filter(|((owner, _), _)| owner == user)
                .map(|(_, record)| record.clone())
                .collect())
        }

        async fn delete_record(&self, user: &str, name: &str) -> Result<(), StoreError> {
            self.records
                .write()
                .unwrap()
                .remove(&(user.to_string(), name.to_string()));
            Ok(())
        }

        async fn create_card(&self, user: &str, card: &Card) -> Result<(), StoreError> {
            let mut cards = self.cards.write().unwrap();
            let key = (user.to_string(), card.number.clone());
            if cards.contains_key(&key) {
                return Err(StoreError::AlreadyExists(card.number.clone()));
            }
            cards.insert(key, card.clone());
            Ok(())
        }

        async fn list_cards(&self, user: &str) -> Result<Vec<Card>, StoreError> {
            Ok(self
                .cards
                .read()
                .unwrap()
                .iter()
                .filter(|((owner, _), _)| owner == user)
                .map(|(_, card)| card.clone())
                .collect())
        }

        async fn delete_card(&self, user: &str, number: &str) -> Result<(), StoreError> {
            self.cards
                .write()
                .unwrap()
                .remove(&(user.to_string(), number.to_string()));
            Ok(())
        }

        async fn create_secret(&self, user: &str, secret: &StoredSecret) -> Result<(), StoreError> {
            let mut secrets = self.secrets.write().unwrap();
            let key = (user.to_string(), secret.name.clone());
            if secrets.contains_key(&key) {
                return Err(StoreError::AlreadyExists(secret.name.clone()));
            }
            secrets.insert(key, secret.clone());
            Ok(())
        }

        async fn get_secret(&self, user: &str, name: &str) -> Result<StoredSecret, StoreError> {
            self.secrets
                .read()
                .unwrap()
                .get(&(user.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| StoreError::NotFound(name.to_string()))
        }

        async fn list_secrets(&self, user: &str) -> Result<Vec<StoredSecret>, StoreError> {
            Ok(self
                .secrets
                .read()
                .unwrap()
                .iter()
                .filter(|((owner, _), _)| owner == user)
                .map(|(_, secret)| secret.clone())
                .collect())
        }

        async fn delete_secret(&self, user: &str, name: &str) -> Result<(), StoreError> {
            self.secrets
                .write()
                .unwrap()
                .remove(&(user.to_string(), name.to_string()));
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn register_then_resolve_token() {
            let store = MemoryRemoteStore::new();
            store.register("alice", "pw-ct", "tok-1").await.unwrap();
            assert_eq!(store.resolve_token("tok-1").await.unwrap(), "alice");
        }

        #[tokio::test]
        async fn register_twice_same_password_is_idempotent() {
            let store = MemoryRemoteStore::new();
            store.register("alice", "pw-ct", "tok-1").await.unwrap();
            store.register("alice", "pw-ct", "tok-1").await.unwrap();
        }

        #[tokio::test]
        async fn register_twice_different_password_is_bad_password() {
            let store = MemoryRemoteStore::new();
            store.register("alice", "pw-ct", "tok-1").await.unwrap();
            let err = store.register("alice", "other-ct", "tok-2").await.unwrap_err();
            assert!(matches!(err, StoreError::BadPassword));
        }

        #[tokio::test]
        async fn update_record_checks_revision() {
            let store = MemoryRemoteStore::new();
            store
                .create_record("alice", &Record::new("note", "ct-a"))
                .await
                .unwrap();

            let err = store
                .update_record("alice", "note", "ct-b", 2)
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::BadRevision { expected: 1, actual: 2 }));

            store.update_record("alice", "note", "ct-b", 1).await.unwrap();
            let loaded = store.load_record("alice", "note").await.unwrap();
            assert_eq!(loaded.data, "ct-b");
            assert_eq!(loaded.revision, 2);
        }

        #[tokio::test]
        async fn update_record_revision_is_strictly_increasing_across_updates() {
            let store = MemoryRemoteStore::new();
            store
                .create_record("alice", &Record::new("note", "ct-a"))
                .await
                .unwrap();

            store.update_record("alice", "note", "ct-b", 1).await.unwrap();
            assert_eq!(store.load_record("alice", "note").await.unwrap().revision, 2);

            store.update_record("alice", "note", "ct-c", 2).await.unwrap();
            assert_eq!(store.load_record("alice", "note").await.unwrap().revision, 3);

            let err = store
                .update_record("alice", "note", "ct-d", 2)
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::BadRevision { expected: 3, actual: 2 }));
        }
    }
}

#[cfg(feature = "postgres")]
mod postgres_impl {
    use std::time::Duration;

    use async_trait::async_trait;
    use keeper_domain::{Card, Record, StoredSecret};
    use sqlx::{PgPool, Postgres, Transaction};
    use tracing::warn;

    use super::RemoteStore;
    use crate::error::StoreError;

    const TRANSACTION_DEADLINE: Duration = Duration::from_secs(5);
    const RETRY_BACKOFF: [Duration; 3] = [
        Duration::from_millis(100),
        Duration::from_millis(300),
        Duration::from_millis(500),
    ];

    pub struct PgRemoteStore {
        pool: PgPool,
    }

    impl PgRemoteStore {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        async fn begin(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
            tokio::time::timeout(TRANSACTION_DEADLINE, self.pool.begin())
                .await
                .map_err(|_| StoreError::Connection("transaction begin timed out".to_string()))?
                .map_err(StoreError::from)
        }
    }

    /// Retry `op` with the fixed 100/300/500 ms backoff on connection-class
    /// errors; anything else (including unique violations) surfaces
    /// immediately.
    async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(StoreError::Connection(msg)) if attempt < RETRY_BACKOFF.len() => {
                    warn!(attempt, error = %msg, "retrying after connection error");
                    tokio::time::sleep(RETRY_BACKOFF[attempt]).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn resolve_login<'a>(
        tx: &mut Transaction<'a, Postgres>,
        token: &str,
    ) -> Result<String, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT login FROM users WHERE token = $1")
            .bind(token)
            .fetch_optional(&mut **tx)
            .await
            .map_err(StoreError::from)?
            .ok_or(StoreError::UnknownUser)
    }

    #[async_trait]
    impl RemoteStore for PgRemoteStore {
        async fn register(&self, login: &str, password: &str, token: &str) -> Result<(), StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;

                let existing: Option<String> =
                    sqlx::query_scalar("SELECT password FROM users WHERE login = $1")
                        .bind(login)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(StoreError::from)?;

                match existing {
                    Some(stored_password) => {
                        if stored_password != password {
                            return Err(StoreError::BadPassword);
                        }
                        tx.commit().await.map_err(StoreError::from)?;
                        Ok(())
                    }
                    None => {
                        sqlx::query(
                            "INSERT INTO users (login, password, token) VALUES ($1, $2, $3)",
                        )
                        .bind(login)
                        .bind(password)
                        .bind(token)
                        .execute(&mut *tx)
                        .await
                        .map_err(StoreError::from)?;

                        tx.commit().await.map_err(StoreError::from)?;
                        Ok(())
                    }
                }
            })
            .await
        }

        async fn resolve_token(&self, token: &str) -> Result<String, StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;
                let login = resolve_login(&mut tx, token).await?;
                tx.commit().await.map_err(StoreError::from)?;
                Ok(login)
            })
            .await
        }

        async fn create_record(&self, user: &str, record: &Record) -> Result<(), StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;
                sqlx::query(
                    "INSERT INTO binary_data (\"user\", key, value, revision) VALUES ($1, $2, $3, $4)",
                )
                .bind(user)
                .bind(&record.name)
                .bind(&record.data)
                .bind(record.revision as i64)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                tx.commit().await.map_err(StoreError::from)?;
                Ok(())
            })
            .await
        }

        async fn update_record(
            &self,
            user: &str,
            name: &str,
            data: &str,
            client_revision: u64,
        ) -> Result<(), StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;

                let stored: Option<(String, i64)> = sqlx::query_as(
                    "SELECT value, revision FROM binary_data WHERE \"user\" = $1 AND key = $2",
                )
                .bind(user)
                .bind(name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                let (stored_data, stored_revision) =
                    stored.ok_or_else(|| StoreError::NotFound(name.to_string()))?;

                if stored_revision as u64 != client_revision {
                    return Err(StoreError::BadRevision {
                        expected: stored_revision as u64,
                        actual: client_revision,
                    });
                }

                if stored_data == data {
                    tx.commit().await.map_err(StoreError::from)?;
                    return Ok(());
                }

                sqlx::query(
                    "UPDATE binary_data SET value = $1, revision = revision + 1 WHERE \"user\" = $2 AND key = $3",
                )
                .bind(data)
                .bind(user)
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                tx.commit().await.map_err(StoreError::from)?;
                Ok(())
            })
            .await
        }

        async fn load_record(&self, user: &str, name: &str) -> Result<Record, StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;

                let row: Option<(String, i64)> = sqlx::query_as(
                    "SELECT value, revision FROM binary_data WHERE \"user\" = $1 AND key = $2",
                )
                .bind(user)
                .bind(name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                tx.commit().await.map_err(StoreError::from)?;

                let (data, revision) =
                    row.ok_or_else(|| StoreError::NotFound(name.to_string()))?;

                Ok(Record {
                    name: name.to_string(),
                    data,
                    revision: revision as u64,
                })
            })
            .await
        }

        async fn list_records(&self, user: &str) -> Result<Vec<Record>, StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;

                let rows: Vec<(String, String, i64)> = sqlx::query_as(
                    "SELECT key, value, revision FROM binary_data WHERE \"user\" = $1",
                )
                .bind(user)
                .fetch_all(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                tx.commit().await.map_err(StoreError::from)?;

                Ok(rows
                    .into_iter()
                    .map(|(name, data, revision)| Record {
                        name,
                        data,
                        revision: revision as u64,
                    })
                    .collect())
            })
            .await
        }

        async fn delete_record(&self, user: &str, name: &str) -> Result<(), StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;
                sqlx::query("DELETE FROM binary_data WHERE \"user\" = $1 AND key = $2")
                    .bind(user)
                    .bind(name)
                    .execute(&mut *tx)
                    .await
                    .map_err(StoreError::from)?;
                tx.commit().await.map_err(StoreError::from)?;
                Ok(())
            })
            .await
        }

        async fn create_card(&self, user: &str, card: &Card) -> Result<(), StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;
                sqlx::query(
                    "INSERT INTO wallet (\"user\", card_number, card_data) VALUES ($1, $2, $3)",
                )
                .bind(user)
                .bind(&card.number)
                .bind(&card.data)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;
                tx.commit().await.map_err(StoreError::from)?;
                Ok(())
            })
            .await
        }

        async fn list_cards(&self, user: &str) -> Result<Vec<Card>, StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;

                let rows: Vec<(String, String)> = sqlx::query_as(
                    "SELECT card_number, card_data FROM wallet WHERE \"user\" = $1",
                )
                .bind(user)
                .fetch_all(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                tx.commit().await.map_err(StoreError::from)?;

                Ok(rows
                    .into_iter()
                    .map(|(number, data)| Card { number, data })
                    .collect())
            })
            .await
        }

        async fn delete_card(&self, user: &str, number: &str) -> Result<(), StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;
                sqlx::query("DELETE FROM wallet WHERE \"user\" = $1 AND card_number = $2")
                    .bind(user)
                    .bind(number)
                    .execute(&mut *tx)
                    .await
                    .map_err(StoreError::from)?;
                tx.commit().await.map_err(StoreError::from)?;
                Ok(())
            })
            .await
        }

        async fn create_secret(&self, user: &str, secret: &StoredSecret) -> Result<(), StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;
                sqlx::query(
                    "INSERT INTO secrets (\"user\", secret_key, secret_value) VALUES ($1, $2, $3)",
                )
                .bind(user)
                .bind(&secret.name)
                .bind(&secret.data)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;
                tx.commit().await.map_err(StoreError::from)?;
                Ok(())
            })
            .await
        }

        async fn get_secret(&self, user: &str, name: &str) -> Result<StoredSecret, StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;

                let row: Option<String> = sqlx::query_scalar(
                    "SELECT secret_value FROM secrets WHERE \"user\" = $1 AND secret_key = $2",
                )
                .bind(user)
                .bind(name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                tx.commit().await.map_err(StoreError::from)?;

                let data = row.ok_or_else(|| StoreError::NotFound(name.to_string()))?;
                Ok(StoredSecret {
                    name: name.to_string(),
                    data,
                })
            })
            .await
        }

        async fn list_secrets(&self, user: &str) -> Result<Vec<StoredSecret>, StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;

                let rows: Vec<(String, String)> = sqlx::query_as(
                    "SELECT secret_key, secret_value FROM secrets WHERE \"user\" = $1",
                )
                .bind(user)
                .fetch_all(&mut *tx)
                .await
                .map_err(StoreError::from)?;

                tx.commit().await.map_err(StoreError::from)?;

                Ok(rows
                    .into_iter()
                    .map(|(name, data)| StoredSecret { name, data })
                    .collect())
            })
            .await
        }

        async fn delete_secret(&self, user: &str, name: &str) -> Result<(), StoreError> {
            with_retry(|| async {
                let mut tx = self.begin().await?;
                sqlx::query("DELETE FROM secrets WHERE \"user\" = $1 AND secret_key = $2")
                    .bind(user)
                    .bind(name)
                    .execute(&mut *tx)
                    .await
                    .map_err(StoreError::from)?;
                tx.commit().await.map_err(StoreError::from)?;
                Ok(())
            })
            .await
        }
    }
}

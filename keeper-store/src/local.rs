//! The client-side local store (§4.2): one SQLite file per client, reached
//! through a narrow [`LocalStore`] capability trait so actions only depend
//! on the operations they actually use.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keeper_domain::{Card, Record, StoredSecret, User};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::StoreError;

#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn register(&self, user: &User) -> Result<(), StoreError>;
    async fn get_active(&self) -> Result<User, StoreError>;

    async fn create_record(&self, user: &str, record: &Record) -> Result<(), StoreError>;
    /// Returns `(revision, needs_upload)`. `needs_upload` is false when the
    /// stored ciphertext already equals `record.data` -- the deterministic
    /// nonce in `keeper-crypto` makes that comparison meaningful.
    async fn update_record(&self, user: &str, record: &Record) -> Result<(u64, bool), StoreError>;
    async fn load_record(&self, user: &str, name: &str) -> Result<Record, StoreError>;
    async fn list_records(&self, user: &str) -> Result<Vec<Record>, StoreError>;
    async fn delete_record(&self, user: &str, name: &str) -> Result<(), StoreError>;

    async fn create_card(&self, user: &str, card: &Card) -> Result<(), StoreError>;
    async fn delete_card(&self, user: &str, number: &str) -> Result<(), StoreError>;
    async fn list_cards(&self, user: &str) -> Result<Vec<Card>, StoreError>;

    async fn create_secret(&self, user: &str, secret: &StoredSecret) -> Result<(), StoreError>;
    async fn get_secret(&self, user: &str, name: &str) -> Result<StoredSecret, StoreError>;
    async fn delete_secret(&self, user: &str, name: &str) -> Result<(), StoreError>;
}

/// SQLite-backed [`LocalStore`]. `rusqlite` is synchronous, so every call
/// runs its body on the blocking pool via `spawn_blocking`, guarded by a
/// single `Mutex<Connection>` -- one file, one writer at a time, exactly
/// like the embedded store it replaces.
pub struct SqliteLocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLocalStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::from)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE IF NOT EXISTS users (
                 login      TEXT PRIMARY KEY,
                 password   TEXT NOT NULL,
                 token      TEXT NOT NULL,
                 crypto_key TEXT NOT NULL,
                 active     INTEGER NOT NULL DEFAULT 0
             );
             CREATE TABLE IF NOT EXISTS records (
                 user     TEXT NOT NULL,
                 name     TEXT NOT NULL,
                 data     TEXT NOT NULL,
                 revision INTEGER NOT NULL,
                 PRIMARY KEY (user, name)
             );
             CREATE TABLE IF NOT EXISTS cards (
                 user   TEXT NOT NULL,
                 number TEXT NOT NULL,
                 data   TEXT NOT NULL,
                 PRIMARY KEY (user, number)
             );
             CREATE TABLE IF NOT EXISTS secrets (
                 user TEXT NOT NULL,
                 name TEXT NOT NULL,
                 data TEXT NOT NULL,
                 PRIMARY KEY (user, name)
             );",
        )
        .map_err(StoreError::from)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().expect("local store connection mutex poisoned");
            f(&guard)
        })
        .await
        .expect("local store blocking task panicked")
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn register(&self, user: &User) -> Result<(), StoreError> {
        let user = user.clone();
        let crypto_key_b64 =
            base64_no_pad::encode(&user.crypto_key);

        self.with_conn(move |conn| {
            let tx = conn.unchecked_transaction()?;

            tx.execute("UPDATE users SET active = 0 WHERE active = 1", [])?;

            let result = tx.execute(
                "INSERT INTO users (login, password, token, crypto_key, active) VALUES (?1, ?2, ?3, ?4, 1)",
                params![user.login, user.password, user.token, crypto_key_b64],
            );

            match result {
                Ok(_) => {
                    tx.commit()?;
                    Ok(())
                }
                Err(err) if is_unique_violation(&err) => {
                    // Idempotent: re-registering an already-known login is
                    // a user-visible no-op, not a failure.
                    info!(login = %user.login, "login already registered locally, ignoring");
                    tx.commit()?;
                    Ok(())
                }
                Err(err) => Err(StoreError::from(err)),
            }
        })
        .await
    }

    async fn get_active(&self) -> Result<User, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT login, password, token, crypto_key FROM users WHERE active = 1",
                [],
                |row| {
                    let crypto_key_b64: String = row.get(3)?;
                    Ok(User {
                        login: row.get(0)?,
                        password: row.get(1)?,
                        token: row.get(2)?,
                        crypto_key: base64_no_pad::decode(&crypto_key_b64),
                        active: true,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NoActiveUser)
        })
        .await
    }

    async fn create_record(&self, user: &str, record: &Record) -> Result<(), StoreError> {
        let user = user.to_string();
        let record = record.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO records (user, name, data, revision) VALUES (?1, ?2, ?3, ?4)",
                params![user, record.name, record.data, record.revision as i64],
            )
            .map(|_| ())
            .map_err(StoreError::from)
        })
        .await
    }

    async fn update_record(&self, user: &str, record: &Record) -> Result<(u64, bool), StoreError> {
        let user = user.to_string();
        let record = record.clone();

        self.with_conn(move |conn| {
            let tx = conn.unchecked_transaction()?;

            let stored: Option<(String, i64)> = tx
                .query_row(
                    "SELECT data, revision FROM records WHERE user = ?1 AND name = ?2",
                    params![user, record.name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (stored_data, stored_revision) =
                stored.ok_or_else(|| StoreError::NotFound(record.name.clone()))?;

            if stored_data == record.data {
                tx.commit()?;
                return Ok((stored_revision as u64, false));
            }

            let new_revision = stored_revision + 1;
            tx.execute(
                "UPDATE records SET data = ?1, revision = ?2 WHERE user = ?3 AND name = ?4",
                params![record.data, new_revision, user, record.name],
            )?;
            tx.commit()?;

            Ok((new_revision as u64, true))
        })
        .await
    }

    async fn load_record(&self, user: &str, name: &str) -> Result<Record, StoreError> {
        let user = user.to_string();
        let name = name.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT data, revision FROM records WHERE user = ?1 AND name = ?2",
                params![user, name],
                |row| {
                    let data: String = row.get(0)?;
                    let revision: i64 = row.get(1)?;
                    Ok(Record {
                        name: name.clone(),
                        data,
                        revision: revision as u64,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(name))
        })
        .await
    }

    async fn list_records(&self, user: &str) -> Result<Vec<Record>, StoreError> {
        let user = user.to_string();

        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT name, data, revision FROM records WHERE user = ?1")?;
            let rows = stmt.query_map(params![user], |row| {
                let revision: i64 = row.get(2)?;
                Ok(Record {
                    name: row.get(0)?,
                    data: row.get(1)?,
                    revision: revision as u64,
                })
            })?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
    }

    async fn delete_record(&self, user: &str, name: &str) -> Result<(), StoreError> {
        let user = user.to_string();
        let name = name.to_string();

        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM records WHERE user = ?1 AND name = ?2",
                params![user, name],
            )
            .map(|_| ())
            .map_err(StoreError::from)
        })
        .await
    }

    async fn create_card(&self, user: &str, card: &Card) -> Result<(), StoreError> {
        let user = user.to_string();
        let card = card.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO cards (user, number, data) VALUES (?1, ?2, ?3)",
                params![user, card.number, card.data],
            )
            .map(|_| ())
            .map_err(StoreError::from)
        })
        .await
    }

    async fn delete_card(&self, user: &str, number: &str) -> Result<(), StoreError> {
        let user = user.to_string();
        let number = number.to_string();

        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM cards WHERE user = ?1 AND number = ?2",
                params![user, number],
            )
            .map(|_| ())
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_cards(&self, user: &str) -> Result<Vec<Card>, StoreError> {
        let user = user.to_string();

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT number, data FROM cards WHERE user = ?1")?;
            let rows = stmt.query_map(params![user], |row| {
                Ok(Card {
                    number: row.get(0)?,
                    data: row.get(1)?,
                })
            })?;

            let mut cards = Vec::new();
            for row in rows {
                cards.push(row?);
            }
            Ok(cards)
        })
        .await
    }

    async fn create_secret(&self, user: &str, secret: &StoredSecret) -> Result<(), StoreError> {
        let user = user.to_string();
        let secret = secret.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO secrets (user, name, data) VALUES (?1, ?2, ?3)",
                params![user, secret.name, secret.data],
            )
            .map(|_| ())
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_secret(&self, user: &str, name: &str) -> Result<StoredSecret, StoreError> {
        let user = user.to_string();
        let name = name.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT data FROM secrets WHERE user = ?1 AND name = ?2",
                params![user, name],
                |row| {
                    let data: String = row.get(0)?;
                    Ok(StoredSecret {
                        name: name.clone(),
                        data,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(name))
        })
        .await
    }

    async fn delete_secret(&self, user: &str, name: &str) -> Result<(), StoreError> {
        let user = user.to_string();
        let name = name.to_string();

        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM secrets WHERE user = ?1 AND name = ?2",
                params![user, name],
            )
            .map(|_| ())
            .map_err(StoreError::from)
        })
        .await
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Raw-standard base64, matching the encoding `keeper-crypto` uses for
/// ciphertext so the on-disk `crypto_key` column reads the same way.
mod base64_no_pad {
    use base64::Engine;

    pub fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD_NO_PAD.encode(bytes)
    }

    pub fn decode(s: &str) -> Vec<u8> {
        base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(s)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(login: &str) -> User {
        User {
            login: login.to_string(),
            password: "encrypted-pw".to_string(),
            token: "tok-1".to_string(),
            crypto_key: vec![1u8; 16],
            active: false,
        }
    }

    #[tokio::test]
    async fn register_then_get_active_roundtrips() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        store.register(&user("alice")).await.unwrap();

        let active = store.get_active().await.unwrap();
        assert_eq!(active.login, "alice");
        assert_eq!(active.crypto_key, vec![1u8; 16]);
    }

    #[tokio::test]
    async fn get_active_with_no_users_is_no_active_user() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        assert!(matches!(store.get_active().await, Err(StoreError::NoActiveUser)));
    }

    #[tokio::test]
    async fn registering_second_user_demotes_the_first() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        store.register(&user("alice")).await.unwrap();
        store.register(&user("bob")).await.unwrap();

        let active = store.get_active().await.unwrap();
        assert_eq!(active.login, "bob");
    }

    #[tokio::test]
    async fn re_registering_same_login_is_idempotent() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        store.register(&user("alice")).await.unwrap();
        store.register(&user("alice")).await.unwrap();
    }

    #[tokio::test]
    async fn create_record_then_load() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        let record = Record::new("note", "ciphertext-a");
        store.create_record("alice", &record).await.unwrap();

        let loaded = store.load_record("alice", "note").await.unwrap();
        assert_eq!(loaded.data, "ciphertext-a");
        assert_eq!(loaded.revision, 1);
    }

    #[tokio::test]
    async fn create_record_duplicate_is_already_exists() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        let record = Record::new("note", "ciphertext-a");
        store.create_record("alice", &record).await.unwrap();

        let err = store.create_record("alice", &record).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn update_record_with_same_ciphertext_is_a_no_op() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        let record = Record::new("note", "ciphertext-a");
        store.create_record("alice", &record).await.unwrap();

        let (rev, needs_upload) = store.update_record("alice", &record).await.unwrap();
        assert_eq!(rev, 1);
        assert!(!needs_upload);
    }

    #[tokio::test]
    async fn update_record_with_new_ciphertext_bumps_revision() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        store
            .create_record("alice", &Record::new("note", "ciphertext-a"))
            .await
            .unwrap();

        let updated = Record {
            name: "note".to_string(),
            data: "ciphertext-b".to_string(),
            revision: 1,
        };
        let (rev, needs_upload) = store.update_record("alice", &updated).await.unwrap();
        assert_eq!(rev, 2);
        assert!(needs_upload);

        let loaded = store.load_record("alice", "note").await.unwrap();
        assert_eq!(loaded.data, "ciphertext-b");
        assert_eq!(loaded.revision, 2);
    }

    #[tokio::test]
    async fn list_and_delete_records() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        store
            .create_record("alice", &Record::new("a", "1"))
            .await
            .unwrap();
        store
            .create_record("alice", &Record::new("b", "2"))
            .await
            .unwrap();

        let mut listed = store.list_records("alice").await.unwrap();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(listed.len(), 2);

        store.delete_record("alice", "a").await.unwrap();
        let listed = store.list_records("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "b");
    }

    #[tokio::test]
    async fn cards_create_list_delete() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        let card = Card {
            number: "1234123412341234".to_string(),
            data: "ciphertext".to_string(),
        };
        store.create_card("alice", &card).await.unwrap();

        let cards = store.list_cards("alice").await.unwrap();
        assert_eq!(cards.len(), 1);

        store.delete_card("alice", &card.number).await.unwrap();
        assert!(store.list_cards("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn secrets_create_get_delete() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        let secret = StoredSecret {
            name: "wifi".to_string(),
            data: "ciphertext".to_string(),
        };
        store.create_secret("alice", &secret).await.unwrap();

        let loaded = store.get_secret("alice", "wifi").await.unwrap();
        assert_eq!(loaded.data, "ciphertext");

        store.delete_secret("alice", "wifi").await.unwrap();
        assert!(matches!(
            store.get_secret("alice", "wifi").await,
            Err(StoreError::NotFound(_))
        ));
    }
}

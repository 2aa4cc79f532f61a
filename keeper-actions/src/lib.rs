//! Action orchestration (§4.6, "X" in the component map): the only layer
//! that composes crypto + local store + transport. Every method here
//! implements one ordering contract from the sync protocol; nothing else in
//! the workspace is allowed to call more than one of those three tiers.

mod error;

pub use error::ActionError;

use std::sync::Arc;

use keeper_crypto::{generate_key, Cryptographer};
use keeper_domain::{BankCardPlaintext, Card, Record, Secret, SecretPayload, StoredSecret, User};
use keeper_store::{LocalStore, StoreError};
use keeper_transport::Client;

/// Outcome of [`Actions::update_record`]. A no-op update (ciphertext
/// unchanged under the deterministic nonce) is not an error -- it is
/// reported distinctly so the CLI can print "nothing to update" per §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated { revision: u64 },
    Unchanged,
}

/// Composes the three tiers behind one API. Generic over the local store
/// implementation so tests can substitute an in-memory/tempfile SQLite
/// store without touching the orchestration logic.
pub struct Actions<L: LocalStore> {
    local: Arc<L>,
    transport: Arc<Client>,
}

impl<L: LocalStore> Actions<L> {
    pub fn new(local: Arc<L>, transport: Arc<Client>) -> Self {
        Self { local, transport }
    }

    /// Register a new user (or idempotently re-confirm an existing login).
    /// Generates the client-only `cryptoKey`, encrypts the password under
    /// it, sends login+encrypted-password to the server for a token, then
    /// writes the new active user locally.
    pub async fn register(&self, login: &str, password: &str) -> Result<User, ActionError> {
        let crypto_key = generate_key();
        let cryptographer = Cryptographer::new(&crypto_key)?;
        let encrypted_password = cryptographer.encrypt(password.as_bytes())?;

        let token = self
            .transport
            .register(login, &encrypted_password)
            .await?;

        let user = User {
            login: login.to_string(),
            password: encrypted_password,
            token,
            crypto_key,
            active: true,
        };

        self.local.register(&user).await?;
        Ok(user)
    }

    /// The locally active user, i.e. the one the CLI should act as absent
    /// an explicit login argument. `ActionError::NoActiveUser` if none has
    /// registered yet.
    pub async fn active_user(&self) -> Result<User, ActionError> {
        Ok(self.local.get_active().await?)
    }

    // -- Records ----------------------------------------------------------

    pub async fn create_record(
        &self,
        user: &User,
        name: &str,
        plaintext: &[u8],
    ) -> Result<(), ActionError> {
        let cryptographer = Cryptographer::new(&user.crypto_key)?;
        let ciphertext = cryptographer.encrypt(plaintext)?;
        let mut record = Record::new(name, ciphertext);

        match self.local.create_record(&user.login, &record).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                // Already known locally: push what's actually stored, not a
                // freshly-assumed revision 1.
                record = self.local.load_record(&user.login, name).await?;
            }
            Err(e) => return Err(e.into()),
        }

        self.transport
            .create_record(&user.token, &record.name, &record.data)
            .await?;
        Ok(())
    }

    /// Local-first read: a local hit never issues a network call.
    pub async fn get_record(&self, user: &User, name: &str) -> Result<Vec<u8>, ActionError> {
        let cryptographer = Cryptographer::new(&user.crypto_key)?;

        let record = match self.local.load_record(&user.login, name).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                let remote = self.transport.load_record(&user.token, name).await?;
                let record = Record {
                    name: remote.key,
                    data: remote.data,
                    revision: remote.revision,
                };
                self.local.create_record(&user.login, &record).await?;
                record
            }
            Err(e) => return Err(e.into()),
        };

        Ok(cryptographer.decrypt(&record.data)?.to_vec())
    }

    pub async fn update_record(
        &self,
        user: &User,
        name: &str,
        plaintext: &[u8],
    ) -> Result<UpdateOutcome, ActionError> {
        let cryptographer = Cryptographer::new(&user.crypto_key)?;
        let ciphertext = cryptographer.encrypt(plaintext)?;

        let probe = Record {
            name: name.to_string(),
            data: ciphertext.clone(),
            revision: 0,
        };
        let (revision, needs_upload) = self.local.update_record(&user.login, &probe).await?;

        if !needs_upload {
            return Ok(UpdateOutcome::Unchanged);
        }

        // `revision` is the local store's *new* revision (already bumped).
        // The server hasn't accepted the write yet, so it still holds
        // `revision - 1` -- that's the value it expects to see on the wire;
        // on success it bumps its own copy by one, landing on the same
        // final revision the local store already committed to.
        self.transport
            .update_record(&user.token, name, &ciphertext, revision - 1)
            .await?;
        Ok(UpdateOutcome::Updated { revision })
    }

    /// Delete locally first, then remotely -- a failed remote step leaves a
    /// server-only row that the next list/get against `name` re-seeds.
    pub async fn delete_record(&self, user: &User, name: &str) -> Result<(), ActionError> {
        self.local.delete_record(&user.login, name).await?;
        self.transport.delete_record(&user.token, name).await?;
        Ok(())
    }

    pub async fn list_records(&self, user: &User) -> Result<Vec<(String, Vec<u8>)>, ActionError> {
        let cryptographer = Cryptographer::new(&user.crypto_key)?;
        let records = self.local.list_records(&user.login).await?;

        records
            .into_iter()
            .map(|r| Ok((r.name, cryptographer.decrypt(&r.data)?.to_vec())))
            .collect()
    }

    // -- Cards --------------------------------------------------------------

    pub async fn create_card(
        &self,
        user: &User,
        plaintext: &BankCardPlaintext,
    ) -> Result<(), ActionError> {
        let cryptographer = Cryptographer::new(&user.crypto_key)?;
        let json = serde_json::to_vec(plaintext).map_err(|e| ActionError::Internal(e.to_string()))?;
        let ciphertext = cryptographer.encrypt(&json)?;

        let mut card = Card {
            number: plaintext.number.clone(),
            data: ciphertext,
        };

        match self.local.create_card(&user.login, &card).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                let existing = self.local.list_cards(&user.login).await?;
                if let Some(found) = existing.into_iter().find(|c| c.number == card.number) {
                    card = found;
                }
            }
            Err(e) => return Err(e.into()),
        }

        self.transport
            .create_card(&user.token, &card.number, &card.data)
            .await?;
        Ok(())
    }

    /// Remote first, then local -- the opposite order from records, since a
    /// card number may be reused: a remote-succeeded/local-still-present
    /// state is visible and recoverable, rather than the stealth case where
    /// the client believes the card is gone but the server still holds it.
    pub async fn delete_card(&self, user: &User, number: &str) -> Result<(), ActionError> {
        self.transport.delete_card(&user.token, number).await?;
        self.local.delete_card(&user.login, number).await?;
        Ok(())
    }

    pub async fn list_cards(&self, user: &User) -> Result<Vec<BankCardPlaintext>, ActionError> {
        let cryptographer = Cryptographer::new(&user.crypto_key)?;
        let cards = self.local.list_cards(&user.login).await?;

        cards
            .into_iter()
            .map(|c| {
                let plaintext = cryptographer.decrypt(&c.data)?;
                serde_json::from_slice(&plaintext).map_err(|e| ActionError::Internal(e.to_string()))
            })
            .collect()
    }

    // -- Secrets --------------------------------------------------------------

    pub async fn create_secret(
        &self,
        user: &User,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ActionError> {
        let cryptographer = Cryptographer::new(&user.crypto_key)?;
        let payload = SecretPayload {
            key: key.to_string(),
            value: value.to_string(),
        };
        let json = serde_json::to_vec(&payload).map_err(|e| ActionError::Internal(e.to_string()))?;
        let ciphertext = cryptographer.encrypt(&json)?;

        let mut stored = StoredSecret {
            name: name.to_string(),
            data: ciphertext,
        };

        match self.local.create_secret(&user.login, &stored).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                stored = self.local.get_secret(&user.login, name).await?;
            }
            Err(e) => return Err(e.into()),
        }

        self.transport
            .create_secret(&user.token, &stored.name, &stored.data)
            .await?;
        Ok(())
    }

    /// Local-first read, same shape as [`Actions::get_record`].
    pub async fn get_secret(&self, user: &User, name: &str) -> Result<Secret, ActionError> {
        let cryptographer = Cryptographer::new(&user.crypto_key)?;

        let stored = match self.local.get_secret(&user.login, name).await {
            Ok(stored) => stored,
            Err(StoreError::NotFound(_)) => {
                let remote = self.transport.get_secret(&user.token, name).await?;
                let stored = StoredSecret {
                    name: remote.key,
                    data: remote.data,
                };
                self.local.create_secret(&user.login, &stored).await?;
                stored
            }
            Err(e) => return Err(e.into()),
        };

        let plaintext = cryptographer.decrypt(&stored.data)?;
        let payload: SecretPayload =
            serde_json::from_slice(&plaintext).map_err(|e| ActionError::Internal(e.to_string()))?;
        Ok(Secret::from_parts(stored.name, payload))
    }

    /// Remote first, then local -- same rationale as [`Actions::delete_card`].
    pub async fn delete_secret(&self, user: &User, name: &str) -> Result<(), ActionError> {
        self.transport.delete_secret(&user.token, name).await?;
        self.local.delete_secret(&user.login, name).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_store::SqliteLocalStore;

    fn test_user() -> User {
        User {
            login: "alice".to_string(),
            password: "pw-ciphertext".to_string(),
            token: "tok-1".to_string(),
            crypto_key: vec![3u8; 16],
            active: true,
        }
    }

    #[tokio::test]
    async fn list_records_decrypts_every_row() {
        let local = Arc::new(SqliteLocalStore::open_in_memory().unwrap());
        let transport = Arc::new(Client::new("http://unused.invalid"));
        let actions = Actions::new(local.clone(), transport);

        let user = test_user();
        let cryptographer = Cryptographer::new(&user.crypto_key).unwrap();
        let ciphertext = cryptographer.encrypt(b"hello").unwrap();
        local
            .create_record(&user.login, &Record::new("note", ciphertext))
            .await
            .unwrap();

        let listed = actions.list_records(&user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "note");
        assert_eq!(listed[0].1, b"hello");
    }

    #[tokio::test]
    async fn update_record_on_unseeded_name_is_not_found() {
        let local = Arc::new(SqliteLocalStore::open_in_memory().unwrap());
        let transport = Arc::new(Client::new("http://unused.invalid"));
        let actions = Actions::new(local, transport);

        let user = test_user();
        let err = actions
            .update_record(&user, "missing", b"data")
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
    }
}

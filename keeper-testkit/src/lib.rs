//! Shared test fixtures for Keeper's crates: a throwaway SQLite local
//! store, and small builders for the entities every crate's tests need.
//! Keeper's local tier is file-based, so a `tempfile::NamedTempFile`
//! stands in for a seeded pool.

use keeper_crypto::Cryptographer;
use keeper_domain::{BankCardPlaintext, CardExpiry, Record, StoredSecret, User};
use keeper_store::SqliteLocalStore;

/// A fresh on-disk SQLite local store backed by a file that is deleted when
/// the returned guard drops. Prefer [`in_memory_local_store`] unless the
/// test specifically needs a real path (e.g. exercising `config.database`).
pub fn temp_local_store() -> (SqliteLocalStore, tempfile::TempPath) {
    let file = tempfile::NamedTempFile::new().expect("create temp sqlite file");
    let path = file.into_temp_path();
    let store = SqliteLocalStore::open(&path).expect("open sqlite store");
    (store, path)
}

/// An in-memory SQLite local store -- the default for tests that don't care
/// about on-disk persistence.
pub fn in_memory_local_store() -> SqliteLocalStore {
    SqliteLocalStore::open_in_memory().expect("open in-memory sqlite store")
}

/// A registered-looking local [`User`] fixture. `crypto_key` is fixed
/// (not randomly generated) so tests that encrypt/decrypt are deterministic.
pub fn test_user(login: &str) -> User {
    User {
        login: login.to_string(),
        password: "password-ciphertext".to_string(),
        token: format!("token-{login}"),
        crypto_key: vec![0x42; keeper_crypto::KEY_SIZE],
        active: true,
    }
}

/// A [`Cryptographer`] matching [`test_user`]'s key, for tests that need to
/// produce realistic ciphertext without going through `keeper-actions`.
pub fn test_cryptographer(user: &User) -> Cryptographer {
    Cryptographer::new(&user.crypto_key).expect("valid key size")
}

/// A record encrypted under `user`'s key, ready to hand to a `LocalStore`.
pub fn test_record(user: &User, name: &str, plaintext: &[u8]) -> Record {
    let ciphertext = test_cryptographer(user).encrypt(plaintext).unwrap();
    Record::new(name, ciphertext)
}

/// A stored secret encrypted under `user`'s key.
pub fn test_stored_secret(user: &User, name: &str, key: &str, value: &str) -> StoredSecret {
    let payload = serde_json::json!({ "key": key, "value": value });
    let json = serde_json::to_vec(&payload).unwrap();
    let ciphertext = test_cryptographer(user).encrypt(&json).unwrap();
    StoredSecret {
        name: name.to_string(),
        data: ciphertext,
    }
}

/// A valid bank card fixture (passes [`BankCardPlaintext::parse`]).
pub fn test_card(number: &str) -> BankCardPlaintext {
    BankCardPlaintext {
        number: number.to_string(),
        expiry: CardExpiry { month: 9, year: 27 },
        owner: "JANE DOE".to_string(),
        cvv: "123".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrips_under_test_cryptographer() {
        let user = test_user("alice");
        let record = test_record(&user, "note", b"hello");
        let plaintext = test_cryptographer(&user).decrypt(&record.data).unwrap();
        assert_eq!(&*plaintext, b"hello");
    }

    #[tokio::test]
    async fn in_memory_local_store_is_usable_immediately() {
        use keeper_store::LocalStore;

        let store = in_memory_local_store();
        let user = test_user("alice");
        store.register(&user).await.unwrap();
        assert_eq!(store.get_active().await.unwrap().login, "alice");
    }
}

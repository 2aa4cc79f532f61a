//! The fixed URL map of the protocol. Shared verbatim by the transport
//! client and the server router so the two sides can never drift.

/// POST/PUT -- register or re-confirm a user; header auth only, no token.
pub const REGISTER: &str = "/api/user/register";

/// POST create / PUT update / GET load / DELETE -- single record.
pub const DATA_BINARY: &str = "/api/data/binary";

/// GET -- list all records owned by the caller.
pub const DATA_BINARIES: &str = "/api/data/binaries";

/// PUT create / DELETE -- single card.
pub const DATA_WALLET: &str = "/api/data/wallet";

/// GET -- list all cards owned by the caller.
pub const DATA_WALLETS: &str = "/api/data/wallets";

/// PUT create / GET / DELETE -- single secret.
pub const DATA_SECRET: &str = "/api/data/secret";

/// GET -- list all secrets owned by the caller.
pub const DATA_SECRETS: &str = "/api/data/secrets";

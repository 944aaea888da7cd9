//! Application-wide constants

/// Platform fee charged to landlords before a listing is persisted (XAF).
pub const DEFAULT_PLATFORM_FEE: i64 = 1000;
pub const DEFAULT_CURRENCY: &str = "XAF";

pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 7 * 24 * 3600;
pub const DEFAULT_IDENTITY_CACHE_CAPACITY: usize = 1024;
pub const DEFAULT_OP_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_PUBSUB_CAPACITY: usize = 256;
pub const DEFAULT_MAX_INLINE_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Store paths of the shared collections.
pub const PROPERTIES_PATH: &str = "properties";
pub const ACCOUNTS_PATH: &str = "accounts";
pub const CHATS_PATH: &str = "chats";
pub const MESSAGES_SEGMENT: &str = "messages";
pub const TRANSACTIONS_PATH: &str = "transactions";

pub const CHAT_ID_PREFIX: &str = "chat";

//! Configuration management

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_CURRENCY, DEFAULT_MAX_INLINE_IMAGE_BYTES, DEFAULT_OP_TIMEOUT_MS,
    DEFAULT_IDENTITY_CACHE_CAPACITY, DEFAULT_PLATFORM_FEE, DEFAULT_PUBSUB_CAPACITY,
    DEFAULT_TOKEN_EXPIRY_SECS,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub store: StoreSettings,
    pub auth: AuthSettings,
    pub ledger: LedgerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    /// Allowed browser origin for CORS; `*` allows any.
    pub cors_origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub pubsub_capacity: usize,
    /// Client-imposed timeout for every store round trip.
    pub op_timeout_ms: u64,
    pub max_inline_image_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub token_secret: String,
    pub token_expiry_secs: i64,
    /// Verified tokens kept in memory.
    pub identity_cache_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerSettings {
    pub platform_fee: i64,
    pub currency: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "estate-server")?
            .set_default("app.cors_origin", "http://localhost:3000")?
            .set_default("store.pubsub_capacity", DEFAULT_PUBSUB_CAPACITY as i64)?
            .set_default("store.op_timeout_ms", DEFAULT_OP_TIMEOUT_MS)?
            .set_default("store.max_inline_image_bytes", DEFAULT_MAX_INLINE_IMAGE_BYTES as i64)?
            .set_default("auth.token_secret", "")?
            .set_default("auth.token_expiry_secs", DEFAULT_TOKEN_EXPIRY_SECS)?
            .set_default("auth.identity_cache_capacity", DEFAULT_IDENTITY_CACHE_CAPACITY as i64)?
            .set_default("ledger.platform_fee", DEFAULT_PLATFORM_FEE)?
            .set_default("ledger.currency", DEFAULT_CURRENCY)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;

        let cfg: AppConfig = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.token_secret.trim().len() < 16 {
            return Err(AppError::InvalidConfig(
                "auth.token_secret must be at least 16 characters".into(),
            ));
        }
        if self.auth.token_expiry_secs <= 0 {
            return Err(AppError::InvalidConfig("auth.token_expiry_secs must be positive".into()));
        }
        if self.auth.identity_cache_capacity == 0 {
            return Err(AppError::InvalidConfig("auth.identity_cache_capacity must be non-zero".into()));
        }
        if self.store.op_timeout_ms == 0 {
            return Err(AppError::InvalidConfig("store.op_timeout_ms must be non-zero".into()));
        }
        if self.store.pubsub_capacity == 0 {
            return Err(AppError::InvalidConfig("store.pubsub_capacity must be non-zero".into()));
        }
        if self.ledger.platform_fee < 0 {
            return Err(AppError::InvalidConfig("ledger.platform_fee cannot be negative".into()));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            app: AppSettings {
                env: "test".into(),
                host: "127.0.0.1".into(),
                port: 8080,
                name: "estate-server".into(),
                cors_origin: "*".into(),
            },
            store: StoreSettings {
                pubsub_capacity: 16,
                op_timeout_ms: 1000,
                max_inline_image_bytes: 1024,
            },
            auth: AuthSettings {
                token_secret: "a-long-enough-test-secret".into(),
                token_expiry_secs: 60,
                identity_cache_capacity: 64,
            },
            ledger: LedgerSettings {
                platform_fee: 1000,
                currency: "XAF".into(),
            },
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn rejects_short_secret() {
        let mut cfg = sample();
        cfg.auth.token_secret = "short".into();
        assert!(matches!(cfg.validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut cfg = sample();
        cfg.store.op_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }
}

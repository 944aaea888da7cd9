//! Anonymous identity provider and its session tokens.

mod anonymous_provider;
mod jwt;

pub use anonymous_provider::AnonymousIdentityProvider;
pub use jwt::{Claims, JwtError, JwtService};

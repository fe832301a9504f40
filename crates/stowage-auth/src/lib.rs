//! # stowage-auth
//!
//! Authentication for Stowage.
//!
//! ## Modules
//!
//! - `provider`: credential checks behind the [`AuthProvider`] trait
//! - `jwt`: signed session token encoding and decoding
//! - `session`: token issue, lookup and revocation

pub mod jwt;
pub mod provider;
pub mod session;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use provider::{AuthProvider, DevPasswordProvider, build_provider};
pub use session::{SessionStore, SessionToken};

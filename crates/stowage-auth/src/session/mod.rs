//! Session lifecycle: issue, resolve, revoke.

pub mod store;

pub use store::{SessionStore, SessionToken};

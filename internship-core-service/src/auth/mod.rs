//! Authentication and token lifecycle.
//!
//! A bearer is an HS256-signed envelope whose claims identify a persistent
//! token row. The row, not the signature, decides whether the bearer is still
//! live: revocation and expiry are read from the store on every verification.

pub mod codec;
pub mod password;
pub mod service;
pub mod session;

mod credentials;
mod login;
mod rotation;

pub use codec::{Claims, TokenCodec};
pub use password::{BcryptHasher, PasswordHasher};
pub use service::AuthService;
pub use session::{LoginResult, Session};

#[cfg(test)]
mod tests;

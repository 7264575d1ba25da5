//! `realty-identity` — key material and session ownership.
//!
//! This crate is intentionally decoupled from the ledger transport and from
//! HTTP: it turns a secret into an [`Identity`] and lets a front-end hold one
//! at a time in a [`Session`].

pub mod identity;
pub mod session;

pub use identity::{Identity, RecoverableSignature, load_identity};
pub use session::Session;

//! Session Management Module
//!
//! The [`AuthSessionManager`] is the single owner of authentication state. It
//! coordinates the identity provider, the backend verifier and the session
//! store, and publishes every state transition to subscribers.
//!
//! # Modules
//!
//! - [`manager`] - Sign-in state machine, restore and sign-out

pub mod manager;

pub use manager::AuthSessionManager;

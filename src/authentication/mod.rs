//! Authentication module for the service factory
//!
//! This module wires configured collaborators into a ready-to-use
//! [`AuthSessionManager`](crate::session::AuthSessionManager).

pub mod factory;

pub use factory::AuthenticationServiceFactory;

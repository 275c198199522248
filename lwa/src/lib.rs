//! Lwa is a "Login with Amazon" integration for Rust web applications.
//!
//! This crate serves as a facade, re-exporting functionality from the other
//! `lwa-*` crates based on enabled features.

pub use lwa_core as core;

#[cfg(feature = "session")]
pub use lwa_session as session;

#[cfg(feature = "client")]
pub use lwa_client as client;

#[cfg(feature = "flow")]
pub use lwa_flow as flow;

#[cfg(feature = "axum")]
pub use lwa_axum as axum;

#[cfg(feature = "flow")]
mod aliases {
    pub use crate::core::{
        AuthError, LocalUser, MemorySettings, OAuthClient, OAuthToken, Profile, ProviderConfig,
        Scope, SettingsStore, UserAuthenticator,
    };
    pub use crate::flow::{AuthFlowCoordinator, Authenticated, CallbackQuery, RedirectDirective};
}

#[cfg(feature = "flow")]
pub use aliases::*;

#[cfg(feature = "axum")]
/// Axum-specific convenience re-exports.
pub mod axum_aliases {
    pub use crate::axum::{
        AmazonAuth, AmazonAuthBuilder, AmazonAuthRouterExt, AmazonAuthState, Pages,
    };
}

#[cfg(feature = "axum")]
pub use axum_aliases::*;

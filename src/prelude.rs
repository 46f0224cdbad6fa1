//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use stash_core::prelude::*;
//! ```

// Configuration
pub use crate::config::{AppConfig, Config, HealthConfig, ProviderSelection, ServerConfig};

// Provider traits
pub use crate::provider::{
    AuthProvider, EmailProvider, ExchangeRateProvider, LlmProvider, NotificationProvider, Provider,
};

// Registries
pub use crate::providers::Providers;
pub use crate::registry::{Registry, RegistryBuilder};

// Health and deadlines
pub use crate::deadline::{guard, Deadline, Interrupted};
pub use crate::health::{FnProbe, HealthAggregator, HealthProbe, HealthReport, ProviderProbe};

// Logging
pub use crate::logging::init_logging;

// Errors
pub use crate::error::{
    BoxError, ProviderError, ProviderErrorKind, ProviderResult, RegistryError, RegistryResult,
    StashError, StashResult,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

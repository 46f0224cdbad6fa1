//! # stash-core
//!
//! Provider plumbing for the Stash backend: how external-service backends
//! (auth, LLM extraction, email ingestion, exchange rates, push notifications)
//! are registered, resolved and health-checked, and how their failures are
//! classified.
//!
//! ## Overview
//!
//! - **Error taxonomy**: every provider failure is a [`ProviderError`] with a
//!   closed [`ProviderErrorKind`]; retryability follows from the kind alone.
//! - **Registries**: a [`Registry`] per capability category maps names to
//!   shared provider handles and is safe to use from many threads.
//! - **Health**: a [`HealthAggregator`] runs liveness probes under a deadline
//!   and reports `ok` or `degraded`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stash_core::prelude::*;
//!
//! let config = AppConfig::from_env()?;
//! init_logging(&config.server)?;
//!
//! let providers = Providers::new(config.providers.clone());
//! providers.auth_registry().register("supabase", Arc::new(Supabase::new(&config.supabase)))?;
//!
//! // Per request: resolve, call, classify.
//! let user = providers.auth()?.validate_token(token).await?;
//!
//! let health = HealthAggregator::from_config(&config.health)
//!     .with_probe(FnProbe::new("database", move || ping_database(pool.clone())))
//!     .with_probes(providers.health_probes());
//! let report = health.check().await;
//! ```

mod config;
mod deadline;
mod domain;
mod error;
mod health;
mod logging;
mod provider;
mod providers;
mod registry;

pub mod prelude;

pub use config::{
    AppConfig, Config, DatabaseConfig, FcmConfig, GmailConfig, HealthConfig, OpenAiConfig,
    OpenExchangeRatesConfig, ProviderSelection, RedisConfig, ServerConfig, SupabaseConfig,
};
pub use deadline::{guard, Deadline, Interrupted};
pub use domain::{
    AuthToken, AuthUser, CategorizationRequest, CategorizedTransaction, DeliveryReceipt,
    DeliveryStatus, EmailMessage, EmailSubscription, ExchangeRate, ExtractedTransaction,
    ExtractionRequest, Notification, NotificationType, OAuthToken, PushNotification,
    SocialProvider,
};
pub use error::{
    render_kind, BoxError, ConfigError, ConfigResult, ErrorReport, ProviderError,
    ProviderErrorKind, ProviderResult, RegistryError, RegistryResult, StashError, StashResult,
    UnknownKind,
};
pub use health::{
    DependencyStatus, FnProbe, HealthAggregator, HealthProbe, HealthReport, OverallStatus,
    ProviderProbe,
};
pub use logging::{init_logging, level_directive};
pub use provider::{
    AuthProvider, EmailProvider, ExchangeRateProvider, LlmProvider, NotificationProvider, Provider,
};
pub use providers::Providers;
pub use registry::{Registry, RegistryBuilder};

// Re-export async-trait for convenience
pub use async_trait::async_trait;

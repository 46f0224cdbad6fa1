//! Provider traits.
//!
//! `Provider` is the base contract shared by every backend. Each capability
//! category (auth, LLM extraction, email ingestion, exchange rates,
//! notifications) extends it with its own operation set, and each category
//! gets its own [`Registry`](crate::Registry) so that all entries in one
//! registry share one contract.
//!
//! Every operation reports failure as a [`ProviderError`](crate::ProviderError);
//! implementations classify their native errors before returning them.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{
    AuthToken, AuthUser, CategorizationRequest, CategorizedTransaction, DeliveryReceipt,
    DeliveryStatus, EmailMessage, EmailSubscription, ExchangeRate, ExtractedTransaction,
    ExtractionRequest, Notification, OAuthToken, PushNotification, SocialProvider,
};
use crate::error::ProviderResult;

/// Base trait for all providers.
///
/// # Example
///
/// ```rust
/// use stash_core::{async_trait, Provider, ProviderError, ProviderResult};
///
/// #[derive(Debug)]
/// struct Supabase {
///     reachable: bool,
/// }
///
/// #[async_trait]
/// impl Provider for Supabase {
///     fn name(&self) -> &str {
///         "supabase"
///     }
///
///     async fn health_check(&self) -> ProviderResult<()> {
///         if self.reachable {
///             Ok(())
///         } else {
///             Err(ProviderError::unavailable(self.name(), "HealthCheck", None))
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Returns the name this provider reports in errors and logs.
    ///
    /// This is usually, but not necessarily, the name it is registered under.
    fn name(&self) -> &str;

    /// Lightweight liveness check.
    ///
    /// Providers without a cheap probe can rely on the default, which always
    /// reports healthy.
    async fn health_check(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// Verifies user sessions and issues tokens.
#[async_trait]
pub trait AuthProvider: Provider {
    /// Validate an access token and return the user it belongs to.
    async fn validate_token(&self, access_token: &str) -> ProviderResult<AuthUser>;

    /// Exchange a refresh token for a new token pair.
    async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<AuthToken>;

    /// Sign in with an identity token issued by a social provider.
    async fn sign_in_with_social(
        &self,
        provider: SocialProvider,
        id_token: &str,
    ) -> ProviderResult<AuthToken>;
}

/// Turns raw emails into structured transactions.
#[async_trait]
pub trait LlmProvider: Provider {
    async fn extract_transaction(
        &self,
        request: &ExtractionRequest,
    ) -> ProviderResult<ExtractedTransaction>;

    async fn categorize_transaction(
        &self,
        request: &CategorizationRequest,
    ) -> ProviderResult<CategorizedTransaction>;
}

/// Mailbox access for receipt ingestion.
#[async_trait]
pub trait EmailProvider: Provider {
    /// Complete the OAuth flow started by the client.
    async fn exchange_code(&self, code: &str) -> ProviderResult<OAuthToken>;

    /// Register a push watch on the mailbox.
    async fn subscribe(&self, token: &OAuthToken) -> ProviderResult<EmailSubscription>;

    async fn fetch_message(
        &self,
        token: &OAuthToken,
        message_id: &str,
    ) -> ProviderResult<EmailMessage>;

    /// Decode a push payload delivered to the webhook.
    fn parse_push(&self, payload: &[u8]) -> ProviderResult<PushNotification>;
}

#[async_trait]
pub trait ExchangeRateProvider: Provider {
    /// Quote for converting one unit of `from` into `to` (ISO 4217 codes).
    async fn get_rate(&self, from: &str, to: &str) -> ProviderResult<ExchangeRate>;
}

#[async_trait]
pub trait NotificationProvider: Provider {
    async fn send(&self, notification: &Notification) -> ProviderResult<DeliveryReceipt>;

    async fn delivery_status(&self, receipt_id: &str) -> ProviderResult<DeliveryStatus>;
}

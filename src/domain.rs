//! Value types exchanged with providers.
//!
//! These carry no behavior; each capability trait in [`crate::provider`]
//! consumes and produces them.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Auth
// -----------------------------------------------------------------------------

/// A user as seen by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    /// Name of the auth provider that vouched for this user.
    pub provider: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Session tokens issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
}

/// Identity providers accepted for social sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialProvider {
    Google,
    Apple,
}

impl SocialProvider {
    /// Wire name of the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            SocialProvider::Google => "google",
            SocialProvider::Apple => "apple",
        }
    }
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// LLM extraction
// -----------------------------------------------------------------------------

/// An email handed to the LLM for transaction extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub email_body: String,
    pub sender_email: String,
    pub sender_name: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    pub amount: f64,
    pub currency: String,
    pub merchant_name: String,
    pub raw_merchant_name: String,
    pub transaction_date: DateTime<Utc>,
    pub description: String,
    pub payment_method: String,
    pub is_recurring: bool,
    /// Model confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationRequest {
    pub merchant_name: String,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    pub category: String,
    pub subcategory: String,
    pub confidence: f64,
}

// -----------------------------------------------------------------------------
// Exchange rates
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    /// Provider that produced the quote.
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl ExchangeRate {
    /// Whether the quote can still be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_until
    }
}

// -----------------------------------------------------------------------------
// Email ingestion
// -----------------------------------------------------------------------------

/// Mailbox access granted through an OAuth flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
}

/// A mailbox watch registered with the email provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSubscription {
    pub subscription_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub message_id: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    /// Identifier assigned by the provider, distinct from the RFC 822 id.
    pub internal_id: String,
}

/// Change notification pushed by the email provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub email_address: String,
    pub history_id: u64,
}

// -----------------------------------------------------------------------------
// Notifications
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Push,
    Sms,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub recipient: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub receipt_id: String,
    pub provider: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatus {
    pub receipt_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

//! Error types for the provider layer.
//!
//! Every failure that leaves a provider boundary is a [`ProviderError`],
//! classified under a closed [`ProviderErrorKind`]. Registry and configuration
//! failures are separate families and never carry a kind.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Owned, thread-safe error used as the nested cause of a [`ProviderError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Root error type for stash-core operations.
#[derive(Error, Debug)]
pub enum StashError {
    /// Provider-related errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Registry-related errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Classification of a provider failure.
///
/// The set is closed. Ordinals are stable and used when a kind crosses a
/// process boundary as a raw integer; see [`render_kind`] for decoding
/// ordinals that may be out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ProviderErrorKind {
    Authentication = 0,
    Authorization = 1,
    NotFound = 2,
    RateLimited = 3,
    Validation = 4,
    Unavailable = 5,
    Internal = 6,
}

impl ProviderErrorKind {
    /// All kinds, indexed by ordinal.
    pub const ALL: [ProviderErrorKind; 7] = [
        ProviderErrorKind::Authentication,
        ProviderErrorKind::Authorization,
        ProviderErrorKind::NotFound,
        ProviderErrorKind::RateLimited,
        ProviderErrorKind::Validation,
        ProviderErrorKind::Unavailable,
        ProviderErrorKind::Internal,
    ];

    /// Canonical snake_case tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            ProviderErrorKind::Authentication => "authentication",
            ProviderErrorKind::Authorization => "authorization",
            ProviderErrorKind::NotFound => "not_found",
            ProviderErrorKind::RateLimited => "rate_limited",
            ProviderErrorKind::Validation => "validation",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Internal => "internal",
        }
    }

    /// Raw ordinal of this kind.
    pub const fn ordinal(self) -> u32 {
        self as u32
    }

    /// Whether a failure of this kind may be retried by the caller.
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited | ProviderErrorKind::Unavailable
        )
    }

    /// Message used by the per-kind constructors.
    ///
    /// Validation errors always carry a caller-supplied message; the value
    /// returned here is only used by [`ProviderError::new`] callers that
    /// want a generic one.
    pub const fn default_message(self) -> &'static str {
        match self {
            ProviderErrorKind::Authentication => "authentication failed",
            ProviderErrorKind::Authorization => "insufficient permissions",
            ProviderErrorKind::NotFound => "resource not found",
            ProviderErrorKind::RateLimited => "rate limited",
            ProviderErrorKind::Validation => "validation failed",
            ProviderErrorKind::Unavailable => "service unavailable",
            ProviderErrorKind::Internal => "internal error",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw ordinal that does not name any [`ProviderErrorKind`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown({0})")]
pub struct UnknownKind(pub u32);

impl TryFrom<u32> for ProviderErrorKind {
    type Error = UnknownKind;

    fn try_from(ordinal: u32) -> Result<Self, Self::Error> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(UnknownKind(ordinal))
    }
}

/// Render a raw kind ordinal, falling back to `unknown(<ordinal>)`.
pub fn render_kind(ordinal: u32) -> Cow<'static, str> {
    match ProviderErrorKind::try_from(ordinal) {
        Ok(kind) => Cow::Borrowed(kind.as_str()),
        Err(unknown) => Cow::Owned(unknown.to_string()),
    }
}

/// A classified failure from a provider operation.
///
/// Displays as `<provider>.<operation>: <message>`, followed by
/// `: <cause>` when a cause is attached. The cause is also exposed through
/// [`StdError::source`] so callers can match on it directly.
#[derive(Debug)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    provider: String,
    operation: String,
    message: String,
    cause: Option<BoxError>,
}

impl ProviderError {
    /// Create an error with an explicit message and no cause.
    pub fn new(
        kind: ProviderErrorKind,
        provider: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            provider: provider.into(),
            operation: operation.into(),
            message: message.into(),
            cause: None,
        }
    }

    fn classified(
        kind: ProviderErrorKind,
        provider: impl Into<String>,
        operation: impl Into<String>,
        cause: Option<BoxError>,
    ) -> Self {
        Self {
            cause,
            ..Self::new(kind, provider, operation, kind.default_message())
        }
    }

    /// Credentials were missing, invalid or expired.
    pub fn authentication(
        provider: impl Into<String>,
        operation: impl Into<String>,
        cause: Option<BoxError>,
    ) -> Self {
        Self::classified(ProviderErrorKind::Authentication, provider, operation, cause)
    }

    /// The caller is authenticated but not permitted.
    pub fn authorization(
        provider: impl Into<String>,
        operation: impl Into<String>,
        cause: Option<BoxError>,
    ) -> Self {
        Self::classified(ProviderErrorKind::Authorization, provider, operation, cause)
    }

    /// The requested resource does not exist upstream.
    pub fn not_found(
        provider: impl Into<String>,
        operation: impl Into<String>,
        cause: Option<BoxError>,
    ) -> Self {
        Self::classified(ProviderErrorKind::NotFound, provider, operation, cause)
    }

    /// The upstream service throttled the request.
    pub fn rate_limited(
        provider: impl Into<String>,
        operation: impl Into<String>,
        cause: Option<BoxError>,
    ) -> Self {
        Self::classified(ProviderErrorKind::RateLimited, provider, operation, cause)
    }

    /// Validation failures describe what was wrong, so the message is required.
    pub fn validation(
        provider: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
        cause: Option<BoxError>,
    ) -> Self {
        Self {
            cause,
            ..Self::new(ProviderErrorKind::Validation, provider, operation, message)
        }
    }

    /// The upstream service is unreachable or timed out.
    pub fn unavailable(
        provider: impl Into<String>,
        operation: impl Into<String>,
        cause: Option<BoxError>,
    ) -> Self {
        Self::classified(ProviderErrorKind::Unavailable, provider, operation, cause)
    }

    /// An unexpected failure inside the provider.
    pub fn internal(
        provider: impl Into<String>,
        operation: impl Into<String>,
        cause: Option<BoxError>,
    ) -> Self {
        Self::classified(ProviderErrorKind::Internal, provider, operation, cause)
    }

    /// Attach (or replace) the underlying cause.
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Classification of this failure.
    pub fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    /// Name of the provider that failed.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Operation that failed.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Human-readable message, without the cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Derived from the kind; there is no way to set it independently.
    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// The directly wrapped cause, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Take ownership of the wrapped cause.
    pub fn into_cause(self) -> Option<BoxError> {
        self.cause
    }

    /// Walk the source chain and return the first error of type `E`.
    pub fn find_cause<E: StdError + 'static>(&self) -> Option<&E> {
        let mut current = self.source();
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<E>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }

    /// Summary suitable for returning to API clients.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind,
            provider: self.provider.clone(),
            operation: self.operation.clone(),
            message: self.message.clone(),
            retryable: self.retryable(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(
                f,
                "{}.{}: {}: {}",
                self.provider, self.operation, self.message, cause
            ),
            None => write!(f, "{}.{}: {}", self.provider, self.operation, self.message),
        }
    }
}

impl StdError for ProviderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn StdError + 'static))
    }
}

/// Serializable view of a [`ProviderError`]. The cause is deliberately left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ProviderErrorKind,
    pub provider: String,
    pub operation: String,
    pub message: String,
    pub retryable: bool,
}

/// Errors that can occur in registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Provider already registered with this name
    #[error("provider already registered: {0}")]
    DuplicateProvider(String),

    /// No provider registered with this name
    #[error("no provider registered with name: {0}")]
    ProviderNotFound(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is not set
    #[error("missing required configuration: {0}")]
    Missing(String),

    /// A key is set but its value is unusable
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    /// The configuration source could not be read or deserialized
    #[error("failed to load configuration: {0}")]
    Source(String),
}

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for general stash-core operations.
pub type StashResult<T> = Result<T, StashError>;

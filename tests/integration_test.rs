//! Integration tests for stash-core
//!
//! These tests exercise the registries, error taxonomy and health checks the
//! way the API service wires them together.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use stash_core::prelude::*;
use stash_core::{
    render_kind, DependencyStatus, EmailMessage, EmailSubscription, ExchangeRate, OAuthToken,
    OverallStatus, PushNotification,
};

// =============================================================================
// Test Providers
// =============================================================================

/// Exchange-rate provider that fails its first `failures` calls.
#[derive(Debug)]
struct FlakyRates {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyRates {
    fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Provider for FlakyRates {
    fn name(&self) -> &str {
        "openexchangerates"
    }
}

#[async_trait]
impl ExchangeRateProvider for FlakyRates {
    async fn get_rate(&self, from: &str, to: &str) -> ProviderResult<ExchangeRate> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ProviderError::rate_limited(self.name(), "GetRate", None));
        }
        let now = Utc::now();
        Ok(ExchangeRate {
            from: from.to_string(),
            to: to.to_string(),
            rate: 0.92,
            source: self.name().to_string(),
            fetched_at: now,
            valid_until: now + chrono::Duration::hours(1),
        })
    }
}

/// Email provider backed by an in-memory mailbox.
#[derive(Debug)]
struct InMemoryMailbox {
    name: &'static str,
    messages: HashMap<String, EmailMessage>,
}

impl InMemoryMailbox {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            messages: HashMap::new(),
        }
    }

    fn with_message(mut self, id: &str, subject: &str) -> Self {
        self.messages.insert(
            id.to_string(),
            EmailMessage {
                message_id: id.to_string(),
                from: "receipts@shop.example".to_string(),
                subject: subject.to_string(),
                body: "Total: 12.00 EUR".to_string(),
                received_at: Utc::now(),
                internal_id: format!("internal-{id}"),
            },
        );
        self
    }
}

#[async_trait]
impl Provider for InMemoryMailbox {
    fn name(&self) -> &str {
        self.name
    }
}

#[async_trait]
impl EmailProvider for InMemoryMailbox {
    async fn exchange_code(&self, code: &str) -> ProviderResult<OAuthToken> {
        if code.is_empty() {
            return Err(ProviderError::validation(
                self.name,
                "ExchangeCode",
                "authorization code is empty",
                None,
            ));
        }
        Ok(OAuthToken {
            access_token: format!("access-{code}"),
            refresh_token: format!("refresh-{code}"),
            expires_at: Utc::now(),
            scopes: vec!["gmail.readonly".to_string()],
        })
    }

    async fn subscribe(&self, _token: &OAuthToken) -> ProviderResult<EmailSubscription> {
        Ok(EmailSubscription {
            subscription_id: "watch-1".to_string(),
            expires_at: Utc::now(),
        })
    }

    async fn fetch_message(
        &self,
        _token: &OAuthToken,
        message_id: &str,
    ) -> ProviderResult<EmailMessage> {
        self.messages
            .get(message_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(self.name, "GetMessage", None))
    }

    fn parse_push(&self, payload: &[u8]) -> ProviderResult<PushNotification> {
        serde_json::from_slice(payload).map_err(|e| {
            ProviderError::validation(self.name, "ParsePush", "malformed push payload", Some(e.into()))
        })
    }
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_registry_basic_operations() {
    let registry: Registry<dyn EmailProvider> = Registry::for_category("email");

    let gmail: Arc<dyn EmailProvider> = Arc::new(InMemoryMailbox::new("gmail"));
    registry.register("gmail", gmail.clone()).unwrap();
    registry
        .register("outlook", Arc::new(InMemoryMailbox::new("outlook")))
        .unwrap();

    assert!(Arc::ptr_eq(&registry.get("gmail").unwrap(), &gmail));
    assert_eq!(
        registry.get("yahoo").unwrap_err(),
        RegistryError::ProviderNotFound("yahoo".to_string())
    );

    let mut names = registry.list();
    names.sort();
    assert_eq!(names, vec!["gmail", "outlook"]);
}

#[test]
fn test_registry_duplicate_registration() {
    let registry: Registry<dyn EmailProvider> = Registry::for_category("email");
    let original: Arc<dyn EmailProvider> = Arc::new(InMemoryMailbox::new("gmail"));

    registry.register("gmail", original.clone()).unwrap();
    let result = registry.register("gmail", Arc::new(InMemoryMailbox::new("imposter")));

    assert_eq!(
        result.unwrap_err(),
        RegistryError::DuplicateProvider("gmail".to_string())
    );
    assert_eq!(registry.get("gmail").unwrap().name(), "gmail");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_registry_concurrent_registration() {
    let registry: Arc<Registry<dyn ExchangeRateProvider>> =
        Arc::new(Registry::for_category("exchange_rate"));

    thread::scope(|scope| {
        for i in 0..16 {
            let registry = registry.clone();
            scope.spawn(move || {
                registry
                    .register(format!("provider-{i}"), Arc::new(FlakyRates::new(0)))
                    .unwrap();
            });
        }
    });

    assert_eq!(registry.len(), 16);
    for i in 0..16 {
        assert!(registry.get(&format!("provider-{i}")).is_ok());
    }
}

#[test]
fn test_registry_readers_never_see_partial_state() {
    let registry: Arc<Registry<dyn ExchangeRateProvider>> =
        Arc::new(Registry::for_category("exchange_rate"));

    thread::scope(|scope| {
        let writer = registry.clone();
        scope.spawn(move || {
            for i in 0..200 {
                writer
                    .register(format!("p{i}"), Arc::new(FlakyRates::new(0)))
                    .unwrap();
            }
        });

        for _ in 0..4 {
            let reader = registry.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    // Every listed name must resolve: entries appear whole or not at all.
                    for name in reader.list() {
                        assert!(reader.get(&name).is_ok());
                    }
                }
            });
        }
    });

    assert_eq!(registry.list().len(), 200);
}

#[test]
fn test_registry_builder() {
    let registry = RegistryBuilder::<dyn EmailProvider>::new("email")
        .with("gmail", Arc::new(InMemoryMailbox::new("gmail")))
        .with("outlook", Arc::new(InMemoryMailbox::new("outlook")))
        .build()
        .unwrap();

    assert!(registry.contains("gmail"));
    assert!(registry.contains("outlook"));
}

// =============================================================================
// Error Taxonomy Tests
// =============================================================================

#[test]
fn test_retry_decisions_follow_kind() {
    let retryable: Vec<ProviderErrorKind> = ProviderErrorKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.is_retryable())
        .collect();

    assert_eq!(
        retryable,
        vec![ProviderErrorKind::RateLimited, ProviderErrorKind::Unavailable]
    );
}

#[test]
fn test_unknown_ordinal_renders() {
    assert_eq!(render_kind(99), "unknown(99)");
    assert_eq!(render_kind(2), "not_found");
}

#[test]
fn test_cause_matching_through_taxonomy() {
    let err = ProviderError::unavailable(
        "supabase",
        "ValidateToken",
        Some(io::Error::new(io::ErrorKind::TimedOut, "network timeout").into()),
    );

    let timeout = err.find_cause::<io::Error>().map(|e| e.kind());
    assert_eq!(timeout, Some(io::ErrorKind::TimedOut));
    assert!(err.retryable());
}

#[test]
fn test_root_error_conversion() {
    fn resolve(providers: &Providers) -> StashResult<String> {
        let provider = providers.exchange_rate()?;
        Ok(provider.name().to_string())
    }

    let providers = Providers::default();
    let err = resolve(&providers).unwrap_err();
    assert!(matches!(err, StashError::Registry(RegistryError::ProviderNotFound(_))));
    assert_eq!(
        err.to_string(),
        "Registry error: no provider registered with name: openexchangerates"
    );
}

// =============================================================================
// Real-World Scenario Tests
// =============================================================================

/// Callers own the retry policy; the core only classifies.
#[tokio::test]
async fn test_caller_retries_retryable_errors() {
    let providers = Providers::default();
    providers
        .exchange_rate_registry()
        .register("openexchangerates", Arc::new(FlakyRates::new(2)))
        .unwrap();

    let mut attempts = 0;
    let rate = loop {
        attempts += 1;
        let provider = providers.exchange_rate().unwrap();
        match provider.get_rate("USD", "EUR").await {
            Ok(rate) => break rate,
            Err(err) if err.retryable() && attempts < 5 => continue,
            Err(err) => panic!("unexpected error: {err}"),
        }
    };

    assert_eq!(attempts, 3);
    assert_eq!(rate.source, "openexchangerates");
}

#[tokio::test]
async fn test_email_ingestion_flow() {
    let providers = Providers::default();
    providers
        .email_registry()
        .register(
            "gmail",
            Arc::new(InMemoryMailbox::new("gmail").with_message("m-1", "Your receipt")),
        )
        .unwrap();

    let gmail = providers.email("gmail").unwrap();
    let token = gmail.exchange_code("abc").await.unwrap();
    gmail.subscribe(&token).await.unwrap();

    let push = gmail
        .parse_push(br#"{"email_address":"me@example.com","history_id":42}"#)
        .unwrap();
    assert_eq!(push.history_id, 42);

    let message = gmail.fetch_message(&token, "m-1").await.unwrap();
    assert_eq!(message.subject, "Your receipt");

    let missing = gmail.fetch_message(&token, "m-2").await.unwrap_err();
    assert_eq!(missing.to_string(), "gmail.GetMessage: resource not found");
    assert!(!missing.retryable());

    let malformed = gmail.parse_push(b"not json").unwrap_err();
    assert_eq!(malformed.kind(), ProviderErrorKind::Validation);
    assert!(malformed.find_cause::<serde_json::Error>().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_slow_provider() {
    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl Provider for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }
    }

    #[async_trait]
    impl ExchangeRateProvider for Stalled {
        async fn get_rate(&self, _from: &str, _to: &str) -> ProviderResult<ExchangeRate> {
            std::future::pending().await
        }
    }

    let provider: Arc<dyn ExchangeRateProvider> = Arc::new(Stalled);
    let deadline = Deadline::after(Duration::from_millis(250));
    let err = guard("stalled", "GetRate", &deadline, provider.get_rate("USD", "EUR"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProviderErrorKind::Unavailable);
    assert_eq!(err.find_cause::<Interrupted>(), Some(&Interrupted::TimedOut));
}

#[tokio::test]
async fn test_health_endpoint_report() {
    let providers = Providers::default();
    providers
        .email_registry()
        .register("gmail", Arc::new(InMemoryMailbox::new("gmail")))
        .unwrap();

    let aggregator = HealthAggregator::new(Duration::from_secs(1))
        .with_probe(FnProbe::new("database", || async { Ok::<(), BoxError>(()) }))
        .with_probe(FnProbe::new("redis", || async {
            Err::<(), BoxError>("connection refused".into())
        }))
        .with_probes(providers.health_probes());

    let report = aggregator.check().await;

    assert_eq!(report.status, OverallStatus::Degraded);
    assert_eq!(report.status_code(), 503);
    assert_eq!(report.dependency("database"), Some(DependencyStatus::Healthy));
    assert_eq!(report.dependency("redis"), Some(DependencyStatus::Unhealthy));
    assert_eq!(report.dependency("email:gmail"), Some(DependencyStatus::Healthy));
    // Selected but never registered.
    assert_eq!(
        report.dependency("auth:supabase"),
        Some(DependencyStatus::Unhealthy)
    );

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["database"], "healthy");
}

//! The set of provider registries handed to request handlers.
//!
//! `Providers` is built once at startup and shared (it is cheap to clone).
//! Handlers resolve the configured provider through it on every call instead
//! of holding on to an instance.

use std::sync::Arc;

use crate::config::ProviderSelection;
use crate::error::RegistryResult;
use crate::health::{HealthProbe, ProviderProbe};
use crate::provider::{
    AuthProvider, EmailProvider, ExchangeRateProvider, LlmProvider, NotificationProvider,
};
use crate::registry::Registry;

/// One registry per capability category plus the configured selection.
#[derive(Debug, Clone)]
pub struct Providers {
    selection: ProviderSelection,
    auth: Arc<Registry<dyn AuthProvider>>,
    llm: Arc<Registry<dyn LlmProvider>>,
    email: Arc<Registry<dyn EmailProvider>>,
    exchange_rate: Arc<Registry<dyn ExchangeRateProvider>>,
    notification: Arc<Registry<dyn NotificationProvider>>,
}

impl Providers {
    /// Create empty registries for every category.
    pub fn new(selection: ProviderSelection) -> Self {
        Self {
            selection,
            auth: Arc::new(Registry::for_category("auth")),
            llm: Arc::new(Registry::for_category("llm")),
            email: Arc::new(Registry::for_category("email")),
            exchange_rate: Arc::new(Registry::for_category("exchange_rate")),
            notification: Arc::new(Registry::for_category("notification")),
        }
    }

    /// Configured provider name per category.
    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    /// Registry of authentication providers.
    pub fn auth_registry(&self) -> &Arc<Registry<dyn AuthProvider>> {
        &self.auth
    }

    /// Registry of LLM providers.
    pub fn llm_registry(&self) -> &Arc<Registry<dyn LlmProvider>> {
        &self.llm
    }

    /// Registry of email providers.
    pub fn email_registry(&self) -> &Arc<Registry<dyn EmailProvider>> {
        &self.email
    }

    /// Registry of exchange rate providers.
    pub fn exchange_rate_registry(&self) -> &Arc<Registry<dyn ExchangeRateProvider>> {
        &self.exchange_rate
    }

    /// Registry of notification providers.
    pub fn notification_registry(&self) -> &Arc<Registry<dyn NotificationProvider>> {
        &self.notification
    }

    /// Resolve the configured auth provider.
    pub fn auth(&self) -> RegistryResult<Arc<dyn AuthProvider>> {
        self.auth.get(&self.selection.auth)
    }

    /// Resolve the configured LLM provider.
    pub fn llm(&self) -> RegistryResult<Arc<dyn LlmProvider>> {
        self.llm.get(&self.selection.llm)
    }

    /// Resolve an email provider by name; each mailbox records its own.
    pub fn email(&self, name: &str) -> RegistryResult<Arc<dyn EmailProvider>> {
        self.email.get(name)
    }

    /// Resolve the configured exchange-rate provider.
    pub fn exchange_rate(&self) -> RegistryResult<Arc<dyn ExchangeRateProvider>> {
        self.exchange_rate.get(&self.selection.exchange_rate)
    }

    /// Resolve the configured notification provider.
    pub fn notification(&self) -> RegistryResult<Arc<dyn NotificationProvider>> {
        self.notification.get(&self.selection.notification)
    }

    /// Probes for the selected providers and every registered email provider.
    pub fn health_probes(&self) -> Vec<Arc<dyn HealthProbe>> {
        let mut probes: Vec<Arc<dyn HealthProbe>> = Vec::new();
        probes.push(Arc::new(ProviderProbe::new(
            self.auth.clone(),
            &self.selection.auth,
        )));
        probes.push(Arc::new(ProviderProbe::new(
            self.llm.clone(),
            &self.selection.llm,
        )));
        probes.push(Arc::new(ProviderProbe::new(
            self.exchange_rate.clone(),
            &self.selection.exchange_rate,
        )));
        probes.push(Arc::new(ProviderProbe::new(
            self.notification.clone(),
            &self.selection.notification,
        )));

        let mut mailboxes = self.email.list();
        mailboxes.sort();
        for name in mailboxes {
            probes.push(Arc::new(ProviderProbe::new(self.email.clone(), name)));
        }
        probes
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::new(ProviderSelection::default())
    }
}

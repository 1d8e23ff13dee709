//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the planner starts with zero
//! configuration against the hosted backend.

use carnival_shared::constants::{
    CHECKOUT_CANCEL_PATH, CHECKOUT_SESSION_PLACEHOLDER, CHECKOUT_SUCCESS_PATH,
    DEFAULT_APP_NAMESPACE,
};
use carnival_shared::PlanTier;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Namespace under `users/{uid}/apps/` holding this app's records.
    /// Env: `CARNIVAL_APP_NAMESPACE`
    /// Default: `carnival-planner-v1`
    pub app_namespace: String,

    /// HTTPS endpoint of the `createCheckoutSession` callable.
    /// Env: `CARNIVAL_CHECKOUT_ENDPOINT`
    pub checkout_endpoint: String,

    /// Origin the payment provider redirects back to.
    /// Env: `CARNIVAL_APP_BASE_URL`
    /// Default: `https://carnival-planner.firebaseapp.com`
    pub app_base_url: String,

    /// Payment provider price id of the monthly tier.
    /// Env: `CARNIVAL_MONTHLY_PRICE_ID`
    pub monthly_price_id: String,

    /// Payment provider price id of the yearly tier.
    /// Env: `CARNIVAL_YEARLY_PRICE_ID`
    pub yearly_price_id: String,

    /// Run signed in as the demo user against a seeded local store.
    /// Env: `CARNIVAL_DEMO_MODE` (true/false)
    /// Default: `false`
    pub demo_mode: bool,

    /// Capacity of the session command channel.
    /// Env: `CARNIVAL_COMMAND_BUFFER`
    /// Default: `64`
    pub command_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_namespace: DEFAULT_APP_NAMESPACE.to_string(),
            checkout_endpoint:
                "https://us-central1-carnival-planner.cloudfunctions.net/createCheckoutSession"
                    .to_string(),
            app_base_url: "https://carnival-planner.firebaseapp.com".to_string(),
            monthly_price_id: "price_carnival_monthly".to_string(),
            yearly_price_id: "price_carnival_yearly".to_string(),
            demo_mode: false,
            command_buffer: 64,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ns) = lookup("CARNIVAL_APP_NAMESPACE") {
            if ns.is_empty() || ns.contains('/') {
                tracing::warn!(value = %ns, "Invalid CARNIVAL_APP_NAMESPACE, using default");
            } else {
                config.app_namespace = ns;
            }
        }

        if let Some(url) = lookup("CARNIVAL_CHECKOUT_ENDPOINT") {
            config.checkout_endpoint = url;
        }

        if let Some(url) = lookup("CARNIVAL_APP_BASE_URL") {
            config.app_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(price) = lookup("CARNIVAL_MONTHLY_PRICE_ID") {
            config.monthly_price_id = price;
        }

        if let Some(price) = lookup("CARNIVAL_YEARLY_PRICE_ID") {
            config.yearly_price_id = price;
        }

        if let Some(val) = lookup("CARNIVAL_DEMO_MODE") {
            config.demo_mode = val == "true" || val == "1";
        }

        if let Some(val) = lookup("CARNIVAL_COMMAND_BUFFER") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.command_buffer = n,
                _ => tracing::warn!(value = %val, "Invalid CARNIVAL_COMMAND_BUFFER, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }

    pub fn price_id(&self, tier: PlanTier) -> &str {
        match tier {
            PlanTier::Monthly => &self.monthly_price_id,
            PlanTier::Yearly => &self.yearly_price_id,
        }
    }

    pub fn success_url(&self) -> String {
        format!(
            "{}{}?session_id={}",
            self.app_base_url, CHECKOUT_SUCCESS_PATH, CHECKOUT_SESSION_PLACEHOLDER
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.app_base_url, CHECKOUT_CANCEL_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.app_namespace, "carnival-planner-v1");
        assert!(!config.demo_mode);
        assert_eq!(
            config.cancel_url(),
            "https://carnival-planner.firebaseapp.com/checkout-cancelled"
        );
        assert_eq!(
            config.success_url(),
            "https://carnival-planner.firebaseapp.com/checkout-success?session_id={CHECKOUT_SESSION_ID}"
        );
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("CARNIVAL_APP_BASE_URL", "http://localhost:5173/"),
            ("CARNIVAL_YEARLY_PRICE_ID", "price_y"),
            ("CARNIVAL_DEMO_MODE", "1"),
            ("CARNIVAL_COMMAND_BUFFER", "8"),
        ]));
        assert_eq!(config.cancel_url(), "http://localhost:5173/checkout-cancelled");
        assert_eq!(config.price_id(PlanTier::Yearly), "price_y");
        assert_eq!(config.price_id(PlanTier::Monthly), "price_carnival_monthly");
        assert!(config.demo_mode);
        assert_eq!(config.command_buffer, 8);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("CARNIVAL_APP_NAMESPACE", "a/b"),
            ("CARNIVAL_COMMAND_BUFFER", "zero"),
        ]));
        assert_eq!(config.app_namespace, "carnival-planner-v1");
        assert_eq!(config.command_buffer, 64);
    }
}

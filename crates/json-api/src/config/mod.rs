//! Server configuration module

use clap::Parser;

use crate::config::{
    checkout::CheckoutFlowsConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    server::ServerRuntimeConfig,
    storage::StorageConfig,
    upstream::UpstreamConfig,
};

pub(crate) mod checkout;
pub(crate) mod observability;
pub(crate) mod server;
pub(crate) mod storage;
pub(crate) mod upstream;

/// Tiercart JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "tiercart-json", about = "Tiercart JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Metrics and request logging settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Cart storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Catalog and order service settings.
    #[command(flatten)]
    pub upstream: UpstreamConfig,

    /// Checkout flow settings.
    #[command(flatten)]
    pub checkout: CheckoutFlowsConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::config::storage::StorageKind;

    use super::*;

    #[test]
    fn defaults_need_only_the_order_service() -> TestResult {
        let config =
            ServerConfig::try_parse_from(["tiercart-json", "--orders-url", "http://orders"])?;

        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
        assert!(matches!(config.storage.storage, StorageKind::Memory));
        assert_eq!(config.checkout.currency, "PKR");
        assert_eq!(config.upstream.timeout_ms, 10_000);

        Ok(())
    }

    #[test]
    fn flow_flags_override_the_defaults() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "tiercart-json",
            "--orders-url",
            "http://orders",
            "--checkout-tax-percent",
            "0",
            "--preview-shipping-fee",
            "250",
        ])?;

        let settings = config.checkout.settings()?;

        assert_eq!(settings.checkout.tax_rate, None);
        assert_eq!(settings.cart_preview.shipping_fee.to_minor_units(), 25_000);

        Ok(())
    }
}

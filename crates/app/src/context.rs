//! App Context

use std::sync::Arc;

use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, MemoryCartsService, PgCartsService},
        catalog::ProductCatalog,
        checkout::{CheckoutService, CheckoutSettings, DefaultCheckoutService, OrdersClient},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to run database migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub carts: Arc<dyn CartsService>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub checkout: Arc<dyn CheckoutService>,
}

impl AppContext {
    /// Wire the checkout service over an existing cart service.
    pub fn new(
        carts: Arc<dyn CartsService>,
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrdersClient>,
        settings: CheckoutSettings,
    ) -> Self {
        let checkout = DefaultCheckoutService::new(
            Arc::clone(&carts),
            Arc::clone(&catalog),
            orders,
            settings,
        );

        Self {
            carts,
            catalog,
            checkout: Arc::new(checkout),
        }
    }

    /// Build application context with carts held in process memory.
    pub fn in_memory(
        currency: &'static Currency,
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrdersClient>,
        settings: CheckoutSettings,
    ) -> Self {
        Self::new(
            Arc::new(MemoryCartsService::new(currency)),
            catalog,
            orders,
            settings,
        )
    }

    /// Build application context from a database URL, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or migrating fails.
    pub async fn from_database_url(
        url: &str,
        currency: &'static Currency,
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrdersClient>,
        settings: CheckoutSettings,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        Ok(Self::new(
            Arc::new(PgCartsService::new(Db::new(pool), currency)),
            catalog,
            orders,
            settings,
        ))
    }
}

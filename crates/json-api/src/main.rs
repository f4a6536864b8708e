//! Tiercart JSON API Server

use std::{process, sync::Arc};

use salvo::{affix_state::inject, prelude::*, trailing_slash::remove_slash};
use thiserror::Error;
use tracing::{error, info};

use tiercart_app::{
    context::{AppContext, AppInitError},
    domain::{
        catalog::{CatalogError, FixtureCatalog, HttpProductCatalog, ProductCatalog},
        checkout::{HttpOrdersClient, OrdersError},
    },
};

use crate::{
    config::{ServerConfig, checkout::CheckoutConfigError, storage::StorageKind},
    state::State,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod buyer;
mod carts;
mod checkout;
mod config;
mod extensions;
mod healthcheck;
mod observability;
mod responses;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Checkout(#[from] CheckoutConfigError),

    #[error("either --catalog-url or --catalog-path is required")]
    MissingCatalog,

    #[error("failed to build catalog client: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to build order service client: {0}")]
    Orders(#[from] OrdersError),

    #[error("--database-url is required for postgres storage")]
    MissingDatabaseUrl,

    #[error(transparent)]
    App(#[from] AppInitError),
}

async fn build_app(config: &ServerConfig) -> Result<AppContext, StartupError> {
    let settings = config.checkout.settings()?;
    let currency = config.checkout.currency()?;
    let timeout = config.upstream.timeout();

    let catalog: Arc<dyn ProductCatalog> = match (
        &config.upstream.catalog_path,
        &config.upstream.catalog_url,
    ) {
        (Some(path), _) => {
            info!(path = %path.display(), "serving catalog from fixture file");

            Arc::new(FixtureCatalog::from_path(path)?)
        }
        (None, Some(url)) => Arc::new(HttpProductCatalog::new(url.as_str(), timeout)?),
        (None, None) => return Err(StartupError::MissingCatalog),
    };

    let orders = Arc::new(HttpOrdersClient::new(
        config.upstream.orders_url.as_str(),
        timeout,
    )?);

    match config.storage.storage {
        StorageKind::Memory => {
            info!("carts are held in memory");

            Ok(AppContext::in_memory(currency, catalog, orders, settings))
        }
        StorageKind::Postgres => {
            let url = config
                .storage
                .database_url
                .as_deref()
                .ok_or(StartupError::MissingDatabaseUrl)?;

            Ok(AppContext::from_database_url(url, currency, catalog, orders, settings).await?)
        }
    }
}

/// Tiercart JSON API Server entry point
///
/// # Panics
///
/// Panics if the server fails to bind or serve requests
#[tokio::main]
pub async fn main() {
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = observability::init(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Observability error: {init_error}");
        }

        process::exit(1);
    }

    let app = match build_app(&config).await {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            process::exit(1);
        }
    };

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    let listener = TcpListener::new(addr).bind().await;

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(observability::request_logging)
        .hoop(remove_slash())
        .hoop(inject(State::from_app_context(app)))
        .push(router::app_router(config.observability.metrics_enabled));

    let server = Server::new(listener);

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(router).await;
}

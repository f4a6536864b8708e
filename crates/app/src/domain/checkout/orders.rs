//! External order-creation service.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tiercart::{
    orders::Address,
    uuids::{BuyerUuid, LineItemUuid, ProductUuid, RequestUuid, SupplierUuid},
};

/// One supplier's share of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub buyer: BuyerUuid,
    pub supplier: SupplierUuid,
    pub supplier_name: String,
    pub currency: String,
    pub lines: Vec<OrderDraftLine>,

    /// Sum of line totals in minor units
    pub subtotal: i64,

    pub shipping_address: Address,
    pub payment_method: String,
    pub shipping_method: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub is_dropshipping: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_address: Option<Address>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropshipping_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraftLine {
    pub item_id: LineItemUuid,
    pub product: ProductUuid,
    pub product_name: String,
    pub variation: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total_price: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestUuid>,
}

/// An order accepted by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: String,
    pub supplier: SupplierUuid,
}

#[derive(Debug, Error)]
pub enum OrdersError {
    #[error("order service timed out")]
    Timeout,

    #[error("order service http error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("order rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for OrdersError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(error)
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
}

/// Posts drafts to `{base_url}/orders`.
#[derive(Debug, Clone)]
pub struct HttpOrdersClient {
    base_url: String,
    http: Client,
}

impl HttpOrdersClient {
    /// Create a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OrdersError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl OrdersClient for HttpOrdersClient {
    async fn create_order(&self, draft: OrderDraft) -> Result<CreatedOrder, OrdersError> {
        let url = format!("{}/orders", self.base_url);

        debug!(supplier = %draft.supplier, lines = draft.lines.len(), "submitting order draft");

        let response = self.http.post(&url).json(&draft).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(OrdersError::Rejected(format!(
                "order request failed with status {status}: {text}"
            )));
        }

        let parsed: CreateOrderResponse = response.json().await?;

        Ok(CreatedOrder {
            id: parsed.id,
            supplier: draft.supplier,
        })
    }
}

#[automock]
#[async_trait]
pub trait OrdersClient: Send + Sync {
    /// Create one order. Called at most once per draft.
    async fn create_order(&self, draft: OrderDraft) -> Result<CreatedOrder, OrdersError>;
}

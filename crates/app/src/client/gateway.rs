//! Cart service gateway.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use tiercart::uuids::BuyerUuid;

use crate::{
    client::errors::GatewayError,
    wire::{
        AddItemPayload, CartPayload, CheckoutPayload, CheckoutResultPayload, Envelope,
        RemoveItemPayload, UpdateQuantityPayload,
    },
};

/// Header carrying the buyer identity set by the session layer.
pub const BUYER_HEADER: &str = "x-buyer-uuid";

/// Talks to the cart service over HTTP on behalf of one buyer.
#[derive(Debug, Clone)]
pub struct HttpCartGateway {
    base_url: String,
    buyer: BuyerUuid,
    http: Client,
}

impl HttpCartGateway {
    /// Create a gateway whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        buyer: BuyerUuid,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            buyer,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request
            .header(BUYER_HEADER, self.buyer.to_string())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let envelope = serde_json::from_str::<Envelope<T>>(&text).ok();

        debug!(status = status.as_u16(), "cart service responded");

        if status.is_success() {
            return envelope
                .ok_or_else(|| text.clone())
                .and_then(Envelope::into_result)
                .map_err(|message| GatewayError::Server {
                    status: status.as_u16(),
                    message,
                });
        }

        let message = envelope.and_then(|envelope| envelope.error).unwrap_or(text);

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                GatewayError::Validation(message)
            }
            StatusCode::NOT_FOUND => GatewayError::NotFound(message),
            StatusCode::CONFLICT => GatewayError::Conflict(message),
            StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
            _ => GatewayError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl CartGateway for HttpCartGateway {
    async fn fetch_cart(&self) -> Result<CartPayload, GatewayError> {
        self.send(self.http.get(self.url("/cart"))).await
    }

    async fn add_item(&self, item: AddItemPayload) -> Result<CartPayload, GatewayError> {
        self.send(self.http.post(self.url("/cart")).json(&item)).await
    }

    async fn update_quantity(
        &self,
        update: UpdateQuantityPayload,
    ) -> Result<CartPayload, GatewayError> {
        self.send(self.http.patch(self.url("/cart")).json(&update))
            .await
    }

    async fn remove_item(&self, remove: RemoveItemPayload) -> Result<CartPayload, GatewayError> {
        self.send(self.http.delete(self.url("/cart")).json(&remove))
            .await
    }

    async fn clear(&self) -> Result<CartPayload, GatewayError> {
        self.send(self.http.post(self.url("/cart/clear"))).await
    }

    async fn checkout(
        &self,
        request: CheckoutPayload,
    ) -> Result<CheckoutResultPayload, GatewayError> {
        self.send(self.http.post(self.url("/checkout")).json(&request))
            .await
    }
}

#[automock]
#[async_trait]
pub trait CartGateway: Send + Sync {
    async fn fetch_cart(&self) -> Result<CartPayload, GatewayError>;

    async fn add_item(&self, item: AddItemPayload) -> Result<CartPayload, GatewayError>;

    async fn update_quantity(
        &self,
        update: UpdateQuantityPayload,
    ) -> Result<CartPayload, GatewayError>;

    async fn remove_item(&self, remove: RemoveItemPayload) -> Result<CartPayload, GatewayError>;

    async fn clear(&self) -> Result<CartPayload, GatewayError>;

    async fn checkout(
        &self,
        request: CheckoutPayload,
    ) -> Result<CheckoutResultPayload, GatewayError>;
}

//! Clear Cart Handler

use std::sync::Arc;

use salvo::prelude::*;
use tracing::{info, instrument};

use tiercart_app::wire::CartPayload;

use crate::{
    carts::errors::into_api_error,
    extensions::*,
    responses::{ApiResult, ok},
    state::State,
};

/// Clear Cart Handler
#[handler]
#[instrument(skip_all)]
pub(crate) async fn handler(depot: &mut Depot) -> ApiResult<CartPayload> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let cart = state
        .app
        .carts
        .clear(buyer)
        .await
        .map_err(into_api_error)?;

    info!(%buyer, version = cart.version(), "cart cleared");

    ok(CartPayload::from_cart(&cart).or_500("failed to total cart")?)
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use testresult::TestResult;

    use tiercart_app::domain::carts::CartsServiceError;

    use crate::test_helpers::{Mocks, TEST_BUYER_UUID, cart_with, service};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        service(mocks, Router::with_path("cart/clear").post(handler))
    }

    #[tokio::test]
    async fn test_clear_returns_an_empty_cart() -> TestResult {
        let cart = cart_with(Vec::new())?;
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_clear()
            .once()
            .withf(|buyer| *buyer == TEST_BUYER_UUID)
            .return_once(move |_| Ok(cart));

        let mut res = TestClient::post("http://example.com/cart/clear")
            .send(&make_service(mocks))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["data"]["totalItems"], 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_storage_error_returns_500() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_clear()
            .once()
            .return_once(|_| Err(CartsServiceError::InvalidData("bad position".to_string())));

        let res = TestClient::post("http://example.com/cart/clear")
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}

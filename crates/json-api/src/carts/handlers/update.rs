//! Update Cart Item Quantity Handler

use std::sync::Arc;

use salvo::prelude::*;
use tracing::instrument;

use tiercart_app::wire::{CartPayload, UpdateQuantityPayload};

use crate::{
    carts::errors::into_api_error,
    extensions::*,
    responses::{ApiError, ApiResult, ok},
    state::State,
};

/// Update Cart Item Quantity Handler
///
/// Sets a line's quantity; zero or less removes the line. When `expectedVersion` is sent
/// and the cart has moved on, the update is rejected with 409.
#[handler]
#[instrument(skip_all)]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> ApiResult<CartPayload> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let update = req
        .parse_json::<UpdateQuantityPayload>()
        .await
        .map_err(|error| ApiError::bad_request(format!("invalid request body: {error}")))?;

    let cart = state
        .app
        .carts
        .update_quantity(
            buyer,
            update.item_id,
            update.quantity,
            update.expected_version,
        )
        .await
        .map_err(into_api_error)?;

    ok(CartPayload::from_cart(&cart).or_500("failed to total cart")?)
}

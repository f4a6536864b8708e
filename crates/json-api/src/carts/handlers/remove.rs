//! Remove Cart Item Handler

use std::sync::Arc;

use salvo::prelude::*;
use tracing::instrument;

use tiercart_app::wire::{CartPayload, RemoveItemPayload};

use crate::{
    carts::errors::into_api_error,
    extensions::*,
    responses::{ApiError, ApiResult, ok},
    state::State,
};

/// Remove Cart Item Handler
///
/// Removing a line that is not in the cart succeeds and returns the cart unchanged.
#[handler]
#[instrument(skip_all)]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> ApiResult<CartPayload> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let remove = req
        .parse_json::<RemoveItemPayload>()
        .await
        .map_err(|error| ApiError::bad_request(format!("invalid request body: {error}")))?;

    let cart = state
        .app
        .carts
        .remove_item(buyer, remove.item_id, remove.expected_version)
        .await
        .map_err(into_api_error)?;

    ok(CartPayload::from_cart(&cart).or_500("failed to total cart")?)
}

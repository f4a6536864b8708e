//! Add Cart Item Handler

use std::sync::Arc;

use salvo::prelude::*;
use tracing::instrument;

use tiercart_app::{
    domain::catalog::intake::build_line_item,
    wire::{AddItemPayload, CartPayload},
};

use crate::{
    carts::errors::{intake_error, into_api_error, payload_error},
    extensions::*,
    responses::{ApiError, ApiResult, ok},
    state::State,
};

/// Add Cart Item Handler
///
/// Prices a regular line from the catalog, or a bid line from its accepted quote, and
/// appends it to the cart.
#[handler]
#[instrument(skip_all)]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> ApiResult<CartPayload> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let payload = req
        .parse_json::<AddItemPayload>()
        .await
        .map_err(|error| ApiError::bad_request(format!("invalid request body: {error}")))?;

    let item = payload.into_add_item().map_err(|error| payload_error(&error))?;

    let line = build_line_item(state.app.catalog.as_ref(), item)
        .await
        .map_err(intake_error)?;

    let cart = state
        .app
        .carts
        .add_item(buyer, line)
        .await
        .map_err(into_api_error)?;

    ok(CartPayload::from_cart(&cart).or_500("failed to total cart")?)
}

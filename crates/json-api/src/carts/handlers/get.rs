//! Get Cart Handler

use std::sync::Arc;

use salvo::prelude::*;
use tracing::instrument;

use tiercart_app::wire::CartPayload;

use crate::{
    carts::errors::into_api_error,
    extensions::*,
    responses::{ApiResult, ok},
    state::State,
};

/// Get Cart Handler
///
/// Returns the buyer's cart, creating an empty one on first use.
#[handler]
#[instrument(skip_all)]
pub(crate) async fn handler(depot: &mut Depot) -> ApiResult<CartPayload> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let cart = state
        .app
        .carts
        .get_cart(buyer)
        .await
        .map_err(into_api_error)?;

    ok(CartPayload::from_cart(&cart).or_500("failed to total cart")?)
}

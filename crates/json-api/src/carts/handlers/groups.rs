//! Cart Groups Handler

use std::sync::Arc;

use salvo::prelude::*;
use tracing::instrument;

use tiercart::groups::group_cart;
use tiercart_app::wire::GroupPayload;

use crate::{
    carts::errors::into_api_error,
    extensions::*,
    responses::{ApiResult, ok},
    state::State,
};

/// Cart Groups Handler
///
/// Lines grouped by product and supplier, in order of first appearance.
#[handler]
#[instrument(skip_all)]
pub(crate) async fn handler(depot: &mut Depot) -> ApiResult<Vec<GroupPayload>> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let cart = state
        .app
        .carts
        .get_cart(buyer)
        .await
        .map_err(into_api_error)?;

    let groups = group_cart(&cart).or_500("failed to group cart")?;

    ok(groups.iter().map(GroupPayload::from_group).collect())
}

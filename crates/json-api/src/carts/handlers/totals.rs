//! Cart Totals Handler

use std::sync::Arc;

use salvo::prelude::*;
use tracing::instrument;

use tiercart::checkout::CheckoutFlow;
use tiercart_app::wire::TotalsPayload;

use crate::{
    checkout::errors::into_api_error,
    extensions::*,
    responses::{ApiError, ApiResult, ok},
    state::State,
};

/// Cart Totals Handler
///
/// Totals for `?flow=cart_preview` (the default) or `?flow=checkout`, with an optional
/// `promoCode` for flows that accept one.
#[handler]
#[instrument(skip_all)]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot) -> ApiResult<TotalsPayload> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let flow = match req.query::<String>("flow") {
        Some(flow) => flow
            .parse::<CheckoutFlow>()
            .map_err(|error| ApiError::bad_request(error.to_string()))?,
        None => CheckoutFlow::CartPreview,
    };

    let promo_code = req
        .query::<String>("promoCode")
        .filter(|code| !code.trim().is_empty());

    let quote = state
        .app
        .checkout
        .quote(buyer, flow, promo_code)
        .await
        .map_err(into_api_error)?;

    ok(TotalsPayload::from_totals(&quote.totals))
}

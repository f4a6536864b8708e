//! Create Checkout Handler

use std::sync::Arc;

use salvo::prelude::*;
use tracing::instrument;

use tiercart_app::{
    domain::checkout::CheckoutServiceError,
    wire::{CheckoutPayload, CheckoutResultPayload},
};

use crate::{
    checkout::errors::into_api_error,
    extensions::*,
    observability::{CheckoutOutcomeLabel, observe_checkout},
    responses::{ApiError, ApiResult, ok},
    state::State,
};

/// Create Checkout Handler
///
/// Places one order per supplier in the cart. When some supplier orders fail the checked-out
/// lines are still removed and the failures are listed under `warnings`.
#[handler]
#[instrument(skip_all)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> ApiResult<CheckoutResultPayload> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.buyer_uuid_or_401()?;

    let request = req
        .parse_json::<CheckoutPayload>()
        .await
        .map_err(|error| ApiError::bad_request(format!("invalid request body: {error}")))?;

    let outcome = match state.app.checkout.checkout(buyer, request).await {
        Ok(outcome) => outcome,
        Err(error) => {
            if matches!(error, CheckoutServiceError::Orders(_)) {
                observe_checkout(CheckoutOutcomeLabel::Failed);
            }

            return Err(into_api_error(error));
        }
    };

    observe_checkout(if outcome.is_partial() {
        CheckoutOutcomeLabel::Partial
    } else {
        CheckoutOutcomeLabel::Complete
    });

    ok(CheckoutResultPayload::from_outcome(&outcome))
}

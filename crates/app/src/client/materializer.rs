//! Checkout submission from the client side.

use tracing::{info, warn};

use tiercart::orders::{CheckoutForm, materialize};

use crate::{
    client::{errors::ClientError, gateway::CartGateway, store::CartStore},
    wire::CheckoutResultPayload,
};

/// Validates a checkout form and submits it against a [`CartStore`].
#[derive(Debug)]
pub struct OrderMaterializer<'s, G> {
    store: &'s mut CartStore<G>,
}

impl<'s, G: CartGateway> OrderMaterializer<'s, G> {
    /// Borrow `store` for one or more submissions.
    pub fn new(store: &'s mut CartStore<G>) -> Self {
        Self { store }
    }

    /// Validate the form, submit it, then reconcile the local cart.
    ///
    /// Nothing is sent when the form is invalid. The service removes every checked-out line
    /// even if some supplier orders failed, and keeps lines added in the meantime, so the
    /// store re-fetches rather than clearing. Supplier failures come back as warnings on
    /// the result, as does a failed re-fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidOrder`] for incomplete forms, or a gateway error when
    /// the checkout is rejected.
    pub async fn submit(&mut self, form: CheckoutForm) -> Result<CheckoutResultPayload, ClientError> {
        let request = materialize(form)?;

        let mut result = self.store.gateway().checkout(request).await?;

        info!(
            orders = result.orders.len(),
            warnings = result.warnings.len(),
            "checkout submitted"
        );

        if let Err(error) = self.store.refresh().await {
            warn!(%error, "cart not refreshed after checkout");

            result
                .warnings
                .push(format!("cart was not refreshed after checkout: {error}"));
        }

        Ok(result)
    }
}

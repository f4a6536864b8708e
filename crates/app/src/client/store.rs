//! Client-side cart store
//!
//! Owns the last reconciled snapshot of the buyer's cart. Every command is followed by
//! a full fetch, so the snapshot is always the server's state and never a local merge.

use tracing::debug;

use tiercart::{
    cart::Cart,
    checkout::{CheckoutConfig, CheckoutTotals, PricingBasis, PromoDiscount, calculate_totals},
    groups::{CartGroup, group_cart},
    uuids::LineItemUuid,
};

use crate::{
    client::{
        errors::{ClientError, GatewayError},
        gateway::CartGateway,
    },
    wire::{AddItemPayload, RemoveItemPayload, UpdateQuantityPayload},
};

/// The buyer's cart as last seen on the server, plus the gateway used to change it.
#[derive(Debug)]
pub struct CartStore<G> {
    gateway: G,
    snapshot: Option<Cart<'static>>,
}

impl<G: CartGateway> CartStore<G> {
    /// Create a store with no snapshot. Call [`CartStore::refresh`] to load one.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            snapshot: None,
        }
    }

    /// Gateway the store issues its commands through.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Last reconciled cart, if one has been fetched.
    pub fn cart(&self) -> Option<&Cart<'static>> {
        self.snapshot.as_ref()
    }

    /// Replace the snapshot with the server's current cart.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the fetch fails or the snapshot is invalid.
    pub async fn refresh(&mut self) -> Result<&Cart<'static>, ClientError> {
        let payload = self.gateway.fetch_cart().await?;
        let cart = payload.into_cart().map_err(ClientError::InvalidResponse)?;

        debug!(cart = %cart.uuid(), version = cart.version(), "cart reconciled");

        Ok(&*self.snapshot.insert(cart))
    }

    /// Add a line. Nothing is sent when the item is invalid.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] for invalid items or failed requests.
    pub async fn add_item(&mut self, item: AddItemPayload) -> Result<&Cart<'static>, ClientError> {
        if item.quantity < 1 {
            return Err(ClientError::InvalidQuantity(item.quantity));
        }

        item.clone()
            .into_add_item()
            .map_err(ClientError::InvalidItem)?;

        self.gateway.add_item(item).await?;

        self.refresh().await
    }

    /// Set a line's quantity; zero or less removes it. The request carries the snapshot's
    /// version, so a change made elsewhere since the last fetch is reported as a conflict
    /// after the snapshot has been refreshed.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the line is unknown to the server or a request fails.
    pub async fn update_quantity(
        &mut self,
        item: LineItemUuid,
        quantity: i64,
    ) -> Result<&Cart<'static>, ClientError> {
        if quantity <= 0 {
            return self.remove_item(item).await;
        }

        let update = UpdateQuantityPayload {
            item_id: item,
            quantity,
            expected_version: self.snapshot.as_ref().map(Cart::version),
        };

        if let Err(error) = self.gateway.update_quantity(update).await {
            if matches!(error, GatewayError::Conflict(_)) {
                self.refresh().await?;
            }

            return Err(error.into());
        }

        self.refresh().await
    }

    /// Remove a line. Removing a line the server does not know succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when a request fails.
    pub async fn remove_item(&mut self, item: LineItemUuid) -> Result<&Cart<'static>, ClientError> {
        let remove = RemoveItemPayload {
            item_id: item,
            expected_version: None,
        };

        match self.gateway.remove_item(remove).await {
            Ok(_) | Err(GatewayError::NotFound(_)) => {}
            Err(error) => return Err(error.into()),
        }

        self.refresh().await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when a request fails.
    pub async fn clear(&mut self) -> Result<&Cart<'static>, ClientError> {
        self.gateway.clear().await?;

        self.refresh().await
    }

    /// Display groups of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if a group total cannot be computed.
    pub fn groups(&self) -> Result<Vec<CartGroup<'_, 'static>>, ClientError> {
        match &self.snapshot {
            Some(cart) => Ok(group_cart(cart)?),
            None => Ok(Vec::new()),
        }
    }

    /// Totals for the cart page, priced at the stored unit prices.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the flow rejects the promo or amounts cannot be combined.
    pub fn preview_totals(
        &self,
        config: &CheckoutConfig<'static>,
        promo: Option<&PromoDiscount>,
    ) -> Result<CheckoutTotals<'static>, ClientError> {
        let groups = self.groups()?;

        Ok(calculate_totals(
            &groups,
            config,
            PricingBasis::StoredUnitPrice,
            promo,
        )?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use jiff::Timestamp;
    use mockall::{Sequence, predicate::eq};
    use rusty_money::{Money, iso::PKR};
    use testresult::TestResult;
    use tiercart::{
        checkout::PromoCodes,
        items::{LineItemDetails, LineItemKind, NewLineItem, StandardItem},
        uuids::{BuyerUuid, ProductUuid, SupplierUuid},
    };

    use crate::{client::gateway::MockCartGateway, wire::CartPayload};

    use super::*;

    pub(crate) fn snapshot(quantities: &[u32]) -> Result<CartPayload, Box<dyn std::error::Error>> {
        let mut cart = Cart::new(BuyerUuid::new(), PKR, Timestamp::UNIX_EPOCH);
        let product = ProductUuid::new();
        let supplier = SupplierUuid::new();

        for quantity in quantities {
            cart.add_item(
                NewLineItem {
                    details: LineItemDetails::new(product, "Cotton Tee", supplier, "Lahore Knits"),
                    kind: LineItemKind::Standard(StandardItem::default()),
                    quantity: *quantity,
                    unit_price: Money::from_minor(10_000, PKR),
                },
                Timestamp::UNIX_EPOCH,
            )?;
        }

        Ok(CartPayload::from_cart(&cart)?)
    }

    fn add(quantity: i64) -> AddItemPayload {
        AddItemPayload {
            product_id: ProductUuid::new(),
            quantity,
            ..AddItemPayload::default()
        }
    }

    #[tokio::test]
    async fn every_command_is_followed_by_a_full_fetch() -> TestResult {
        let before = snapshot(&[])?;
        let after = snapshot(&[12])?;
        let mut sequence = Sequence::new();
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_add_item()
            .once()
            .in_sequence(&mut sequence)
            .return_once(move |_| Ok(before));

        gateway
            .expect_fetch_cart()
            .once()
            .in_sequence(&mut sequence)
            .return_once(move || Ok(after));

        let mut store = CartStore::new(gateway);
        let cart = store.add_item(add(12)).await?;

        assert_eq!(cart.total_items(), 12);

        Ok(())
    }

    #[tokio::test]
    async fn invalid_quantities_never_reach_the_network() -> TestResult {
        let mut gateway = MockCartGateway::new();
        gateway.expect_add_item().never();
        gateway.expect_fetch_cart().never();

        let mut store = CartStore::new(gateway);
        let result = store.add_item(add(0)).await;

        assert!(matches!(result, Err(ClientError::InvalidQuantity(0))));
        assert!(result.is_err_and(|error| error.is_validation()));

        Ok(())
    }

    #[tokio::test]
    async fn incomplete_bids_never_reach_the_network() -> TestResult {
        let mut gateway = MockCartGateway::new();
        gateway.expect_add_item().never();

        let mut store = CartStore::new(gateway);

        let mut bid = add(50);
        bid.line_type = crate::wire::LineType::Bid;

        let result = store.add_item(bid).await;

        assert!(matches!(result, Err(ClientError::InvalidItem(_))));

        Ok(())
    }

    #[tokio::test]
    async fn removing_an_unknown_line_succeeds() -> TestResult {
        let item = LineItemUuid::new();
        let current = snapshot(&[5])?;
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_remove_item()
            .once()
            .with(eq(RemoveItemPayload {
                item_id: item,
                expected_version: None,
            }))
            .return_once(|_| Err(GatewayError::NotFound("cart item not found".to_string())));

        gateway
            .expect_fetch_cart()
            .once()
            .return_once(move || Ok(current));

        let mut store = CartStore::new(gateway);

        assert_eq!(store.remove_item(item).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn non_positive_updates_remove_the_line() -> TestResult {
        let item = LineItemUuid::new();
        let empty = snapshot(&[])?;
        let mut gateway = MockCartGateway::new();

        gateway.expect_update_quantity().never();
        gateway
            .expect_remove_item()
            .once()
            .return_once(|_| Err(GatewayError::NotFound("cart item not found".to_string())));
        gateway
            .expect_fetch_cart()
            .once()
            .return_once(move || Ok(empty));

        let mut store = CartStore::new(gateway);

        assert!(store.update_quantity(item, -3).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn updating_an_unknown_line_is_not_found() -> TestResult {
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_update_quantity()
            .once()
            .return_once(|_| Err(GatewayError::NotFound("cart item not found".to_string())));
        gateway.expect_fetch_cart().never();

        let mut store = CartStore::new(gateway);
        let result = store.update_quantity(LineItemUuid::new(), 4).await;

        assert!(matches!(
            result,
            Err(ClientError::Gateway(GatewayError::NotFound(_)))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn updates_carry_the_snapshot_version_and_refresh_on_conflict() -> TestResult {
        let first = snapshot(&[5])?;
        let version = first.version;
        let item = first.items.first().ok_or("expected a line")?.id;
        let second = snapshot(&[5, 7])?;

        let mut sequence = Sequence::new();
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_fetch_cart()
            .once()
            .in_sequence(&mut sequence)
            .return_once(move || Ok(first));

        gateway
            .expect_update_quantity()
            .once()
            .in_sequence(&mut sequence)
            .withf(move |update| update.expected_version == Some(version))
            .return_once(|_| Err(GatewayError::Conflict("cart was modified".to_string())));

        gateway
            .expect_fetch_cart()
            .once()
            .in_sequence(&mut sequence)
            .return_once(move || Ok(second));

        let mut store = CartStore::new(gateway);
        store.refresh().await?;

        let result = store.update_quantity(item, 9).await;

        assert!(matches!(
            result,
            Err(ClientError::Gateway(GatewayError::Conflict(_)))
        ));
        assert_eq!(store.cart().map(Cart::len), Some(2));

        Ok(())
    }

    #[tokio::test]
    async fn timeouts_are_reported_as_timeouts() -> TestResult {
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_clear()
            .once()
            .return_once(|| Err(GatewayError::Timeout));

        let mut store = CartStore::new(gateway);

        assert!(matches!(
            store.clear().await,
            Err(ClientError::Gateway(GatewayError::Timeout))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn preview_totals_run_locally() -> TestResult {
        let current = snapshot(&[10, 8])?;
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_fetch_cart()
            .once()
            .return_once(move || Ok(current));

        let mut store = CartStore::new(gateway);
        store.refresh().await?;

        let promo = PromoCodes::default().lookup("SAVE10")?;
        let totals = store.preview_totals(&CheckoutConfig::cart_preview(PKR), Some(&promo))?;

        assert_eq!(store.groups()?.len(), 1);
        assert_eq!(totals.subtotal, Money::from_minor(180_000, PKR));
        assert_eq!(totals.promo_discount, Money::from_minor(18_000, PKR));

        Ok(())
    }
}

//! In-memory carts service, for local runs and tests.

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use tokio::sync::RwLock;

use tiercart::{
    cart::Cart,
    items::NewLineItem,
    uuids::{BuyerUuid, LineItemUuid},
};

use crate::domain::carts::{errors::CartsServiceError, service::CartsService};

#[derive(Debug)]
pub struct MemoryCartsService {
    currency: &'static Currency,
    carts: RwLock<FxHashMap<BuyerUuid, Cart<'static>>>,
}

impl MemoryCartsService {
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            carts: RwLock::new(FxHashMap::default()),
        }
    }

    /// Apply `command` to the buyer's cart under the write lock. The stored cart is only
    /// replaced when the command succeeds.
    async fn mutate<F>(&self, buyer: BuyerUuid, command: F) -> Result<Cart<'static>, CartsServiceError>
    where
        F: FnOnce(&mut Cart<'static>, Timestamp) -> Result<(), CartsServiceError> + Send,
    {
        let now = Timestamp::now();
        let mut carts = self.carts.write().await;

        let mut cart = carts
            .get(&buyer)
            .cloned()
            .unwrap_or_else(|| Cart::new(buyer, self.currency, now));

        command(&mut cart, now)?;

        carts.insert(buyer, cart.clone());

        Ok(cart)
    }
}

#[async_trait]
impl CartsService for MemoryCartsService {
    async fn get_cart(&self, buyer: BuyerUuid) -> Result<Cart<'static>, CartsServiceError> {
        if let Some(cart) = self.carts.read().await.get(&buyer) {
            return Ok(cart.clone());
        }

        self.mutate(buyer, |_cart, _now| Ok(())).await
    }

    async fn add_item(
        &self,
        buyer: BuyerUuid,
        item: NewLineItem<'static>,
    ) -> Result<Cart<'static>, CartsServiceError> {
        self.mutate(buyer, |cart, now| {
            cart.add_item(item, now)?;

            Ok(())
        })
        .await
    }

    async fn update_quantity(
        &self,
        buyer: BuyerUuid,
        item: LineItemUuid,
        quantity: i64,
        expected_version: Option<u64>,
    ) -> Result<Cart<'static>, CartsServiceError> {
        self.mutate(buyer, |cart, now| {
            if let Some(expected) = expected_version {
                cart.check_version(expected)?;
            }

            cart.update_quantity(item, quantity, now)?;

            Ok(())
        })
        .await
    }

    async fn remove_item(
        &self,
        buyer: BuyerUuid,
        item: LineItemUuid,
        expected_version: Option<u64>,
    ) -> Result<Cart<'static>, CartsServiceError> {
        self.mutate(buyer, |cart, now| {
            if let Some(expected) = expected_version {
                cart.check_version(expected)?;
            }

            cart.remove_item(item, now);

            Ok(())
        })
        .await
    }

    async fn clear(&self, buyer: BuyerUuid) -> Result<Cart<'static>, CartsServiceError> {
        self.mutate(buyer, |cart, now| {
            cart.clear(now);

            Ok(())
        })
        .await
    }
}

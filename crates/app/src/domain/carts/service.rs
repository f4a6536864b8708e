//! Carts service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rusty_money::iso::Currency;
use sqlx::{Postgres, Transaction};
use tracing::debug;

use tiercart::{
    cart::Cart,
    items::NewLineItem,
    uuids::{BuyerUuid, LineItemUuid},
};

use crate::{
    database::Db,
    domain::carts::{
        errors::CartsServiceError,
        records::LineItemRecord,
        repositories::{PgCartItemsRepository, PgCartsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    currency: &'static Currency,
    carts_repository: PgCartsRepository,
    items_repository: PgCartItemsRepository,
}

impl PgCartsService {
    /// New carts are created in `currency`.
    #[must_use]
    pub fn new(db: Db, currency: &'static Currency) -> Self {
        Self {
            db,
            currency,
            carts_repository: PgCartsRepository::new(),
            items_repository: PgCartItemsRepository::new(),
        }
    }

    /// Create the cart if needed, lock it and rebuild the engine document.
    async fn load(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
        now: Timestamp,
    ) -> Result<Cart<'static>, CartsServiceError> {
        self.carts_repository
            .ensure_cart(tx, buyer, self.currency, now)
            .await?;

        let record = self.carts_repository.lock_cart(tx, buyer).await?;
        let currency = record.currency()?;
        let version = record.version()?;

        let items = self
            .items_repository
            .get_cart_items(tx, record.uuid)
            .await?
            .into_iter()
            .map(|item| item.into_line_item(currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::restore(
            record.uuid,
            record.buyer,
            currency,
            items,
            version,
            record.created_at,
            record.updated_at,
        )?)
    }

    /// Persist the cart's new version, failing if the stored row has moved on.
    async fn save_version(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: &Cart<'static>,
        previous: u64,
    ) -> Result<(), CartsServiceError> {
        let rows_affected = self
            .carts_repository
            .bump_version(
                tx,
                cart.uuid(),
                to_column(previous)?,
                to_column(cart.version())?,
                cart.updated_at(),
            )
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::Conflict(format!(
                "cart {} is no longer at version {previous}",
                cart.uuid()
            )));
        }

        Ok(())
    }
}

fn to_column(value: u64) -> Result<i64, CartsServiceError> {
    i64::try_from(value).map_err(|source| CartsServiceError::InvalidData(source.to_string()))
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, buyer: BuyerUuid) -> Result<Cart<'static>, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.load(&mut tx, buyer, Timestamp::now()).await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn add_item(
        &self,
        buyer: BuyerUuid,
        item: NewLineItem<'static>,
    ) -> Result<Cart<'static>, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.db.begin().await?;

        let mut cart = self.load(&mut tx, buyer, now).await?;
        let previous = cart.version();

        let id = cart.add_item(item, now)?;
        let line = cart.item(id).ok_or(CartsServiceError::NotFound)?;

        self.items_repository
            .create_cart_item(&mut tx, cart.uuid(), LineItemRecord::from_line(line)?)
            .await?;

        self.save_version(&mut tx, &cart, previous).await?;

        tx.commit().await?;

        debug!(cart = %cart.uuid(), item = %id, "added cart line");

        Ok(cart)
    }

    async fn update_quantity(
        &self,
        buyer: BuyerUuid,
        item: LineItemUuid,
        quantity: i64,
        expected_version: Option<u64>,
    ) -> Result<Cart<'static>, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.db.begin().await?;

        let mut cart = self.load(&mut tx, buyer, now).await?;
        let previous = cart.version();

        if let Some(expected) = expected_version {
            cart.check_version(expected)?;
        }

        if !cart.update_quantity(item, quantity, now)? {
            tx.commit().await?;

            return Ok(cart);
        }

        let rows_affected = match cart.item(item) {
            Some(line) => {
                self.items_repository
                    .update_cart_item_quantity(
                        &mut tx,
                        cart.uuid(),
                        item,
                        i64::from(line.quantity()),
                        line.total_price().to_minor_units(),
                    )
                    .await?
            }
            None => {
                self.items_repository
                    .delete_cart_item(&mut tx, cart.uuid(), item)
                    .await?
            }
        };

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        self.save_version(&mut tx, &cart, previous).await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn remove_item(
        &self,
        buyer: BuyerUuid,
        item: LineItemUuid,
        expected_version: Option<u64>,
    ) -> Result<Cart<'static>, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.db.begin().await?;

        let mut cart = self.load(&mut tx, buyer, now).await?;
        let previous = cart.version();

        if let Some(expected) = expected_version {
            cart.check_version(expected)?;
        }

        if cart.remove_item(item, now) {
            self.items_repository
                .delete_cart_item(&mut tx, cart.uuid(), item)
                .await?;

            self.save_version(&mut tx, &cart, previous).await?;
        }

        tx.commit().await?;

        Ok(cart)
    }

    async fn clear(&self, buyer: BuyerUuid) -> Result<Cart<'static>, CartsServiceError> {
        let now = Timestamp::now();
        let mut tx = self.db.begin().await?;

        let mut cart = self.load(&mut tx, buyer, now).await?;
        let previous = cart.version();

        if cart.clear(now) > 0 {
            self.items_repository
                .delete_cart_items(&mut tx, cart.uuid())
                .await?;

            self.save_version(&mut tx, &cart, previous).await?;
        }

        tx.commit().await?;

        Ok(cart)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the buyer's cart, creating an empty one on first use.
    async fn get_cart(&self, buyer: BuyerUuid) -> Result<Cart<'static>, CartsServiceError>;

    /// Append a line to the buyer's cart.
    async fn add_item(
        &self,
        buyer: BuyerUuid,
        item: NewLineItem<'static>,
    ) -> Result<Cart<'static>, CartsServiceError>;

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// When `expected_version` is given the cart must still be at that version.
    async fn update_quantity(
        &self,
        buyer: BuyerUuid,
        item: LineItemUuid,
        quantity: i64,
        expected_version: Option<u64>,
    ) -> Result<Cart<'static>, CartsServiceError>;

    /// Remove a line. Absent lines are not an error.
    async fn remove_item(
        &self,
        buyer: BuyerUuid,
        item: LineItemUuid,
        expected_version: Option<u64>,
    ) -> Result<Cart<'static>, CartsServiceError>;

    /// Remove every line.
    async fn clear(&self, buyer: BuyerUuid) -> Result<Cart<'static>, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::PKR};
    use testresult::TestResult;
    use tiercart::{
        items::{LineItemDetails, LineItemKind, StandardItem},
        uuids::{ProductUuid, SupplierUuid},
    };

    use crate::test::TestDb;

    use super::*;

    async fn service() -> TestResult<(TestDb, PgCartsService)> {
        let db = TestDb::new().await?;
        let service = PgCartsService::new(Db::new(db.pool.clone()), PKR);

        Ok((db, service))
    }

    fn line(quantity: u32, unit_minor: i64) -> NewLineItem<'static> {
        NewLineItem {
            details: LineItemDetails::new(
                ProductUuid::new(),
                "Denim Jacket",
                SupplierUuid::new(),
                "Faisalabad Mills",
            ),
            kind: LineItemKind::Standard(StandardItem::default()),
            quantity,
            unit_price: Money::from_minor(unit_minor, PKR),
        }
    }

    #[tokio::test]
    async fn carts_are_created_once_and_reloaded() -> TestResult {
        let (_db, service) = service().await?;
        let buyer = BuyerUuid::new();

        let first = service.get_cart(buyer).await?;
        let added = service.add_item(buyer, line(10, 11_000)).await?;
        let reloaded = service.get_cart(buyer).await?;

        assert!(first.is_empty());
        assert_eq!(first.uuid(), reloaded.uuid());
        assert_eq!(reloaded.version(), 1);
        assert_eq!(
            reloaded.items().iter().map(|item| (item.uuid(), item.quantity())).collect::<Vec<_>>(),
            added.items().iter().map(|item| (item.uuid(), item.quantity())).collect::<Vec<_>>()
        );

        Ok(())
    }

    #[tokio::test]
    async fn quantity_updates_are_persisted_with_their_total() -> TestResult {
        let (_db, service) = service().await?;
        let buyer = BuyerUuid::new();

        let cart = service.add_item(buyer, line(10, 11_000)).await?;
        let id = cart.items().first().ok_or("expected a line")?.uuid();

        service.update_quantity(buyer, id, 25, None).await?;

        let cart = service.get_cart(buyer).await?;
        let updated = cart.item(id).ok_or("expected the line")?;

        assert_eq!(updated.quantity(), 25);
        assert_eq!(updated.total_price(), &Money::from_minor(275_000, PKR));
        assert_eq!(cart.version(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn non_positive_quantity_deletes_the_row() -> TestResult {
        let (db, service) = service().await?;
        let buyer = BuyerUuid::new();

        let cart = service.add_item(buyer, line(3, 500)).await?;
        let id = cart.items().first().ok_or("expected a line")?.uuid();

        service.update_quantity(buyer, id, -2, None).await?;

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items")
            .fetch_one(&db.pool)
            .await?;

        assert_eq!(rows, 0);
        assert!(service.get_cart(buyer).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn removal_is_idempotent() -> TestResult {
        let (_db, service) = service().await?;
        let buyer = BuyerUuid::new();

        let cart = service.add_item(buyer, line(3, 500)).await?;
        let id = cart.items().first().ok_or("expected a line")?.uuid();

        let once = service.remove_item(buyer, id, None).await?;
        let twice = service.remove_item(buyer, id, None).await?;

        assert!(once.is_empty());
        assert_eq!(once.version(), twice.version());

        Ok(())
    }

    #[tokio::test]
    async fn stale_versions_are_rejected() -> TestResult {
        let (_db, service) = service().await?;
        let buyer = BuyerUuid::new();

        let stale = service.add_item(buyer, line(3, 500)).await?;
        let id = stale.items().first().ok_or("expected a line")?.uuid();

        service.add_item(buyer, line(1, 100)).await?;

        let update = service
            .update_quantity(buyer, id, 9, Some(stale.version()))
            .await;
        let removal = service.remove_item(buyer, id, Some(stale.version())).await;

        assert!(matches!(update, Err(CartsServiceError::Conflict(_))));
        assert!(matches!(removal, Err(CartsServiceError::Conflict(_))));
        assert_eq!(
            service.get_cart(buyer).await?.item(id).map(|item| item.quantity()),
            Some(3)
        );

        Ok(())
    }

    #[tokio::test]
    async fn updating_an_absent_line_is_not_found() -> TestResult {
        let (_db, service) = service().await?;

        let result = service
            .update_quantity(BuyerUuid::new(), LineItemUuid::new(), 4, None)
            .await;

        assert!(matches!(result, Err(CartsServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn clear_deletes_every_row() -> TestResult {
        let (db, service) = service().await?;
        let buyer = BuyerUuid::new();

        service.add_item(buyer, line(3, 500)).await?;
        service.add_item(buyer, line(5, 700)).await?;

        let cart = service.clear(buyer).await?;

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items")
            .fetch_one(&db.pool)
            .await?;

        assert!(cart.is_empty());
        assert_eq!(cart.version(), 3);
        assert_eq!(rows, 0);

        Ok(())
    }
}

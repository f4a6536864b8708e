//! Carts Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rusty_money::iso::Currency;
use sqlx::{Postgres, Transaction, query, query_as};

use tiercart::uuids::{BuyerUuid, CartUuid};

use crate::domain::carts::records::CartRecord;

const ENSURE_CART_SQL: &str = include_str!("../sql/ensure_cart.sql");
const LOCK_CART_SQL: &str = include_str!("../sql/lock_cart.sql");
const BUMP_CART_VERSION_SQL: &str = include_str!("../sql/bump_cart_version.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Create the buyer's cart if it does not exist yet.
    pub(crate) async fn ensure_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
        currency: &Currency,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        query(ENSURE_CART_SQL)
            .bind(CartUuid::new().into_uuid())
            .bind(buyer.into_uuid())
            .bind(currency.iso_alpha_code)
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Fetch the buyer's cart, holding a row lock until the transaction ends.
    pub(crate) async fn lock_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: BuyerUuid,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(LOCK_CART_SQL)
            .bind(buyer.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Move the cart from `from` to `to`. Returns the number of rows touched, which is
    /// zero when another writer got there first.
    pub(crate) async fn bump_version(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        from: i64,
        to: i64,
        updated_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(BUMP_CART_VERSION_SQL)
            .bind(cart.into_uuid())
            .bind(from)
            .bind(to)
            .bind(SqlxTimestamp::from(updated_at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

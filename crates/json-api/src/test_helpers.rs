//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use rusty_money::{Money, iso::PKR};
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use tiercart::{
    cart::{Cart, CartError},
    items::{LineItemDetails, LineItemKind, NewLineItem, StandardItem},
    uuids::{BuyerUuid, ProductUuid, SupplierUuid},
};
use tiercart_app::{
    context::AppContext,
    domain::{carts::MockCartsService, catalog::MockProductCatalog, checkout::MockCheckoutService},
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_BUYER_UUID: BuyerUuid = BuyerUuid::from_uuid(Uuid::nil());

#[salvo::handler]
pub(crate) async fn inject_buyer(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_buyer_uuid(TEST_BUYER_UUID);
    ctrl.call_next(req, depot, res).await;
}

/// Service mocks; any call without an expectation fails the test.
#[derive(Default)]
pub(crate) struct Mocks {
    pub(crate) carts: MockCartsService,
    pub(crate) catalog: MockProductCatalog,
    pub(crate) checkout: MockCheckoutService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            carts: Arc::new(self.carts),
            catalog: Arc::new(self.catalog),
            checkout: Arc::new(self.checkout),
        })
    }
}

pub(crate) fn service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_buyer)
            .push(route),
    )
}

pub(crate) fn tee_line(quantity: u32, unit_minor: i64) -> NewLineItem<'static> {
    NewLineItem {
        details: LineItemDetails::new(
            ProductUuid::from_uuid(Uuid::from_u128(1)),
            "Cotton Tee",
            SupplierUuid::from_uuid(Uuid::from_u128(2)),
            "Lahore Knits",
        ),
        kind: LineItemKind::Standard(StandardItem {
            color: Some("Red".to_string()),
            ..StandardItem::default()
        }),
        quantity,
        unit_price: Money::from_minor(unit_minor, PKR),
    }
}

pub(crate) fn cart_with(lines: Vec<NewLineItem<'static>>) -> Result<Cart<'static>, CartError> {
    let mut cart = Cart::new(TEST_BUYER_UUID, PKR, Timestamp::UNIX_EPOCH);

    for line in lines {
        cart.add_item(line, Timestamp::UNIX_EPOCH)?;
    }

    Ok(cart)
}

//! Checkout service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;
use tracing::{info, warn};

use tiercart::{
    cart::Cart,
    checkout::{
        CheckoutConfig, CheckoutFlow, CheckoutTotals, PricingBasis, PromoCodes, calculate_totals,
        price_lines,
    },
    groups::group_cart,
    items::LineItemKind,
    orders::CheckoutRequest,
    pricing::total_price,
    tiers::PriceBook,
    uuids::{BuyerUuid, SupplierUuid},
};

use crate::domain::{
    carts::{CartsService, CartsServiceError},
    catalog::{CatalogError, ProductCatalog},
    checkout::{
        errors::CheckoutServiceError,
        orders::{CreatedOrder, OrderDraft, OrderDraftLine, OrdersClient},
    },
};

/// Named flow configurations plus the promo-code table.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub cart_preview: CheckoutConfig<'static>,
    pub checkout: CheckoutConfig<'static>,
    pub promo_codes: PromoCodes,
}

impl CheckoutSettings {
    #[must_use]
    pub fn config(&self, flow: CheckoutFlow) -> &CheckoutConfig<'static> {
        match flow {
            CheckoutFlow::CartPreview => &self.cart_preview,
            CheckoutFlow::Checkout => &self.checkout,
        }
    }
}

/// A cart priced under one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct CartQuote {
    pub cart: Cart<'static>,
    pub totals: CheckoutTotals<'static>,
}

/// Raised when checkout leaves the cart and the created orders out of step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyWarning {
    /// A supplier's order failed while others succeeded. The cart is cleared regardless,
    /// so these lines have to be re-added by hand.
    SupplierOrderFailed {
        supplier: SupplierUuid,
        supplier_name: String,
        reason: String,
    },

    /// Orders were created but the cart still holds their lines.
    CartNotCleared { reason: String },

    /// Lines added while the orders were being placed were left in the cart.
    CartChangedDuringCheckout { kept: usize },
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SupplierOrderFailed {
                supplier,
                supplier_name,
                reason,
            } => write!(
                f,
                "order for {supplier_name} ({supplier}) failed and its lines were cleared: {reason}"
            ),
            Self::CartNotCleared { reason } => {
                write!(f, "orders were created but the cart was not cleared: {reason}")
            }
            Self::CartChangedDuringCheckout { kept } => {
                write!(f, "lines added during checkout were kept in the cart: {kept}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOutcome {
    pub orders: Vec<CreatedOrder>,
    pub totals: CheckoutTotals<'static>,
    pub warnings: Vec<ConsistencyWarning>,
}

impl CheckoutOutcome {
    /// Returns `true` when some supplier orders failed or the cart could not be cleared.
    pub fn is_partial(&self) -> bool {
        self.warnings.iter().any(|warning| {
            !matches!(warning, ConsistencyWarning::CartChangedDuringCheckout { .. })
        })
    }
}

pub struct DefaultCheckoutService {
    carts: Arc<dyn CartsService>,
    catalog: Arc<dyn ProductCatalog>,
    orders: Arc<dyn OrdersClient>,
    settings: CheckoutSettings,
}

impl DefaultCheckoutService {
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartsService>,
        catalog: Arc<dyn ProductCatalog>,
        orders: Arc<dyn OrdersClient>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            carts,
            catalog,
            orders,
            settings,
        }
    }

    /// Tier schedules for the catalog products in the cart. Products the catalog no
    /// longer knows keep their stored unit price.
    async fn price_book(&self, cart: &Cart<'static>) -> Result<PriceBook<'static>, CatalogError> {
        let mut book = PriceBook::new();
        let mut seen = FxHashSet::default();

        for item in cart.items() {
            if item.is_negotiated() || !seen.insert(item.product()) {
                continue;
            }

            match self.catalog.get_product(item.product()).await {
                Ok(product) => book.insert(product.uuid, product.pricing.schedule),
                Err(CatalogError::NotFound(product)) => {
                    warn!(%product, "cart product missing from catalog, keeping stored price");
                }
                Err(error) => return Err(error),
            }
        }

        Ok(book)
    }

    fn totals(
        &self,
        cart: &Cart<'static>,
        flow: CheckoutFlow,
        book: &PriceBook<'static>,
        promo_code: Option<&str>,
    ) -> Result<CheckoutTotals<'static>, CheckoutServiceError> {
        let groups = group_cart(cart)?;
        let config = self.settings.config(flow);

        let promo = promo_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| self.settings.promo_codes.lookup(code))
            .transpose()?;

        let basis = match flow {
            CheckoutFlow::CartPreview => PricingBasis::StoredUnitPrice,
            CheckoutFlow::Checkout => PricingBasis::TierResolved(book),
        };

        Ok(calculate_totals(&groups, config, basis, promo.as_ref())?)
    }

    /// Remove the snapshot's lines from the stored cart. Lines added since the snapshot
    /// stay put; their count is returned.
    async fn remove_checked_out(
        &self,
        buyer: BuyerUuid,
        snapshot: &Cart<'static>,
    ) -> Result<usize, CartsServiceError> {
        let mut kept = 0;

        for item in snapshot.items() {
            kept = self.carts.remove_item(buyer, item.uuid(), None).await?.len();
        }

        Ok(kept)
    }

    /// One draft per supplier, in order of first appearance, priced like the totals.
    fn drafts(
        cart: &Cart<'static>,
        book: &PriceBook<'static>,
        request: &CheckoutRequest,
    ) -> Result<Vec<OrderDraft>, CheckoutServiceError> {
        let groups = group_cart(cart)?;
        let priced = price_lines(&groups, PricingBasis::TierResolved(book), cart.currency())?;

        let mut drafts: Vec<(OrderDraft, Vec<_>)> = Vec::new();

        for line in &priced {
            let supplier = line.item.supplier();

            let position = match drafts.iter().position(|(draft, _)| draft.supplier == supplier) {
                Some(position) => position,
                None => {
                    drafts.push((
                        OrderDraft {
                            buyer: cart.buyer(),
                            supplier,
                            supplier_name: line.item.details().supplier_name.clone(),
                            currency: cart.currency().iso_alpha_code.to_string(),
                            lines: Vec::new(),
                            subtotal: 0,
                            shipping_address: request.shipping_address.clone(),
                            payment_method: request.payment_method.clone(),
                            shipping_method: request.shipping_method.clone(),
                            notes: request.notes.clone(),
                            is_dropshipping: request.is_dropshipping,
                            customer_address: request.customer_address.clone(),
                            dropshipping_instructions: request.dropshipping_instructions.clone(),
                        },
                        Vec::new(),
                    ));

                    drafts.len() - 1
                }
            };

            if let Some((draft, totals)) = drafts.get_mut(position) {
                totals.push(line.line_total);

                draft.lines.push(OrderDraftLine {
                    item_id: line.item.uuid(),
                    product: line.item.product(),
                    product_name: line.item.details().product_name.clone(),
                    variation: line.item.variation_display(),
                    quantity: line.item.quantity(),
                    unit_price: line.unit_price.to_minor_units(),
                    total_price: line.line_total.to_minor_units(),
                    request: match line.item.kind() {
                        LineItemKind::Negotiated(negotiated) => Some(negotiated.request),
                        LineItemKind::Standard(_) => None,
                    },
                });
            }
        }

        drafts
            .into_iter()
            .map(|(mut draft, totals)| {
                draft.subtotal = total_price(totals, cart.currency())?.to_minor_units();

                Ok(draft)
            })
            .collect()
    }
}

#[async_trait]
impl CheckoutService for DefaultCheckoutService {
    async fn quote(
        &self,
        buyer: BuyerUuid,
        flow: CheckoutFlow,
        promo_code: Option<String>,
    ) -> Result<CartQuote, CheckoutServiceError> {
        let cart = self.carts.get_cart(buyer).await?;

        let book = match flow {
            CheckoutFlow::CartPreview => PriceBook::new(),
            CheckoutFlow::Checkout => self.price_book(&cart).await?,
        };

        let totals = self.totals(&cart, flow, &book, promo_code.as_deref())?;

        Ok(CartQuote { cart, totals })
    }

    async fn checkout(
        &self,
        buyer: BuyerUuid,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutServiceError> {
        request.validate()?;

        let cart = self.carts.get_cart(buyer).await?;

        if cart.is_empty() {
            return Err(CheckoutServiceError::EmptyCart);
        }

        let book = self.price_book(&cart).await?;
        let totals = self.totals(&cart, CheckoutFlow::Checkout, &book, None)?;
        let drafts = Self::drafts(&cart, &book, &request)?;

        let mut orders = Vec::with_capacity(drafts.len());
        let mut failures = Vec::new();

        for draft in drafts {
            let supplier = draft.supplier;
            let supplier_name = draft.supplier_name.clone();

            match self.orders.create_order(draft).await {
                Ok(order) => orders.push(order),
                Err(error) => failures.push((supplier, supplier_name, error)),
            }
        }

        if orders.is_empty() {
            return Err(match failures.into_iter().next() {
                Some((_, _, error)) => CheckoutServiceError::Orders(error),
                None => CheckoutServiceError::EmptyCart,
            });
        }

        let mut warnings: Vec<ConsistencyWarning> = failures
            .into_iter()
            .map(|(supplier, supplier_name, error)| ConsistencyWarning::SupplierOrderFailed {
                supplier,
                supplier_name,
                reason: error.to_string(),
            })
            .collect();

        match self.remove_checked_out(buyer, &cart).await {
            Ok(0) => {}
            Ok(kept) => warnings.push(ConsistencyWarning::CartChangedDuringCheckout { kept }),
            Err(error) => warnings.push(ConsistencyWarning::CartNotCleared {
                reason: error.to_string(),
            }),
        }

        for warning in &warnings {
            warn!(%buyer, %warning, "partial checkout");
        }

        info!(
            %buyer,
            orders = orders.len(),
            failed = warnings.len(),
            total = totals.total.to_minor_units(),
            "checkout completed"
        );

        Ok(CheckoutOutcome {
            orders,
            totals,
            warnings,
        })
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Price the buyer's cart under a flow.
    async fn quote(
        &self,
        buyer: BuyerUuid,
        flow: CheckoutFlow,
        promo_code: Option<String>,
    ) -> Result<CartQuote, CheckoutServiceError>;

    /// Create one order per supplier and clear the cart once any order is accepted.
    async fn checkout(
        &self,
        buyer: BuyerUuid,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutServiceError>;
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::PKR};
    use testresult::TestResult;
    use tiercart::{
        items::{LineItemDetails, NewLineItem, StandardItem},
        orders::Address,
        uuids::ProductUuid,
    };

    use crate::domain::{
        carts::{MemoryCartsService, MockCartsService},
        catalog::{
            FixtureCatalog,
            fixtures::tests::{CATALOG, TEE},
            intake::{AddItem, AddItemKind, Selection, build_line_item},
        },
        checkout::orders::{MockOrdersClient, OrdersError},
    };

    use super::*;

    fn settings() -> CheckoutSettings {
        CheckoutSettings {
            cart_preview: CheckoutConfig::cart_preview(PKR),
            checkout: CheckoutConfig::checkout(PKR),
            promo_codes: PromoCodes::default(),
        }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: Address {
                full_name: "Ayesha Khan".to_string(),
                email: "ayesha@example.com".to_string(),
                phone: "+92 300 1234567".to_string(),
                street: "14 Mall Road".to_string(),
                city: "Lahore".to_string(),
                state: "Punjab".to_string(),
                postal_code: "54000".to_string(),
                country: "PK".to_string(),
            },
            payment_method: "bank_transfer".to_string(),
            shipping_method: "standard".to_string(),
            ..CheckoutRequest::default()
        }
    }

    fn other_supplier_line() -> NewLineItem<'static> {
        NewLineItem {
            details: LineItemDetails::new(
                ProductUuid::new(),
                "Canvas Tote",
                SupplierUuid::new(),
                "Karachi Canvas",
            ),
            kind: LineItemKind::Standard(StandardItem::default()),
            quantity: 20,
            unit_price: Money::from_minor(5_000, PKR),
        }
    }

    struct Fixture {
        carts: Arc<MemoryCartsService>,
        catalog: Arc<FixtureCatalog>,
        buyer: BuyerUuid,
    }

    impl Fixture {
        fn new() -> Result<Self, CatalogError> {
            Ok(Self {
                carts: Arc::new(MemoryCartsService::new(PKR)),
                catalog: Arc::new(FixtureCatalog::from_yaml_str(CATALOG)?),
                buyer: BuyerUuid::new(),
            })
        }

        async fn add_tee(&self, quantity: i64) -> TestResult {
            let line = build_line_item(
                self.catalog.as_ref(),
                AddItem {
                    product: TEE.parse()?,
                    quantity,
                    is_bulk_order: false,
                    kind: AddItemKind::Regular(Selection::default()),
                },
            )
            .await?;

            self.carts.add_item(self.buyer, line).await?;

            Ok(())
        }

        fn service(&self, orders: MockOrdersClient) -> DefaultCheckoutService {
            DefaultCheckoutService::new(
                self.carts.clone(),
                self.catalog.clone(),
                Arc::new(orders),
                settings(),
            )
        }
    }

    #[tokio::test]
    async fn cart_preview_uses_stored_prices_and_promo_codes() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.add_tee(10).await?;
        fixture.add_tee(45).await?;

        let quote = fixture
            .service(MockOrdersClient::new())
            .quote(fixture.buyer, CheckoutFlow::CartPreview, Some("save10".to_string()))
            .await?;

        assert_eq!(quote.totals.subtotal, Money::from_minor(605_000, PKR));
        assert_eq!(quote.totals.shipping, Money::from_minor(30_000, PKR));
        assert_eq!(quote.totals.promo_discount, Money::from_minor(60_500, PKR));
        assert_eq!(quote.totals.tax, None);
        assert_eq!(quote.totals.total, Money::from_minor(574_500, PKR));

        Ok(())
    }

    #[tokio::test]
    async fn checkout_flow_resolves_tiers_against_the_group_quantity() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.add_tee(10).await?;
        fixture.add_tee(45).await?;

        let quote = fixture
            .service(MockOrdersClient::new())
            .quote(fixture.buyer, CheckoutFlow::Checkout, None)
            .await?;

        assert_eq!(quote.totals.subtotal, Money::from_minor(550_000, PKR));
        assert_eq!(quote.totals.shipping, Money::from_minor(50_000, PKR));
        assert_eq!(quote.totals.tax, Some(Money::from_minor(93_500, PKR)));
        assert_eq!(quote.totals.total, Money::from_minor(693_500, PKR));

        Ok(())
    }

    #[tokio::test]
    async fn checkout_flow_rejects_promo_codes() -> TestResult {
        let fixture = Fixture::new()?;

        let result = fixture
            .service(MockOrdersClient::new())
            .quote(fixture.buyer, CheckoutFlow::Checkout, Some("SAVE10".to_string()))
            .await;

        assert!(matches!(
            result,
            Err(CheckoutServiceError::Totals(
                tiercart::checkout::CheckoutError::PromoNotSupported(CheckoutFlow::Checkout)
            ))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn invalid_requests_never_touch_the_cart() -> TestResult {
        let mut carts = MockCartsService::new();
        carts.expect_get_cart().never();
        carts.expect_clear().never();
        carts.expect_remove_item().never();

        let mut orders = MockOrdersClient::new();
        orders.expect_create_order().never();

        let service = DefaultCheckoutService::new(
            Arc::new(carts),
            Arc::new(FixtureCatalog::default()),
            Arc::new(orders),
            settings(),
        );

        let mut request = request();
        request.shipping_address.city = "  ".to_string();

        let result = service.checkout(BuyerUuid::new(), request).await;

        let Err(CheckoutServiceError::Validation(error)) = result else {
            return Err("expected a validation error".into());
        };

        assert_eq!(error.to_string(), "missing required field: city");

        Ok(())
    }

    #[tokio::test]
    async fn empty_carts_cannot_be_checked_out() -> TestResult {
        let fixture = Fixture::new()?;

        let mut orders = MockOrdersClient::new();
        orders.expect_create_order().never();

        let result = fixture.service(orders).checkout(fixture.buyer, request()).await;

        assert!(matches!(result, Err(CheckoutServiceError::EmptyCart)));

        Ok(())
    }

    #[tokio::test]
    async fn one_order_per_supplier_then_the_cart_is_cleared() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.add_tee(60).await?;
        fixture
            .carts
            .add_item(fixture.buyer, other_supplier_line())
            .await?;

        let mut orders = MockOrdersClient::new();
        orders.expect_create_order().times(2).returning(|draft| {
            Ok(CreatedOrder {
                id: format!("order-{}", draft.supplier_name),
                supplier: draft.supplier,
            })
        });

        let outcome = fixture.service(orders).checkout(fixture.buyer, request()).await?;

        assert_eq!(outcome.orders.len(), 2);
        assert!(!outcome.is_partial());
        assert!(fixture.carts.get_cart(fixture.buyer).await?.is_empty());

        // 60 tees at the 50-199 tier plus 20 totes at their stored price
        assert_eq!(outcome.totals.subtotal, Money::from_minor(700_000, PKR));

        Ok(())
    }

    #[tokio::test]
    async fn drafts_carry_tier_prices_and_supplier_subtotals() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.add_tee(30).await?;
        fixture.add_tee(30).await?;

        let cart = fixture.carts.get_cart(fixture.buyer).await?;
        let book = fixture.service(MockOrdersClient::new()).price_book(&cart).await?;

        let drafts = DefaultCheckoutService::drafts(&cart, &book, &request())?;
        let draft = drafts.first().ok_or("expected a draft")?;

        assert_eq!(drafts.len(), 1);
        assert_eq!(draft.supplier_name, "Lahore Knits");
        assert_eq!(draft.currency, "PKR");
        assert_eq!(draft.subtotal, 600_000);
        assert!(draft.lines.iter().all(|line| line.unit_price == 10_000));

        Ok(())
    }

    #[tokio::test]
    async fn partial_failures_still_clear_the_cart_with_a_warning() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.add_tee(60).await?;
        fixture
            .carts
            .add_item(fixture.buyer, other_supplier_line())
            .await?;

        let mut orders = MockOrdersClient::new();
        orders.expect_create_order().times(2).returning(|draft| {
            if draft.supplier_name == "Karachi Canvas" {
                Err(OrdersError::Timeout)
            } else {
                Ok(CreatedOrder {
                    id: "order-1".to_string(),
                    supplier: draft.supplier,
                })
            }
        });

        let outcome = fixture.service(orders).checkout(fixture.buyer, request()).await?;

        assert_eq!(outcome.orders.len(), 1);
        assert!(outcome.is_partial());
        assert!(matches!(
            outcome.warnings.as_slice(),
            [ConsistencyWarning::SupplierOrderFailed { supplier_name, .. }] if supplier_name == "Karachi Canvas"
        ));
        assert!(fixture.carts.get_cart(fixture.buyer).await?.is_empty());

        Ok(())
    }

    /// Adds a line to the buyer's cart while the order is being placed.
    struct AddsLineWhileOrdering {
        carts: Arc<MemoryCartsService>,
        buyer: BuyerUuid,
    }

    #[async_trait]
    impl OrdersClient for AddsLineWhileOrdering {
        async fn create_order(&self, draft: OrderDraft) -> Result<CreatedOrder, OrdersError> {
            self.carts
                .add_item(self.buyer, other_supplier_line())
                .await
                .map_err(|error| OrdersError::Rejected(error.to_string()))?;

            Ok(CreatedOrder {
                id: "order-1".to_string(),
                supplier: draft.supplier,
            })
        }
    }

    #[tokio::test]
    async fn lines_added_during_checkout_stay_in_the_cart() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.add_tee(60).await?;

        let service = DefaultCheckoutService::new(
            fixture.carts.clone(),
            fixture.catalog.clone(),
            Arc::new(AddsLineWhileOrdering {
                carts: fixture.carts.clone(),
                buyer: fixture.buyer,
            }),
            settings(),
        );

        let outcome = service.checkout(fixture.buyer, request()).await?;

        assert_eq!(outcome.orders.len(), 1);
        assert_eq!(
            outcome.warnings,
            vec![ConsistencyWarning::CartChangedDuringCheckout { kept: 1 }]
        );
        assert!(!outcome.is_partial());

        let cart = fixture.carts.get_cart(fixture.buyer).await?;
        let kept = cart.items().first().ok_or("expected the new line")?;

        assert_eq!(cart.len(), 1);
        assert_eq!(kept.details().product_name, "Canvas Tote");

        Ok(())
    }

    #[tokio::test]
    async fn failed_line_removal_is_reported_as_not_cleared() -> TestResult {
        let buyer = BuyerUuid::new();
        let mut cart = Cart::new(buyer, PKR, jiff::Timestamp::now());
        cart.add_item(other_supplier_line(), jiff::Timestamp::now())?;

        let mut carts = MockCartsService::new();
        carts
            .expect_get_cart()
            .once()
            .return_once(move |_| Ok(cart));
        carts
            .expect_remove_item()
            .once()
            .return_once(|_, _, _| Err(CartsServiceError::Conflict("busy".to_string())));

        let mut orders = MockOrdersClient::new();
        orders.expect_create_order().once().returning(|draft| {
            Ok(CreatedOrder {
                id: "order-1".to_string(),
                supplier: draft.supplier,
            })
        });

        let service = DefaultCheckoutService::new(
            Arc::new(carts),
            Arc::new(FixtureCatalog::default()),
            Arc::new(orders),
            settings(),
        );

        let outcome = service.checkout(buyer, request()).await?;

        assert!(outcome.is_partial());
        assert!(matches!(
            outcome.warnings.as_slice(),
            [ConsistencyWarning::CartNotCleared { .. }]
        ));

        Ok(())
    }

    #[tokio::test]
    async fn total_failure_keeps_the_cart() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.add_tee(60).await?;

        let mut orders = MockOrdersClient::new();
        orders
            .expect_create_order()
            .once()
            .return_once(|_| Err(OrdersError::Rejected("supplier closed".to_string())));

        let result = fixture.service(orders).checkout(fixture.buyer, request()).await;

        assert!(matches!(result, Err(CheckoutServiceError::Orders(_))));
        assert_eq!(fixture.carts.get_cart(fixture.buyer).await?.len(), 1);

        Ok(())
    }

    #[test]
    fn consistency_warnings_name_the_supplier() {
        let warning = ConsistencyWarning::SupplierOrderFailed {
            supplier: SupplierUuid::from_uuid(uuid::Uuid::nil()),
            supplier_name: "Karachi Canvas".to_string(),
            reason: "order service timed out".to_string(),
        };

        assert_eq!(
            warning.to_string(),
            "order for Karachi Canvas (00000000-0000-0000-0000-000000000000) failed and its lines were cleared: order service timed out"
        );
    }
}

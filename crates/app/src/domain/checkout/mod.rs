//! Checkout

pub mod errors;
pub mod orders;
pub mod service;

pub use errors::CheckoutServiceError;
pub use orders::{
    CreatedOrder, HttpOrdersClient, MockOrdersClient, OrderDraft, OrderDraftLine, OrdersClient,
    OrdersError,
};
pub use service::*;

//! Buyer-side cart client
//!
//! A [`CartStore`] keeps the last reconciled cart snapshot for one buyer and talks to the
//! cart service through a [`CartGateway`]. [`OrderMaterializer`] validates checkout forms
//! against it before anything is submitted.

pub mod errors;
pub mod gateway;
pub mod materializer;
pub mod store;

pub use errors::{ClientError, GatewayError};
pub use gateway::*;
pub use materializer::OrderMaterializer;
pub use store::CartStore;

//! Checkout routes

pub(crate) mod errors;
mod handlers;

pub(crate) use handlers::create;

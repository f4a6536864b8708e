//! Cart routes

pub(crate) mod errors;
mod handlers;

pub(crate) use handlers::{add, clear, get, groups, remove, totals, update};

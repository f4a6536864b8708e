//! Carts

pub mod errors;
mod memory;
mod records;
mod repositories;
pub mod service;

pub use errors::CartsServiceError;
pub use memory::MemoryCartsService;
pub use service::*;

//! Shared cart domain, persistence, wire types and the buyer-side client.

pub mod client;
pub mod context;
pub mod database;
pub mod domain;
#[cfg(test)]
mod test;
pub mod wire;

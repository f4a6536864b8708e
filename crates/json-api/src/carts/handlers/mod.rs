//! Cart Handlers

pub(crate) mod add;
pub(crate) mod clear;
pub(crate) mod get;
pub(crate) mod groups;
pub(crate) mod remove;
pub(crate) mod totals;
pub(crate) mod update;

//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::Depot;

use tiercart::uuids::BuyerUuid;

use crate::responses::ApiError;

const BUYER_DEPOT_KEY: &str = "buyer_uuid";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError>;

    fn insert_buyer_uuid(&mut self, buyer: BuyerUuid);

    fn buyer_uuid_or_401(&self) -> Result<BuyerUuid, ApiError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError> {
        self.obtain::<T>()
            .map_err(|_ignored| ApiError::internal())
    }

    fn insert_buyer_uuid(&mut self, buyer: BuyerUuid) {
        self.insert(BUYER_DEPOT_KEY, buyer);
    }

    fn buyer_uuid_or_401(&self) -> Result<BuyerUuid, ApiError> {
        self.get::<BuyerUuid>(BUYER_DEPOT_KEY)
            .copied()
            .map_err(|_ignored| ApiError::unauthorized("buyer identity is required"))
    }
}

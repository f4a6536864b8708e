//! Shared handler state, injected into the depot once per request.

use std::sync::Arc;

use tiercart_app::context::AppContext;

pub(crate) struct State {
    /// Cart, catalog and checkout services
    pub(crate) app: AppContext,
}

impl State {
    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(Self { app })
    }
}

//! App Router

use salvo::Router;

use crate::{buyer, carts, checkout, healthcheck, observability::metrics_handler};

/// Public routes plus everything behind the buyer middleware.
pub fn app_router(metrics_enabled: bool) -> Router {
    let mut router = Router::new().push(Router::with_path("healthcheck").get(healthcheck::handler));

    if metrics_enabled {
        router = router.push(Router::with_path("metrics").get(metrics_handler));
    }

    router.push(
        Router::new()
            .hoop(buyer::handler)
            .push(
                Router::with_path("cart")
                    .get(carts::get::handler)
                    .post(carts::add::handler)
                    .patch(carts::update::handler)
                    .delete(carts::remove::handler)
                    .push(Router::with_path("clear").post(carts::clear::handler))
                    .push(Router::with_path("groups").get(carts::groups::handler))
                    .push(Router::with_path("totals").get(carts::totals::handler)),
            )
            .push(Router::with_path("checkout").post(checkout::create::handler)),
    )
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use serde_json::Value;
    use testresult::TestResult;

    use crate::test_helpers::Mocks;

    use super::*;

    fn make_service(metrics_enabled: bool) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(Mocks::default().into_state()))
                .push(app_router(metrics_enabled)),
        )
    }

    #[tokio::test]
    async fn test_healthcheck_needs_no_buyer() -> TestResult {
        let res = TestClient::get("http://example.com/healthcheck")
            .send(&make_service(false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_cart_routes_require_a_buyer() -> TestResult {
        let mut res = TestClient::get("http://example.com/cart")
            .send(&make_service(false))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(body["success"], false);

        Ok(())
    }

    #[tokio::test]
    async fn test_metrics_route_is_optional() -> TestResult {
        let res = TestClient::get("http://example.com/metrics")
            .send(&make_service(false))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        let res = TestClient::get("http://example.com/metrics")
            .send(&make_service(true))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }
}

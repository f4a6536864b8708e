//! Buyer identity middleware.
//!
//! The session layer in front of this service authenticates buyers and forwards their
//! identity in the `x-buyer-uuid` header.

use salvo::{prelude::*, writing::Scribe};

use tiercart::uuids::BuyerUuid;
use tiercart_app::client::BUYER_HEADER;

use crate::{extensions::*, responses::ApiError};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(buyer) = extract_buyer(req) else {
        ApiError::unauthorized(format!("missing or invalid {BUYER_HEADER} header")).render(res);
        ctrl.skip_rest();

        return;
    };

    depot.insert_buyer_uuid(buyer);

    ctrl.call_next(req, depot, res).await;
}

fn extract_buyer(req: &Request) -> Option<BuyerUuid> {
    req.headers()
        .get(BUYER_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use testresult::TestResult;

    use super::*;

    #[salvo::handler]
    async fn echo_buyer(depot: &mut Depot, res: &mut Response) {
        let buyer = depot
            .buyer_uuid_or_401()
            .map_or_else(|_error| "missing".to_string(), |uuid| uuid.to_string());

        res.render(buyer);
    }

    fn service() -> Service {
        Service::new(Router::new().hoop(handler).push(Router::new().get(echo_buyer)))
    }

    #[tokio::test]
    async fn missing_buyer_header_returns_401() -> TestResult {
        let mut res = TestClient::get("http://example.com").send(&service()).await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(body["success"], Value::Bool(false));

        Ok(())
    }

    #[tokio::test]
    async fn malformed_buyer_header_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .add_header(BUYER_HEADER, "not-a-uuid", true)
            .send(&service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn buyer_is_stored_in_the_depot() -> TestResult {
        let buyer = BuyerUuid::new();

        let body = TestClient::get("http://example.com")
            .add_header(BUYER_HEADER, buyer.to_string(), true)
            .send(&service())
            .await
            .take_string()
            .await?;

        assert_eq!(body, buyer.to_string());

        Ok(())
    }
}

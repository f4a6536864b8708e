//! Envelope responses
//!
//! Every handler answers `{ "success": true, "data": .. }` or
//! `{ "success": false, "error": ".." }`.

use salvo::{
    http::StatusCode,
    prelude::{Json, Response},
    writing::Scribe,
};

use tiercart_app::wire::Envelope;

pub(crate) type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::ok(data)))
}

/// A failure rendered as an error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub(crate) fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub(crate) fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }

    /// The message never carries the underlying cause; log it before converting.
    pub(crate) fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }

    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

impl Scribe for ApiError {
    fn render(self, res: &mut Response) {
        res.status_code(self.status);
        res.render(Json(Envelope::<()>::error(self.message)));
    }
}

#[cfg(test)]
mod tests {
    use salvo::{
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use super::*;

    #[handler]
    async fn conflict() -> ApiResult<u32> {
        Err(ApiError::conflict("cart was modified"))
    }

    #[handler]
    async fn answer() -> ApiResult<u32> {
        ok(42)
    }

    fn service() -> Service {
        Service::new(
            Router::new()
                .push(Router::with_path("conflict").get(conflict))
                .push(Router::with_path("answer").get(answer)),
        )
    }

    #[tokio::test]
    async fn errors_render_as_failure_envelopes() -> TestResult {
        let mut res = TestClient::get("http://example.com/conflict")
            .send(&service())
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
        assert_eq!(body, json!({ "success": false, "error": "cart was modified" }));

        Ok(())
    }

    #[tokio::test]
    async fn data_renders_as_success_envelopes() -> TestResult {
        let mut res = TestClient::get("http://example.com/answer")
            .send(&service())
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "success": true, "data": 42 }));

        Ok(())
    }
}

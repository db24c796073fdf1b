/// Development-mode error detail
///
/// Internal errors always respond with a generic message. In development the
/// detail recorded by [`ApiError::InternalError`](crate::error::ApiError) is
/// copied into the body as `stack`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::Environment;
use crate::error::{ErrorResponse, InternalErrorDetail, INTERNAL_ERROR_MESSAGE};

pub async fn error_detail_layer(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if environment.is_production() {
        return response;
    }

    match response.extensions_mut().remove::<InternalErrorDetail>() {
        Some(InternalErrorDetail(detail)) => {
            let status = response.status();
            let body = ErrorResponse {
                stack: Some(detail),
                ..ErrorResponse::new(INTERNAL_ERROR_MESSAGE)
            };
            (status, Json(body)).into_response()
        }
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn failing() -> Result<(), ApiError> {
        Err(ApiError::InternalError("pool timed out".to_string()))
    }

    async fn stack_for(environment: Environment) -> Option<String> {
        let app = Router::new()
            .route("/", get(failing))
            .layer(middleware::from_fn_with_state(environment, error_detail_layer));

        let response = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
        body["stack"].as_str().map(str::to_string)
    }

    #[tokio::test]
    async fn test_stack_attached_in_development() {
        assert_eq!(
            stack_for(Environment::Development).await.as_deref(),
            Some("pool timed out")
        );
    }

    #[tokio::test]
    async fn test_stack_withheld_in_production() {
        assert_eq!(stack_for(Environment::Production).await, None);
    }
}

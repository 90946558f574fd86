//! # Development-Mode Error Detail
//!
//! `AppError` never puts the cause of an internal error in the response
//! body. It leaves an [`InternalCause`] in the response extensions instead;
//! when the service runs with `APP_ENV=development` this layer rebuilds
//! the body with the cause under `error.stack`.

use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{ErrorBody, InternalCause, INTERNAL_MESSAGE};

/// `map_response` hook. Responses without an internal cause pass through.
pub async fn attach_stack(response: Response) -> Response {
    let Some(InternalCause { code, cause }) = response.extensions().get::<InternalCause>().cloned()
    else {
        return response;
    };

    let status = response.status();
    let mut body = ErrorBody::new(code, INTERNAL_MESSAGE);
    body.error.stack = Some(cause);
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn internal_errors_gain_stack() {
        let response = AppError::Internal("pool exhausted".into()).into_response();
        let response = attach_stack(response).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_of(response).await;
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"]["message"], INTERNAL_MESSAGE);
        assert!(json["error"]["stack"]
            .as_str()
            .unwrap()
            .contains("pool exhausted"));
    }

    #[tokio::test]
    async fn other_responses_pass_through() {
        let response = AppError::RouteNotFound("/x".into()).into_response();
        let response = attach_stack(response).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_of(response).await;
        assert!(json["error"].get("stack").is_none());
    }
}

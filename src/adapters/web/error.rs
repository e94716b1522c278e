//! HTTP error responses for the web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::FinboardError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<FinboardError> for WebError {
    fn from(err: FinboardError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

pub fn status_from_error(err: &FinboardError) -> StatusCode {
    match err {
        FinboardError::ConfigParse { .. }
        | FinboardError::ConfigMissing { .. }
        | FinboardError::ConfigInvalid { .. }
        | FinboardError::HoldingEntry { .. } => StatusCode::BAD_REQUEST,
        FinboardError::UnknownTicker { .. }
        | FinboardError::InsufficientData { .. }
        | FinboardError::UnknownFund(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FinboardError::DataSource { .. } => StatusCode::BAD_GATEWAY,
        FinboardError::Cache { .. } | FinboardError::Holdings { .. } | FinboardError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = super::templates::ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

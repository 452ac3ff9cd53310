use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;
use crate::utils::{error_codes, error_to_api_response};

/// CSV 上传格式错误，row 为从 0 开始的行号
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("row {row}: expected 2 fields, found {fields}")]
    FieldCount { row: usize, fields: usize },
    #[error("row {row}: index {index:?} is not of the form <article>-<task>")]
    CompoundIndex { row: usize, index: String },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("malformed csv: {0}")]
    Format(#[from] FormatError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Format(_) | Self::InvalidInput(_) => error_codes::VALIDATION_ERROR,
            Self::NotFound { .. } => error_codes::NOT_FOUND,
            Self::Conflict(_) => error_codes::CONFLICT,
            Self::Store(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { collection, key } => {
                Self::Conflict(format!("{collection}.{key} already taken, retry the request"))
            }
            other => Self::Store(other),
        }
    }
}

// 请求体无法解析时同样按参数错误返回
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

// 对外统一返回 400，具体类型通过 code 区分
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        tracing::warn!("Request failed: {}", self);
        (
            StatusCode::BAD_REQUEST,
            error_to_api_response::<()>(self.code(), self.to_string()),
        )
            .into_response()
    }
}

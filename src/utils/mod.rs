use axum::Json;
use axum::extract::FromRequest;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

/// JSON 请求体提取器，解析失败时返回统一的错误格式
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ServiceError))]
pub struct ApiJson<T>(pub T);

// 所有 handler 统一返回 Json<ApiResponse<T>>
pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

/// 前端有时把数字 id 作为字符串提交，两种形式都接受
pub fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(v) => Ok(v),
        IntOrString::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const CONFLICT: i32 = 1006;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct ProjectRef {
        #[serde(deserialize_with = "int_or_string")]
        project_id: i64,
    }

    #[test]
    fn project_id_accepts_number_or_string() {
        let a: ProjectRef = serde_json::from_str(r#"{"projectId": 4}"#).unwrap();
        let b: ProjectRef = serde_json::from_str(r#"{"projectId": " 4"}"#).unwrap();
        assert_eq!(a.project_id, 4);
        assert_eq!(b.project_id, 4);
        assert!(serde_json::from_str::<ProjectRef>(r#"{"projectId": "four"}"#).is_err());
    }

    #[test]
    fn error_envelope_omits_payload() {
        let Json(body) = error_to_api_response::<()>(error_codes::NOT_FOUND, "gone".into());
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["code"], 1004);
        assert!(value.get("resp_data").is_none());
    }
}

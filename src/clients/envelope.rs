/// 后端统一响应格式 `{ success, message, ... }` 的解析
use crate::error::{ApiError, AppError, AppResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 未携带 message 时使用的提示
const UNKNOWN_FAILURE: &str = "未知错误";

/// 检查响应是否成功
pub fn is_success_response(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(false)
}

/// 提取服务端的错误说明
pub fn extract_message(body: &Value) -> Option<&str> {
    body.get("message").and_then(Value::as_str)
}

/// 校验 success 字段，失败时转换为 `ApiError::Rejected`
pub fn ensure_success(endpoint: &str, status: Option<u16>, body: &Value) -> AppResult<()> {
    if is_success_response(body) {
        Ok(())
    } else {
        Err(AppError::api_rejected(
            endpoint,
            status,
            extract_message(body).unwrap_or(UNKNOWN_FAILURE),
        ))
    }
}

/// 校验成功后取出指定字段并反序列化
pub fn take_field<T: DeserializeOwned>(endpoint: &str, body: &mut Value, field: &str) -> AppResult<T> {
    let value = body
        .get_mut(field)
        .map(Value::take)
        .filter(|v| !v.is_null())
        .ok_or_else(|| {
            AppError::Api(ApiError::MissingField {
                endpoint: endpoint.to_string(),
                field: field.to_string(),
            })
        })?;
    Ok(serde_json::from_value(value)?)
}

/// 解析完整信封：先校验 success，再整体反序列化
pub fn parse_body<T: DeserializeOwned>(endpoint: &str, status: Option<u16>, body: Value) -> AppResult<T> {
    ensure_success(endpoint, status, &body)?;
    Ok(serde_json::from_value(body)?)
}

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Uniform body returned by every route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T = serde_json::Value> {
    pub error: bool,
    pub message: String,
    pub status: u16,
    pub data: Option<T>,
}

pub fn generate<T>(
    is_error: bool,
    message: impl Into<String>,
    status: StatusCode,
    data: Option<T>,
) -> Envelope<T> {
    Envelope {
        error: is_error,
        message: message.into(),
        status: status.as_u16(),
        data,
    }
}

/// Success envelope with a 200 status.
pub fn ok<T>(message: impl Into<String>, data: Option<T>) -> Envelope<T> {
    generate(false, message, StatusCode::OK, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_payload_serializes_all_four_fields() {
        let env = generate::<()>(true, "User not found", StatusCode::NOT_FOUND, None);
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({"error": true, "message": "User not found", "status": 404, "data": null})
        );
    }

    #[test]
    fn string_payload_is_kept_verbatim() {
        let env = ok("sent", Some("http://localhost/users/reset/abc".to_string()));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["data"], "http://localhost/users/reset/abc");
        assert_eq!(value["status"], 200);
        assert_eq!(value["error"], false);
    }
}

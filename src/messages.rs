/// Cross-surface messages routed through the background dispatcher
///
/// Requests are tagged objects (`{"type": "LAUNCH_TEMPLATE", ...}`); every
/// request resolves to a `{success, ...}` response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    LaunchTemplate { template_id: String },
    SaveCurrentTabs { name: String },
    GetStartupBehavior,
    TriggerSaveCurrent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten, default)]
    pub data: Option<Value>,
}

impl Response {
    pub fn ok() -> Response {
        Response {
            success: true,
            error: None,
            data: None,
        }
    }

    pub fn ok_with(data: Value) -> Response {
        Response {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn err(error: &Error) -> Response {
        Response {
            success: false,
            error: Some(error.to_string()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::json!({
            "type": "LAUNCH_TEMPLATE",
            "templateId": "abc-123",
        });

        let request: Request = serde_json::from_value(json).unwrap();
        assert_eq!(
            request,
            Request::LaunchTemplate {
                template_id: "abc-123".to_string()
            }
        );
    }

    #[test]
    fn test_payload_free_requests() {
        let behavior: Request =
            serde_json::from_value(serde_json::json!({"type": "GET_STARTUP_BEHAVIOR"})).unwrap();
        assert_eq!(behavior, Request::GetStartupBehavior);

        let trigger: Request =
            serde_json::from_value(serde_json::json!({"type": "TRIGGER_SAVE_CURRENT"})).unwrap();
        assert_eq!(trigger, Request::TriggerSaveCurrent);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<Request, _> =
            serde_json::from_value(serde_json::json!({"type": "EXPLODE"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_serialization() {
        let ok = serde_json::to_value(Response::ok()).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true}));

        let with_data =
            serde_json::to_value(Response::ok_with(serde_json::json!({"opened": 3}))).unwrap();
        assert_eq!(with_data, serde_json::json!({"success": true, "opened": 3}));

        let err = serde_json::to_value(Response::err(&Error::NotFound("x".to_string()))).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "template not found: x");
    }
}

use serde::{Deserialize, Serialize};

/// Một tin nhắn chat trong một phòng.
///
/// `timestamp` (epoch millis) vừa là khóa sắp xếp vừa là khóa chống trùng lặp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Server không trả về `room` khi poll; engine tự điền phòng đang poll.
    #[serde(default)]
    pub room: String,
    pub username: String,
    pub message: String,
    pub timestamp: i64,
}

/// Body của request gửi tin nhắn.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest<'a> {
    pub room: &'a str,
    pub username: &'a str,
    pub message: &'a str,
}

/// Phản hồi JSON của endpoint poll.
#[derive(Debug, Clone, Deserialize)]
pub struct PollResponse {
    pub success: bool,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_response_without_room_defaults_to_empty() {
        let json = r#"{"success":true,"messages":[{"username":"an","message":"hi","timestamp":100}]}"#;
        let response: PollResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].room, "");
        assert_eq!(response.messages[0].timestamp, 100);
        assert!(response.error.is_none());
    }

    #[test]
    fn poll_response_missing_messages_is_rejected() {
        let json = r#"{"success":true}"#;
        assert!(serde_json::from_str::<PollResponse>(json).is_err());
    }

    #[test]
    fn submit_request_serializes_three_fields() {
        let body = SubmitRequest {
            room: "general",
            username: "an",
            message: "xin chào",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"room": "general", "username": "an", "message": "xin chào"})
        );
    }
}

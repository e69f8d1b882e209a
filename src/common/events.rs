use super::types::ChatMessage;

/// Sự kiện từ tầng mạng gửi lên UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Một tin nhắn mới thật sự (đã lọc trùng theo timestamp).
    MessageReceived(ChatMessage),
    /// Chỉ phát khi trạng thái kết nối thay đổi, không phải mỗi lần poll.
    ConnectionChanged(bool),
    RoomJoined(String),
    /// Server đã nhận request gửi (không xác nhận được việc lưu tin).
    MessageAccepted,
    /// Gửi thất bại; trả lại nội dung để UI khôi phục ô nhập.
    SendFailed { message: String, error: String },
    LoggedOut,
}

/// Lệnh UI gửi xuống tầng mạng.
#[derive(Debug, Clone)]
pub enum ChatCommand {
    /// Bắt đầu phiên chat mới với nickname đã được kiểm tra.
    Login { username: String, room: String },
    /// Chuyển phòng: dừng polling, xóa trạng thái đồng bộ, poll phòng mới.
    SwitchRoom(String),
    SendMessage(String),
    Logout,
}

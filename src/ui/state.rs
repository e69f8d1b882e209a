use std::time::{Duration, Instant};

use crate::common::{ChatEvent, ChatMessage};
use crate::config::AppConfig;
use crate::validation::{self, UsernameError};

const SHAKE_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

/// Trạng thái kết nối hiển thị ở thanh trạng thái.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Reconnecting => "Reconnecting...",
        }
    }
}

/// Trạng thái cục bộ của UI.
pub struct AppState {
    pub screen: Screen,
    pub username: String,
    pub username_input: String,
    pub login_error: Option<String>,
    pub shake_until: Option<Instant>,
    pub rooms: Vec<String>,
    pub current_room: String,
    /// Đã đổi phòng ít nhất một lần trong phiên: banner báo phòng mới.
    pub room_switched: bool,
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    /// Đang chờ kết quả gửi: khóa ô nhập.
    pub sending: bool,
    pub notice: Option<String>,
    pub connection: ConnectionStatus,
    pub max_username_length: usize,
    pub max_message_length: usize,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            screen: Screen::Login,
            username: String::new(),
            username_input: String::new(),
            login_error: None,
            shake_until: None,
            rooms: config.rooms.clone(),
            current_room: config.default_room.clone(),
            room_switched: false,
            messages: Vec::new(),
            input_text: String::new(),
            sending: false,
            notice: None,
            connection: ConnectionStatus::Connecting,
            max_username_length: config.max_username_length,
            max_message_length: config.max_message_length,
        }
    }

    /// Kiểm tra nickname đã nhập. Tên rỗng làm ô nhập "rung" thay vì báo lỗi.
    pub fn submit_login(&mut self) -> Option<String> {
        match validation::validate_username(&self.username_input, self.max_username_length) {
            Ok(username) => {
                self.login_error = None;
                Some(username)
            }
            Err(UsernameError::Empty) => {
                self.shake_until = Some(Instant::now() + SHAKE_DURATION);
                None
            }
            Err(err) => {
                self.login_error = Some(err.to_string());
                None
            }
        }
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_until
            .is_some_and(|until| Instant::now() < until)
    }

    pub fn enter_chat(&mut self, username: String) {
        self.username = username;
        self.screen = Screen::Chat;
        self.room_switched = false;
        self.messages.clear();
        self.input_text.clear();
        self.sending = false;
        self.notice = None;
        self.connection = ConnectionStatus::Connecting;
    }

    pub fn leave_chat(&mut self) {
        self.screen = Screen::Login;
        self.username.clear();
        self.username_input.clear();
        self.messages.clear();
        self.input_text.clear();
        self.sending = false;
        self.notice = None;
        self.connection = ConnectionStatus::Connecting;
    }

    pub fn switch_room(&mut self, room: String) {
        self.current_room = room;
        self.room_switched = true;
        self.messages.clear();
    }

    /// Dòng chào ở đầu khung chat.
    pub fn banner(&self) -> String {
        if self.room_switched {
            format!("📍 You joined #{}", self.current_room)
        } else {
            format!("👋 Welcome, {}!", self.username)
        }
    }

    /// Lấy nội dung ô nhập để gửi; khóa ô nhập cho tới khi có kết quả.
    pub fn take_outgoing(&mut self) -> Option<String> {
        if self.sending {
            return None;
        }
        let message = self.input_text.trim().to_string();
        if message.is_empty() {
            return None;
        }
        self.input_text.clear();
        self.sending = true;
        self.notice = None;
        Some(message)
    }

    pub fn is_own(&self, message: &ChatMessage) -> bool {
        message.username == self.username
    }

    pub fn apply_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::MessageReceived(message) => {
                // Tin của phòng cũ có thể tới muộn sau khi đã đổi phòng.
                if self.screen == Screen::Chat && message.room == self.current_room {
                    self.messages.push(message);
                }
            }
            ChatEvent::ConnectionChanged(true) => self.connection = ConnectionStatus::Connected,
            ChatEvent::ConnectionChanged(false) => {
                self.connection = ConnectionStatus::Reconnecting
            }
            ChatEvent::RoomJoined(room) => {
                self.current_room = room;
                self.messages.clear();
            }
            ChatEvent::MessageAccepted => self.sending = false,
            ChatEvent::SendFailed { message, error } => {
                self.sending = false;
                self.input_text = message;
                self.notice = Some(format!("Failed to send. Please try again. ({error})"));
            }
            // Màn hình đã chuyển về login ngay khi bấm logout.
            ChatEvent::LoggedOut => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(&AppConfig::default())
    }

    fn message(room: &str, username: &str, timestamp: i64) -> ChatMessage {
        ChatMessage {
            room: room.to_string(),
            username: username.to_string(),
            message: "hello".to_string(),
            timestamp,
        }
    }

    #[test]
    fn empty_login_shakes_short_login_reports_error() {
        let mut state = state();
        state.username_input = "  ".to_string();
        assert_eq!(state.submit_login(), None);
        assert!(state.is_shaking());
        assert!(state.login_error.is_none());

        state.username_input = "a".to_string();
        assert_eq!(state.submit_login(), None);
        assert_eq!(
            state.login_error.as_deref(),
            Some("Nickname must be at least 2 characters")
        );

        state.username_input = " minh ".to_string();
        assert_eq!(state.submit_login(), Some("minh".to_string()));
        assert!(state.login_error.is_none());
    }

    #[test]
    fn messages_from_other_rooms_are_ignored() {
        let mut state = state();
        state.enter_chat("minh".to_string());
        state.apply_event(ChatEvent::MessageReceived(message("general", "lan", 1)));
        state.apply_event(ChatEvent::RoomJoined("games".to_string()));
        assert!(state.messages.is_empty());

        state.apply_event(ChatEvent::MessageReceived(message("general", "lan", 2)));
        state.apply_event(ChatEvent::MessageReceived(message("games", "minh", 3)));
        assert_eq!(state.messages.len(), 1);
        assert!(state.is_own(&state.messages[0]));
    }

    #[test]
    fn send_failure_restores_text_and_unlocks_input() {
        let mut state = state();
        state.enter_chat("minh".to_string());
        state.input_text = " hi all ".to_string();

        assert_eq!(state.take_outgoing(), Some("hi all".to_string()));
        assert!(state.sending);
        assert_eq!(state.take_outgoing(), None);

        state.apply_event(ChatEvent::SendFailed {
            message: "hi all".to_string(),
            error: "Network error: offline".to_string(),
        });
        assert!(!state.sending);
        assert_eq!(state.input_text, "hi all");
        assert!(state.notice.is_some());
    }

    #[test]
    fn connection_status_follows_transitions() {
        let mut state = state();
        state.enter_chat("minh".to_string());
        assert_eq!(state.connection.label(), "Connecting...");
        state.apply_event(ChatEvent::ConnectionChanged(true));
        assert_eq!(state.connection, ConnectionStatus::Connected);
        state.apply_event(ChatEvent::ConnectionChanged(false));
        assert_eq!(state.connection.label(), "Reconnecting...");
    }

    #[test]
    fn banner_welcomes_then_announces_room_switch() {
        let mut state = state();
        state.enter_chat("minh".to_string());
        assert_eq!(state.banner(), "👋 Welcome, minh!");

        state.apply_event(ChatEvent::RoomJoined("general".to_string()));
        assert_eq!(state.banner(), "👋 Welcome, minh!");

        state.switch_room("music".to_string());
        assert_eq!(state.banner(), "📍 You joined #music");

        state.leave_chat();
        state.enter_chat("lan".to_string());
        assert_eq!(state.banner(), "👋 Welcome, lan!");
    }

    #[test]
    fn leave_chat_returns_to_login_screen() {
        let mut state = state();
        state.enter_chat("minh".to_string());
        state.apply_event(ChatEvent::MessageReceived(message("general", "lan", 1)));
        state.leave_chat();
        assert_eq!(state.screen, Screen::Login);
        assert!(state.username.is_empty());
        assert!(state.messages.is_empty());

        state.apply_event(ChatEvent::MessageReceived(message("general", "lan", 2)));
        state.apply_event(ChatEvent::LoggedOut);
        assert!(state.messages.is_empty());
        assert_eq!(state.screen, Screen::Login);
    }
}

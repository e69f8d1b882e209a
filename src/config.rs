use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::network::SyncConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const API_URL_ENV: &str = "CHAT_API_URL";
const PLACEHOLDER_API_URL: &str = "https://script.google.com/macros/s/YOUR-DEPLOYMENT-ID/exec";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub poll_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub failure_threshold: u32,
    /// Poll lại sau khi gửi để thấy tin nhắn của chính mình.
    pub echo_poll_delay_ms: u64,
    pub seen_retention: Option<usize>,
    pub max_username_length: usize,
    pub max_message_length: usize,
    pub rooms: Vec<String>,
    pub default_room: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: PLACEHOLDER_API_URL.to_string(),
            poll_interval_ms: 5000,
            retry_delay_ms: 10_000,
            request_timeout_ms: 8000,
            failure_threshold: 3,
            echo_poll_delay_ms: 800,
            seen_retention: None,
            max_username_length: 20,
            max_message_length: 500,
            rooms: ["general", "games", "homework", "music"]
                .iter()
                .map(|room| room.to_string())
                .collect(),
            default_room: "general".to_string(),
        }
    }
}

impl AppConfig {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            failure_threshold: self.failure_threshold.max(1),
            seen_retention: self.seen_retention,
            max_message_length: self.max_message_length,
        }
    }

    pub fn echo_poll_delay(&self) -> Duration {
        Duration::from_millis(self.echo_poll_delay_ms)
    }

    /// Ghi đè endpoint từ biến môi trường rồi từ CLI (CLI thắng).
    pub fn apply_overrides(&mut self, env_api_url: Option<String>, cli_api_url: Option<String>) {
        if let Some(url) = cli_api_url.or(env_api_url) {
            let url = url.trim();
            if !url.is_empty() {
                self.api_url = url.to_string();
            }
        }
        if self.rooms.is_empty() {
            self.rooms.push(self.default_room.clone());
        }
        if !self.rooms.contains(&self.default_room) {
            log::warn!(
                "Default room `{}` is not in the room list; using `{}`",
                self.default_room,
                self.rooms[0]
            );
            self.default_room = self.rooms[0].clone();
        }
    }

    pub fn uses_placeholder_url(&self) -> bool {
        self.api_url == PLACEHOLDER_API_URL
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

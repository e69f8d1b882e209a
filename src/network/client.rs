use std::time::Duration;

use tokio::sync::mpsc;

use crate::common::{ChatCommand, ChatEvent};

use super::sync::{SyncConfig, SyncEngine};
use super::transport::Transport;

/// Task nền sở hữu phiên chat: nhận lệnh từ UI, điều khiển `SyncEngine`
/// và chuyển sự kiện lên UI.
pub struct ChatClient<T> {
    transport: T,
    config: SyncConfig,
    echo_poll_delay: Duration,
    event_sender: mpsc::Sender<ChatEvent>,
    command_receiver: mpsc::Receiver<ChatCommand>,
    engine: Option<SyncEngine<T>>,
}

impl<T: Transport + Clone> ChatClient<T> {
    pub fn new(
        transport: T,
        config: SyncConfig,
        echo_poll_delay: Duration,
        event_sender: mpsc::Sender<ChatEvent>,
        command_receiver: mpsc::Receiver<ChatCommand>,
    ) -> Self {
        Self {
            transport,
            config,
            echo_poll_delay,
            event_sender,
            command_receiver,
            engine: None,
        }
    }

    pub async fn run(mut self) {
        log::info!("Chat client loop started");

        while let Some(command) = self.command_receiver.recv().await {
            self.handle_command(command).await;
        }

        if let Some(engine) = self.engine.take() {
            engine.stop();
        }
        log::info!("Chat client loop finished");
    }

    async fn handle_command(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::Login { username, room } => {
                if let Some(previous) = self.engine.take() {
                    previous.stop();
                }
                log::info!("{username} joined #{room}");
                let engine = SyncEngine::new(
                    self.transport.clone(),
                    username,
                    self.config.clone(),
                    self.event_sender.clone(),
                );
                self.notify(ChatEvent::RoomJoined(room.clone())).await;
                engine.start(&room).await;
                self.engine = Some(engine);
            }
            ChatCommand::SwitchRoom(room) => match self.engine.clone() {
                Some(engine) => {
                    self.notify(ChatEvent::RoomJoined(room.clone())).await;
                    engine.switch_room(&room).await;
                }
                None => log::warn!("Ignoring room switch to #{room}: not logged in"),
            },
            ChatCommand::SendMessage(message) => self.handle_send(message).await,
            ChatCommand::Logout => {
                if let Some(engine) = self.engine.take() {
                    engine.stop();
                    log::info!("{} logged out", engine.username());
                }
                self.notify(ChatEvent::LoggedOut).await;
            }
        }
    }

    async fn handle_send(&mut self, message: String) {
        let Some(engine) = self.engine.clone() else {
            self.notify(ChatEvent::SendFailed {
                message,
                error: "Not logged in".to_string(),
            })
            .await;
            return;
        };

        match engine.submit(&message).await {
            Ok(()) => {
                self.notify(ChatEvent::MessageAccepted).await;
                // Ghi là opaque: poll lại sau một nhịp ngắn để thấy tin của mình.
                let delay = self.echo_poll_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if engine.is_running() {
                        engine.poll().await;
                    }
                });
            }
            Err(err) => {
                log::warn!("Failed to send message: {err}");
                self.notify(ChatEvent::SendFailed {
                    message,
                    error: err.to_string(),
                })
                .await;
            }
        }
    }

    async fn notify(&self, event: ChatEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to notify UI: {err}");
        }
    }
}

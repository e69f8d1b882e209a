use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{ChatCommand, ChatEvent};
use crate::config::AppConfig;
use crate::storage::ProfileDatabase;
use crate::validation;

use super::components::header::HeaderAction;
use super::components::{chat_area, header, input_bar, login, status_bar};
use super::state::{AppState, Screen};

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<ChatCommand>,
    event_receiver: mpsc::Receiver<ChatEvent>,
    profile: Option<ProfileDatabase>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: &AppConfig,
        command_sender: mpsc::Sender<ChatCommand>,
        event_receiver: mpsc::Receiver<ChatEvent>,
        profile: Option<ProfileDatabase>,
    ) -> Self {
        let mut app = Self {
            state: AppState::new(config),
            command_sender,
            event_receiver,
            profile,
        };

        // Đã có nickname lưu sẵn: vào thẳng màn hình chat.
        let cached = app
            .profile
            .as_ref()
            .and_then(|profile| match profile.load_username() {
                Ok(username) => username,
                Err(err) => {
                    log::warn!("Failed to load cached username: {err}");
                    None
                }
            })
            .and_then(|username| {
                validation::validate_username(&username, config.max_username_length).ok()
            });
        if let Some(username) = cached {
            log::info!("Resuming session for cached user {username}");
            app.join(username);
        }

        app
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.apply_event(event);
        }
    }

    fn send_command(&mut self, command: ChatCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
        }
    }

    fn join(&mut self, username: String) {
        if let Some(profile) = &self.profile {
            if let Err(err) = profile.save_username(&username) {
                log::warn!("Failed to persist username: {err}");
            }
        }

        let room = self.state.current_room.clone();
        self.state.enter_chat(username.clone());
        self.send_command(ChatCommand::Login { username, room });
    }

    fn logout(&mut self) {
        self.send_command(ChatCommand::Logout);
        if let Some(profile) = &self.profile {
            if let Err(err) = profile.clear_username() {
                log::warn!("Failed to clear cached username: {err}");
            }
        }
        self.state.leave_chat();
    }

    fn switch_room(&mut self, room: String) {
        let Some(room) = validation::validate_room(&room, &self.state.rooms) else {
            log::warn!("Unknown room `{room}`");
            return;
        };
        let room = room.to_string();
        self.state.switch_room(room.clone());
        self.send_command(ChatCommand::SwitchRoom(room));
    }

    fn render_login(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if login::render(ui, &mut self.state) {
                if let Some(username) = self.state.submit_login() {
                    self.join(username);
                }
            }
        });
    }

    fn render_chat(&mut self, ctx: &egui::Context) {
        let mut header_action = None;
        egui::TopBottomPanel::top("chat_header").show(ctx, |ui| {
            header_action = header::render(ui, &self.state);
        });

        let mut send = false;
        egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
            status_bar::render(ui, self.state.connection);
            if let Some(notice) = &self.state.notice {
                ui.colored_label(egui::Color32::RED, notice);
            }
            send = input_bar::render(
                ui,
                &mut self.state.input_text,
                !self.state.sending,
                self.state.max_message_length,
            );
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            chat_area::render(ui, &self.state);
        });

        match header_action {
            Some(HeaderAction::SwitchRoom(room)) => self.switch_room(room),
            Some(HeaderAction::Logout) => self.logout(),
            None => {}
        }

        if send {
            if let Some(message) = self.state.take_outgoing() {
                self.send_command(ChatCommand::SendMessage(message));
            }
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();

        match self.state.screen {
            Screen::Login => self.render_login(ctx),
            Screen::Chat => self.render_chat(ctx),
        }

        ctx.request_repaint();
    }
}

use std::fmt::Display;

use chrono::{Local, TimeZone};
use eframe::egui;

use crate::ui::state::AppState;

/// Định dạng giờ:phút của timestamp (epoch millis) theo múi giờ `tz`.
pub fn format_time_in<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(timestamp)
        .single()
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_default()
}

pub fn format_time(timestamp: i64) -> String {
    format_time_in(timestamp, &Local)
}

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(state.banner());
                if !state.room_switched {
                    ui.label(egui::RichText::new("Be respectful and follow the rules.").weak());
                }
            });
            ui.separator();

            for message in &state.messages {
                let own = state.is_own(message);
                let author_color = if own {
                    egui::Color32::LIGHT_BLUE
                } else {
                    egui::Color32::LIGHT_GRAY
                };

                ui.horizontal(|ui| {
                    ui.colored_label(author_color, egui::RichText::new(&message.username).strong());
                    ui.label(egui::RichText::new(format_time(message.timestamp)).weak());
                });
                // Hiển thị dạng text thuần: không diễn giải markup.
                ui.label(&message.message);
                ui.add_space(4.0);
            }
        });
}

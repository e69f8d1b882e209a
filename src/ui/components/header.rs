use eframe::egui;

use crate::ui::state::AppState;

pub enum HeaderAction {
    SwitchRoom(String),
    Logout,
}

fn room_label(room: &str) -> String {
    let icon = match room {
        "general" => "🏠",
        "games" => "🎮",
        "homework" => "📚",
        "music" => "🎵",
        _ => "#",
    };
    format!("{icon} {room}")
}

pub fn render(ui: &mut egui::Ui, state: &AppState) -> Option<HeaderAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.heading(format!("#{}", state.current_room));
        ui.label(egui::RichText::new(&state.username).strong());

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("🚪").on_hover_text("Logout").clicked() {
                action = Some(HeaderAction::Logout);
            }

            let mut selected = state.current_room.clone();
            egui::ComboBox::from_id_salt("room_select")
                .selected_text(room_label(&selected))
                .show_ui(ui, |ui| {
                    for room in &state.rooms {
                        ui.selectable_value(&mut selected, room.clone(), room_label(room));
                    }
                });
            if selected != state.current_room {
                action = Some(HeaderAction::SwitchRoom(selected));
            }
        });
    });

    action
}

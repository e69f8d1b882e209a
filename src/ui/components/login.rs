use eframe::egui;

use crate::ui::state::AppState;

/// Màn hình đăng nhập. Trả về `true` khi người dùng bấm Join hoặc Enter.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> bool {
    let mut join = false;

    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() * 0.25);
        ui.heading("💬 School Chat");
        ui.label("Choose a nickname to join the chat");
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            let width = 220.0;
            let mut margin = (ui.available_width() - width - 60.0).max(0.0) / 2.0;
            if state.is_shaking() {
                // Rung trái/phải mỗi 50ms.
                let phase = (ui.input(|i| i.time) * 20.0) as i64 % 2;
                margin += if phase == 0 { -6.0 } else { 6.0 };
                ui.ctx().request_repaint();
            }
            ui.add_space(margin.max(0.0));

            let response = ui.add(
                egui::TextEdit::singleline(&mut state.username_input)
                    .hint_text("Your nickname...")
                    .char_limit(state.max_username_length)
                    .desired_width(width),
            );
            if ui.button("Join").clicked() {
                join = true;
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                join = true;
            }
        });

        if let Some(error) = &state.login_error {
            ui.add_space(6.0);
            ui.colored_label(egui::Color32::RED, error);
        }
    });

    join
}

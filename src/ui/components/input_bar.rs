use eframe::egui;

/// Ô nhập tin nhắn. Trả về `true` khi người dùng bấm Send hoặc Enter.
pub fn render(ui: &mut egui::Ui, input_text: &mut String, enabled: bool, max_len: usize) -> bool {
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.add_enabled(
            enabled,
            egui::TextEdit::singleline(input_text)
                .hint_text("Type your message...")
                .char_limit(max_len)
                .desired_width(ui.available_width() - 70.0),
        );
        if ui.add_enabled(enabled, egui::Button::new("Send")).clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    send && !input_text.trim().is_empty()
}

use eframe::egui;

use crate::ui::state::ConnectionStatus;

pub fn render(ui: &mut egui::Ui, status: ConnectionStatus) {
    let color = match status {
        ConnectionStatus::Connecting => egui::Color32::YELLOW,
        ConnectionStatus::Connected => egui::Color32::GREEN,
        ConnectionStatus::Reconnecting => egui::Color32::RED,
    };

    ui.horizontal(|ui| {
        ui.colored_label(color, "●");
        ui.label(egui::RichText::new(status.label()).weak());
    });
}

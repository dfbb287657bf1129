use iced::widget::{button, column, text};
use iced::{Alignment, Color, Element};

use crate::Message;

/// Shown in place of the loading indicator after a failed page load
pub fn view(error: &str) -> Element<'_, Message> {
    column![
        text(error).size(18).color(Color::from_rgb(0.85, 0.15, 0.15)),
        button("Retry").on_press(Message::Retry).padding(10),
    ]
    .spacing(8)
    .align_x(Alignment::Center)
    .into()
}

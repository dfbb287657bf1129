/// A single Pokédex card: artwork over a gradient of its dominant color
use iced::gradient::Linear;
use iced::widget::image::Handle;
use iced::widget::{column, container, image, mouse_area, text};
use iced::{Alignment, Background, Border, Color, Element, Length, Radians, Theme};
use ::image::{DynamicImage, RgbaImage};

use crate::color;
use crate::state::data::Entry;
use crate::Message;

/// Edge length of the artwork inside a card
const ARTWORK_SIZE: f32 = 160.0;

/// Pixels for a decoded artwork, shrunk to the size it is drawn at
pub fn artwork(decoded: &DynamicImage) -> Handle {
    let rgba = fit_artwork(decoded);
    Handle::from_rgba(rgba.width(), rgba.height(), rgba.into_raw())
}

fn fit_artwork(decoded: &DynamicImage) -> RgbaImage {
    let edge = ARTWORK_SIZE as u32;
    if decoded.width() > edge || decoded.height() > edge {
        decoded.thumbnail(edge, edge).to_rgba8()
    } else {
        decoded.to_rgba8()
    }
}

/// Convert a theme color for iced
pub fn to_iced(color: color::Color) -> Color {
    Color::from_rgb8(color.r, color.g, color.b)
}

/// Build the card for `entry` shown at `slot`
///
/// `artwork` is `None` until the image arrives (or forever, if it failed),
/// in which case a placeholder is drawn.
pub fn view<'a>(
    slot: usize,
    entry: &'a Entry,
    artwork: Option<&Handle>,
    tint: color::Color,
) -> Element<'a, Message> {
    let picture: Element<'a, Message> = match artwork {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(ARTWORK_SIZE))
            .height(Length::Fixed(ARTWORK_SIZE))
            .into(),
        None => container(text("?").size(64))
            .width(Length::Fixed(ARTWORK_SIZE))
            .height(Length::Fixed(ARTWORK_SIZE))
            .center_x(Length::Fixed(ARTWORK_SIZE))
            .center_y(Length::Fixed(ARTWORK_SIZE))
            .into(),
    };

    let content = column![
        picture,
        text(format!("#{:03}", entry.number)).size(14),
        text(&entry.name).size(20),
    ]
    .spacing(8)
    .align_x(Alignment::Center);

    let top = to_iced(tint);
    let bottom = to_iced(color::Color::NEUTRAL);

    let card = container(content)
        .width(Length::Fill)
        .padding(16)
        .center_x(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            text_color: Some(Color::BLACK),
            background: Some(Background::Gradient(
                Linear::new(Radians(std::f32::consts::PI))
                    .add_stop(0.0, top)
                    .add_stop(1.0, bottom)
                    .into(),
            )),
            border: Border {
                radius: 10.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        });

    mouse_area(card).on_press(Message::CardSelected(slot)).into()
}

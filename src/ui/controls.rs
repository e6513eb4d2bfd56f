use iced::widget::{button, container, row, slider, text, Column, Row};
use iced::{Alignment, Element, Length};

use crate::audio::types::EffectKind;

#[derive(Debug, Clone)]
pub enum ControlMessage {
    PlayPause,
    PitchChanged(f32),
    Effect(EffectKind),
    OpenFile,
}

/// Build the deck controls view.
pub fn view_controls<'a>(
    playing: bool,
    ready: bool,
    pitch: f32,
    pitch_range: (f32, f32),
) -> Element<'a, ControlMessage> {
    let play_label = if playing { "Pause" } else { "Play" };

    // Inert until a track is decoded.
    let play_btn = button(text(play_label)).on_press_maybe(ready.then_some(ControlMessage::PlayPause));
    let open_btn = button(text("Open Track")).on_press(ControlMessage::OpenFile);
    let laser_btn =
        button(text("Laser")).on_press(ControlMessage::Effect(EffectKind::Laser));
    let siren_btn =
        button(text("Siren")).on_press(ControlMessage::Effect(EffectKind::Siren));

    let pitch_label = text(format!("Pitch: {:+.0}%", (pitch - 1.0) * 100.0)).size(14);
    let (lo, hi) = pitch_range;
    let pitch_slider = slider(lo..=hi, pitch, ControlMessage::PitchChanged).step(0.01);

    let transport_row = Row::new()
        .spacing(10)
        .align_y(Alignment::Center)
        .push(open_btn)
        .push(play_btn)
        .push(laser_btn)
        .push(siren_btn);

    let pitch_row = row![pitch_label, pitch_slider]
        .spacing(10)
        .align_y(Alignment::Center)
        .width(Length::Fixed(300.0));

    container(
        Column::new()
            .spacing(10)
            .align_x(Alignment::Center)
            .push(transport_row)
            .push(pitch_row),
    )
    .padding(10)
    .into()
}

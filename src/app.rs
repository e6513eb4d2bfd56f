use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use iced::keyboard;
use iced::time::Instant;
use iced::widget::{canvas, center, column, container, text};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};

use crate::audio::engine::CpalBackend;
use crate::audio::source::{load_track, AssetSource, FileSource};
use crate::audio::transport::{LoadTicket, Transport};
use crate::audio::types::{AudioData, TrackRef};
use crate::config::Config;
use crate::error::AudioError;
use crate::gesture::{GestureMapper, Point};
use crate::ui::controls::{self, ControlMessage};
use crate::ui::disc::{DiscMessage, DiscView};

/// Longest gap a single animation tick may cover; keeps the disc from
/// lurching after the window was hidden.
const MAX_TICK: Duration = Duration::from_millis(100);
const DISC_SIZE: f32 = 360.0;

pub struct App {
    config: Config,
    source: Arc<dyn AssetSource>,
    transport: Transport<CpalBackend>,
    mapper: GestureMapper,
    pitch: f32,
    track: Option<TrackRef>,
    last_tick: Option<Instant>,
}

#[derive(Debug, Clone)]
pub enum Message {
    TrackLoaded(LoadTicket, Result<AudioData, AudioError>),
    Control(ControlMessage),
    Disc(DiscMessage),
    Tick(Instant),
    KeyEvent(keyboard::Event),
    FileDialogResult(Option<PathBuf>),
}

impl App {
    fn new(config: Config) -> (Self, Task<Message>) {
        let mut app = App {
            transport: Transport::new(CpalBackend::new(config.master_gain)),
            source: Arc::new(FileSource::default()),
            mapper: GestureMapper::new(Point::new(0.0, 0.0)),
            pitch: 1.0,
            track: None,
            last_tick: None,
            config,
        };

        // Decode eagerly; the device stays closed until the first click.
        let task = match app.config.track.clone() {
            Some(track) => app.start_load(TrackRef::new(track)),
            None => Task::none(),
        };
        (app, task)
    }

    fn start_load(&mut self, track: TrackRef) -> Task<Message> {
        let ticket = self.transport.begin_load(&track);
        self.track = Some(track.clone());
        let source = self.source.clone();
        let timeout = Duration::from_secs(self.config.load_timeout_secs);

        Task::perform(load_track(source, track, timeout), move |result| {
            Message::TrackLoaded(ticket, result)
        })
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.transport.close();
    }
}

fn title(app: &App) -> String {
    match &app.track {
        Some(track) => format!("Vinyl Scratch - {track}"),
        None => "Vinyl Scratch".to_string(),
    }
}

fn update(app: &mut App, message: Message) -> Task<Message> {
    match message {
        Message::TrackLoaded(ticket, result) => {
            // Failure is recorded on the transport and shown in the status line.
            let _ = app.transport.finish_load(ticket, result);
            Task::none()
        }
        Message::Control(ctrl) => match ctrl {
            ControlMessage::PlayPause => {
                if app.transport.is_playing() {
                    app.transport.pause();
                } else {
                    app.transport.play();
                }
                Task::none()
            }
            ControlMessage::PitchChanged(p) => {
                app.pitch = app.config.clamp_pitch(p);
                Task::none()
            }
            ControlMessage::Effect(kind) => {
                app.transport.trigger_effect(kind);
                Task::none()
            }
            ControlMessage::OpenFile => Task::perform(
                async {
                    let handle = rfd::AsyncFileDialog::new()
                        .add_filter("Audio", &["mp3", "wav", "flac", "ogg", "aac"])
                        .pick_file()
                        .await;
                    handle.map(|h| h.path().to_path_buf())
                },
                Message::FileDialogResult,
            ),
        },
        Message::FileDialogResult(path) => match path {
            Some(path) => app.start_load(TrackRef::new(path.to_string_lossy())),
            None => Task::none(),
        },
        Message::Disc(dm) => {
            match dm {
                DiscMessage::DragStarted(point) => app.mapper.start_drag(point),
                DiscMessage::DragMoved(point) => {
                    app.mapper.move_drag(point, &mut app.transport);
                }
                DiscMessage::DragEnded => app.mapper.end_drag(),
            }
            Task::none()
        }
        Message::Tick(now) => {
            let dt = app
                .last_tick
                .map(|last| now.duration_since(last).min(MAX_TICK))
                .unwrap_or(Duration::ZERO);
            app.last_tick = Some(now);
            let playing = app.transport.is_playing();
            app.mapper
                .tick(dt, playing, app.pitch, &mut app.transport);
            Task::none()
        }
        Message::KeyEvent(keyboard::Event::KeyPressed { key, .. }) => match key.as_ref() {
            keyboard::Key::Named(keyboard::key::Named::Space) if app.transport.is_ready() => {
                update(app, Message::Control(ControlMessage::PlayPause))
            }
            _ => Task::none(),
        },
        Message::KeyEvent(_) => Task::none(),
    }
}

fn view(app: &App) -> Element<'_, Message> {
    let disc: Element<Message> = if app.transport.is_ready() {
        let canvas_el: Element<DiscMessage> = canvas::Canvas::new(DiscView {
            rotation: app.mapper.rotation_degrees(),
        })
        .width(Length::Fixed(DISC_SIZE))
        .height(Length::Fixed(DISC_SIZE))
        .into();
        canvas_el.map(Message::Disc)
    } else {
        let label = match &app.track {
            Some(_) if app.transport.last_error().is_none() => "Loading music...",
            Some(_) => "Track unavailable",
            None => "Open a track to begin",
        };
        center(text(label).size(18))
            .width(Length::Fixed(DISC_SIZE))
            .height(Length::Fixed(DISC_SIZE))
            .into()
    };

    let controls = controls::view_controls(
        app.transport.is_playing(),
        app.transport.is_ready(),
        app.pitch,
        (app.config.pitch_min, app.config.pitch_max),
    )
    .map(Message::Control);

    let mut content = column![disc, controls]
        .spacing(10)
        .align_x(Alignment::Center);

    if let Some(err) = app.transport.last_error() {
        content = content.push(
            container(text(format!("Error: {err}")).color(iced::Color::from_rgb(1.0, 0.3, 0.3)))
                .padding(10),
        );
    }

    content = content.push(text(app.transport.debug_string()).size(11));

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}

fn subscription(_app: &App) -> Subscription<Message> {
    let tick = iced::time::every(Duration::from_millis(16)).map(Message::Tick);

    let keys = keyboard::listen().map(Message::KeyEvent);

    Subscription::batch([tick, keys])
}

fn theme(_app: &App) -> Theme {
    Theme::Dark
}

pub fn run(config: Config) -> iced::Result {
    iced::application(move || App::new(config.clone()), update, view)
        .title(title)
        .subscription(subscription)
        .theme(theme)
        .window_size((480.0, 600.0))
        .run()
}

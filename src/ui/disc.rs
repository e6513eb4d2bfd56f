use iced::mouse;
use iced::touch;
use iced::widget::canvas::{self, Action, Event, Frame, Geometry, Path, Stroke};
use iced::{Color, Rectangle, Renderer, Theme};

use crate::gesture::Point;

/// The rotating record. Pointer positions are reported relative to its center.
pub struct DiscView {
    /// Rotation in degrees.
    pub rotation: f32,
}

/// Gesture lifecycle on the disc.
#[derive(Debug, Clone)]
pub enum DiscMessage {
    DragStarted(Option<Point>),
    DragMoved(Option<Point>),
    DragEnded,
}

fn relative_to_center(position: iced::Point, bounds: Rectangle) -> Point {
    let center = bounds.center();
    Point::new(position.x - center.x, position.y - center.y)
}

impl canvas::Program<DiscMessage> for DiscView {
    type State = bool; // dragging

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let center = frame.center();
        let radius = bounds.width.min(bounds.height) / 2.0 * 0.96;

        frame.fill(&Path::circle(center, radius), Color::from_rgb(0.07, 0.07, 0.07));

        // Grooves
        let groove = Stroke::default()
            .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.06))
            .with_width(1.0);
        let mut r = radius * 0.58;
        while r < radius * 0.98 {
            frame.stroke(&Path::circle(center, r), groove);
            r += 3.0;
        }

        // Label
        let label_radius = radius * 0.55;
        frame.fill(
            &Path::circle(center, label_radius),
            Color::from_rgb(0.83, 0.69, 0.22),
        );

        // Marker so rotation is visible
        let angle = self.rotation.to_radians();
        let marker = Path::line(
            iced::Point::new(
                center.x + angle.cos() * label_radius * 0.2,
                center.y + angle.sin() * label_radius * 0.2,
            ),
            iced::Point::new(
                center.x + angle.cos() * label_radius * 0.9,
                center.y + angle.sin() * label_radius * 0.9,
            ),
        );
        frame.stroke(
            &marker,
            Stroke::default()
                .with_color(Color::from_rgb(0.1, 0.1, 0.1))
                .with_width(4.0),
        );

        // Spindle hole
        frame.fill(&Path::circle(center, 6.0), Color::BLACK);

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Action<DiscMessage>> {
        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let pos = cursor.position_over(bounds)?;
                *state = true;
                let point = relative_to_center(pos, bounds);
                Some(Action::publish(DiscMessage::DragStarted(Some(point))).and_capture())
            }
            Event::Mouse(mouse::Event::CursorMoved { .. }) if *state => {
                let point = cursor.position().map(|p| relative_to_center(p, bounds));
                Some(Action::publish(DiscMessage::DragMoved(point)).and_capture())
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
            | Event::Mouse(mouse::Event::CursorLeft)
                if *state =>
            {
                *state = false;
                Some(Action::publish(DiscMessage::DragEnded))
            }
            Event::Touch(touch::Event::FingerPressed { position, .. })
                if bounds.contains(*position) =>
            {
                *state = true;
                let point = relative_to_center(*position, bounds);
                Some(Action::publish(DiscMessage::DragStarted(Some(point))).and_capture())
            }
            Event::Touch(touch::Event::FingerMoved { position, .. }) if *state => {
                let point = relative_to_center(*position, bounds);
                Some(Action::publish(DiscMessage::DragMoved(Some(point))).and_capture())
            }
            Event::Touch(touch::Event::FingerLifted { .. } | touch::Event::FingerLost { .. })
                if *state =>
            {
                *state = false;
                Some(Action::publish(DiscMessage::DragEnded))
            }
            _ => None,
        }
    }
}

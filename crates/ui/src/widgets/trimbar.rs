use iced::widget::canvas::{self, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Length, Point, Rectangle, Size, Theme, mouse, touch};
use player::{Handle, PlayerSnapshot, TrimRange, pct_from_seconds};

/// Pixel distance within which a press grabs a trim handle.
pub const HANDLE_HIT_TOLERANCE: f32 = 10.0;

const HANDLE_WIDTH: f32 = 6.0;
const BAR_HEIGHT: f32 = 32.0;

/// Converts a trim percentage to an x coordinate in track space.
pub fn handle_x(pct: f64, track_width: f32) -> f32 {
    ((pct / 100.0) as f32 * track_width).clamp(0.0, track_width)
}

/// Resolves which handle a press at `x` grabs, if any. When both handles are
/// within tolerance the nearer one wins; ties go to the left handle.
pub fn hit_handle(x: f32, track_width: f32, trim: &TrimRange) -> Option<Handle> {
    if track_width <= 0.0 {
        return None;
    }

    let distance_left = (x - handle_x(trim.start, track_width)).abs();
    let distance_right = (x - handle_x(trim.end, track_width)).abs();

    match (
        distance_left <= HANDLE_HIT_TOLERANCE,
        distance_right <= HANDLE_HIT_TOLERANCE,
    ) {
        (true, true) if distance_left <= distance_right => Some(Handle::Left),
        (true, true) => Some(Handle::Right),
        (true, false) => Some(Handle::Left),
        (false, true) => Some(Handle::Right),
        (false, false) => None,
    }
}

#[derive(Debug, Default)]
struct TrimbarState {
    dragging: bool,
}

#[derive(Debug)]
struct TrimbarProgram<'a, Message> {
    trim: TrimRange,
    progress_pct: f64,
    drag_active: Option<Handle>,
    enabled: bool,
    cache: &'a canvas::Cache,
    on_begin: fn(Handle) -> Message,
    on_move: fn(f32, f32) -> Message,
    on_end: fn() -> Message,
    on_seek: fn(f32, f32) -> Message,
}

impl<Message> TrimbarProgram<'_, Message> {
    /// A press on a handle starts a drag; a press elsewhere on the track
    /// requests a seek to that position.
    fn press(&self, state: &mut TrimbarState, x: f32, width: f32) -> Option<Message> {
        if let Some(handle) = hit_handle(x, width, &self.trim) {
            state.dragging = true;
            return Some((self.on_begin)(handle));
        }
        Some((self.on_seek)(x, width))
    }

    fn release(&self, state: &mut TrimbarState) -> Option<Message> {
        if state.dragging {
            state.dragging = false;
            Some((self.on_end)())
        } else {
            None
        }
    }
}

impl<Message> canvas::Program<Message> for TrimbarProgram<'_, Message> {
    type State = TrimbarState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if !self.enabled {
            return (canvas::event::Status::Ignored, None);
        }

        let cursor_x = cursor.position().map(|position| position.x - bounds.x);
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let Some(x) = cursor_x else {
                    return (canvas::event::Status::Ignored, None);
                };
                match self.press(state, x, bounds.width) {
                    Some(message) => (canvas::event::Status::Captured, Some(message)),
                    None => (canvas::event::Status::Ignored, None),
                }
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if state.dragging => {
                let Some(x) = cursor_x else {
                    return (canvas::event::Status::Ignored, None);
                };
                (
                    canvas::event::Status::Captured,
                    Some((self.on_move)(x, bounds.width)),
                )
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                match self.release(state) {
                    Some(message) => (canvas::event::Status::Captured, Some(message)),
                    None => (canvas::event::Status::Ignored, None),
                }
            }
            canvas::Event::Touch(touch::Event::FingerPressed { position, .. }) => {
                match self.press(state, position.x - bounds.x, bounds.width) {
                    Some(message) => (canvas::event::Status::Captured, Some(message)),
                    None => (canvas::event::Status::Ignored, None),
                }
            }
            canvas::Event::Touch(touch::Event::FingerMoved { position, .. })
                if state.dragging =>
            {
                (
                    canvas::event::Status::Captured,
                    Some((self.on_move)(position.x - bounds.x, bounds.width)),
                )
            }
            canvas::Event::Touch(
                touch::Event::FingerLifted { .. } | touch::Event::FingerLost { .. },
            ) => match self.release(state) {
                Some(message) => (canvas::event::Status::Captured, Some(message)),
                None => (canvas::event::Status::Ignored, None),
            },
            _ => (canvas::event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let track = self.cache.draw(renderer, bounds.size(), |frame| {
            let background = Path::rectangle(Point::ORIGIN, frame.size());
            frame.fill(&background, Color::from_rgb8(22, 24, 29));
        });

        let mut overlay = canvas::Frame::new(renderer, bounds.size());
        if self.enabled {
            let left = handle_x(self.trim.start, bounds.width);
            let right = handle_x(self.trim.end, bounds.width);

            let kept = Path::rectangle(
                Point::new(left, 6.0),
                Size::new((right - left).max(1.0), (bounds.height - 12.0).max(1.0)),
            );
            overlay.fill(&kept, Color::from_rgb8(55, 110, 188));

            let progress_x = handle_x(self.progress_pct, bounds.width);
            let progress = Path::line(
                Point::new(progress_x, 0.0),
                Point::new(progress_x, bounds.height),
            );
            overlay.stroke(
                &progress,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb8(255, 94, 77)),
            );

            for (handle, x) in [(Handle::Left, left), (Handle::Right, right)] {
                let grabbed = self.drag_active == Some(handle);
                let max_x = (bounds.width - HANDLE_WIDTH).max(0.0);
                let bar = Path::rectangle(
                    Point::new((x - HANDLE_WIDTH / 2.0).clamp(0.0, max_x), 0.0),
                    Size::new(HANDLE_WIDTH, bounds.height),
                );
                let color = if grabbed {
                    Color::from_rgb8(255, 214, 110)
                } else {
                    Color::from_rgb8(210, 214, 222)
                };
                overlay.fill(&bar, color);
            }
        }

        vec![track, overlay.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if !self.enabled {
            return mouse::Interaction::None;
        }
        if state.dragging {
            return mouse::Interaction::Grabbing;
        }

        let over_handle = cursor
            .position_in(bounds)
            .and_then(|position| hit_handle(position.x, bounds.width, &self.trim));
        if over_handle.is_some() {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::None
        }
    }
}

/// Renders the interactive trim bar for the current playback snapshot.
pub fn view<'a, Message>(
    snapshot: &PlayerSnapshot,
    cache: &'a canvas::Cache,
    on_begin: fn(Handle) -> Message,
    on_move: fn(f32, f32) -> Message,
    on_end: fn() -> Message,
    on_seek: fn(f32, f32) -> Message,
) -> Element<'a, Message>
where
    Message: 'a,
{
    let enabled = snapshot.duration_seconds > 0.0
        && matches!(
            snapshot.phase,
            player::Phase::ReadyPaused | player::Phase::ReadyPlaying
        );

    container(
        canvas::Canvas::new(TrimbarProgram {
            trim: snapshot.trim,
            progress_pct: pct_from_seconds(
                snapshot.current_time_seconds,
                snapshot.duration_seconds,
            ),
            drag_active: snapshot.drag_active,
            enabled,
            cache,
            on_begin,
            on_move,
            on_end,
            on_seek,
        })
        .width(Length::Fill)
        .height(Length::Fixed(BAR_HEIGHT)),
    )
    .width(Length::Fill)
    .into()
}

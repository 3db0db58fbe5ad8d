use iced::widget::{button, column, row, scrollable, text};
use iced::{Element, Length};
use player::VideoSelection;

const PANE_WIDTH: f32 = 280.0;

/// Renders the scrollable video library pane: loaded items, the load-more
/// control, and the dismissable listing error banner.
pub fn view<'a, Message: Clone + 'a>(
    videos: &'a [VideoSelection],
    selected_id: Option<&str>,
    has_next_page: bool,
    loading: bool,
    error: Option<&'a str>,
    on_pick: fn(usize) -> Message,
    on_load_more: Message,
    on_dismiss_error: Message,
) -> Element<'a, Message> {
    let mut items = column![].spacing(4);

    for (index, video) in videos.iter().enumerate() {
        let selected = selected_id == Some(video.id.as_str());
        let style = if selected {
            button::primary
        } else {
            button::secondary
        };

        items = items.push(
            button(text(video.title.as_str()))
                .width(Length::Fill)
                .style(style)
                .on_press(on_pick(index)),
        );
    }

    if let Some(message) = error {
        items = items.push(
            row![
                text(message).width(Length::Fill),
                button("Dismiss").on_press(on_dismiss_error),
            ]
            .spacing(8),
        );
    }

    if loading {
        items = items.push(text("loading videos"));
    } else {
        items = items.push(
            button("Load more")
                .width(Length::Fill)
                .on_press_maybe(has_next_page.then_some(on_load_more)),
        );
    }

    scrollable(items.padding(4))
        .width(Length::Fixed(PANE_WIDTH))
        .height(Length::Fill)
        .into()
}

use std::sync::mpsc::TrySendError;

use iced::widget::{button, canvas, column, container, row, text};
use iced::{Element, Length, Subscription, Task};
use listing::{ListingClient, VideoPage};
use player::{Command, Handle, Phase, PlayerSnapshot, VideoSelection, format_time};

use crate::bridge::{BridgeEvent, PlayerCommandSender, player_subscription};
use crate::config::AppConfig;
use crate::widgets;

/// UI messages handled by the iced app update loop.
#[derive(Debug, Clone)]
pub enum Message {
    Bridge(BridgeEvent),
    VideoPicked(usize),
    PlayPressed,
    PausePressed,
    TrimDragBegan(Handle),
    TrimDragMoved { x: f32, track_width: f32 },
    TrimDragEnded,
    TrackPressed { x: f32, track_width: f32 },
    LoadMorePressed,
    PageLoaded(Result<VideoPage, String>),
    DismissListingError,
}

/// Root dashboard state. Playback fields are never stored here; every render
/// reads them from the latest [`PlayerSnapshot`].
pub struct AppState {
    player_tx: Option<PlayerCommandSender>,
    snapshot: PlayerSnapshot,
    videos: Vec<VideoSelection>,
    next_page: u32,
    page_limit: u32,
    has_next_page: bool,
    fetch_in_flight: bool,
    listing_error: Option<String>,
    client: ListingClient,
    trimbar_cache: canvas::Cache,
    status: String,
}

impl AppState {
    /// Boots the app: starts the player bridge subscription and requests the
    /// first listing page.
    pub fn boot() -> (Self, Task<Message>) {
        let config = AppConfig::load();
        let mut state = Self {
            player_tx: None,
            snapshot: PlayerSnapshot::idle(),
            videos: Vec::new(),
            next_page: 1,
            page_limit: config.page_limit,
            has_next_page: true,
            fetch_in_flight: false,
            listing_error: None,
            client: ListingClient::new(config.listing_base_url),
            trimbar_cache: canvas::Cache::new(),
            status: String::from("starting player bridge"),
        };
        let task = state.fetch_next_page();
        (state, task)
    }

    /// Handles one UI message.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Bridge(BridgeEvent::Ready(sender)) => {
                self.player_tx = Some(sender);
                self.status = String::from("player bridge ready");
            }
            Message::Bridge(BridgeEvent::Snapshot(snapshot)) => {
                self.snapshot = snapshot;
            }
            Message::Bridge(BridgeEvent::Disconnected) => {
                self.player_tx = None;
                self.status = String::from("player channel closed");
            }
            Message::VideoPicked(index) => {
                if let Some(video) = self.videos.get(index) {
                    let video = video.clone();
                    if self.send_command(Command::Select(video.clone())) {
                        self.status = format!("selected {}", video.title);
                    }
                }
            }
            Message::PlayPressed => {
                self.send_command(Command::Play);
            }
            Message::PausePressed => {
                self.send_command(Command::Pause);
            }
            Message::TrimDragBegan(handle) => {
                self.send_command(Command::BeginDrag(handle));
            }
            Message::TrimDragMoved { x, track_width } => {
                self.send_command(Command::DragMoved { x, track_width });
            }
            Message::TrimDragEnded => {
                self.send_command(Command::EndDrag);
            }
            Message::TrackPressed { x, track_width } => {
                let pct = player::drag::position_pct(x, track_width);
                let seconds = self.snapshot.duration_seconds * pct / 100.0;
                self.send_command(Command::Seek { seconds });
            }
            Message::LoadMorePressed => {
                return self.fetch_next_page();
            }
            Message::PageLoaded(Ok(page)) => {
                self.fetch_in_flight = false;
                self.has_next_page = page.pagination.has_next_page;
                self.next_page += 1;
                self.videos.extend(page.items);
                self.status = format!("{} videos loaded", self.videos.len());
            }
            Message::PageLoaded(Err(message)) => {
                self.fetch_in_flight = false;
                self.listing_error = Some(message);
            }
            Message::DismissListingError => {
                self.listing_error = None;
            }
        }

        Task::none()
    }

    fn fetch_next_page(&mut self) -> Task<Message> {
        if self.fetch_in_flight || !self.has_next_page {
            return Task::none();
        }
        self.fetch_in_flight = true;

        let client = self.client.clone();
        let page = self.next_page;
        let limit = self.page_limit;
        Task::perform(
            async move {
                client
                    .fetch_page(page, limit)
                    .await
                    .map_err(|error| error.to_string())
            },
            Message::PageLoaded,
        )
    }

    fn send_command(&mut self, command: Command) -> bool {
        if let Some(sender) = &self.player_tx {
            match sender.try_send(command) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    self.status = String::from("player command queue is full");
                    false
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.status = String::from("player command channel closed");
                    self.player_tx = None;
                    false
                }
            }
        } else {
            self.status = String::from("player is not ready");
            false
        }
    }

    /// Renders the UI tree.
    pub fn view(&self) -> Element<'_, Message> {
        let library = widgets::library::view(
            &self.videos,
            self.snapshot.video_id.as_deref(),
            self.has_next_page,
            self.fetch_in_flight,
            self.listing_error.as_deref(),
            Message::VideoPicked,
            Message::LoadMorePressed,
            Message::DismissListingError,
        );

        let surface_line = if self.snapshot.video_id.is_none() {
            "select a video"
        } else {
            phase_label(self.snapshot.phase)
        };

        let surface = container(
            column![
                text(self.snapshot.title.as_deref().unwrap_or("Trimdeck")).size(20),
                text(surface_line),
            ]
            .spacing(8),
        )
        .width(Length::Fill)
        .height(Length::Fixed(240.0))
        .padding(16)
        .style(container::rounded_box);

        let transport = row![
            button("Play")
                .on_press_maybe((self.snapshot.phase == Phase::ReadyPaused).then_some(Message::PlayPressed)),
            button("Pause")
                .on_press_maybe((self.snapshot.phase == Phase::ReadyPlaying).then_some(Message::PausePressed)),
            text(format!(
                "{} / {}",
                format_time(self.snapshot.current_time_seconds),
                format_time(self.snapshot.duration_seconds),
            )),
        ]
        .spacing(12);

        let trimbar = widgets::trimbar::view(
            &self.snapshot,
            &self.trimbar_cache,
            Message::TrimDragBegan,
            |x, track_width| Message::TrimDragMoved { x, track_width },
            || Message::TrimDragEnded,
            |x, track_width| Message::TrackPressed { x, track_width },
        );

        let trim_readout = text(format!(
            "Trim: {} to {}",
            format_time(self.snapshot.trim.start_seconds(self.snapshot.duration_seconds)),
            format_time(self.snapshot.trim.end_seconds(self.snapshot.duration_seconds)),
        ));

        let player_pane = column![
            surface,
            transport,
            trimbar,
            trim_readout,
            text(format!("Status: {}", self.status)),
        ]
        .spacing(12)
        .width(Length::Fill);

        row![library, player_pane].spacing(16).padding(16).into()
    }

    /// Subscribes to snapshots emitted by the player worker thread.
    pub fn subscription(&self) -> Subscription<Message> {
        player_subscription().map(Message::Bridge)
    }

    #[cfg(test)]
    fn from_sender_for_test(player_tx: PlayerCommandSender) -> Self {
        Self {
            player_tx: Some(player_tx),
            snapshot: PlayerSnapshot::idle(),
            videos: Vec::new(),
            next_page: 1,
            page_limit: 12,
            has_next_page: true,
            fetch_in_flight: false,
            listing_error: None,
            client: ListingClient::new("http://localhost:3000"),
            trimbar_cache: canvas::Cache::new(),
            status: String::from("idle"),
        }
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "starting",
        Phase::Initializing => "starting engine",
        Phase::ReadyNoMedia => "ready",
        Phase::Loading => "loading video",
        Phase::ReadyPaused => "paused",
        Phase::ReadyPlaying => "playing",
        Phase::Destroyed => "shut down",
    }
}

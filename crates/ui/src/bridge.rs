use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use iced::futures::{SinkExt, StreamExt, channel::mpsc as futures_mpsc, executor};
use iced::{Subscription, stream};
use player::{
    Command, Event, POLL_INTERVAL_MS, PROBE_INTERVAL_MS, PlaybackEngine, PlayerSnapshot,
    Synchronizer, TrimStore,
};
use tracing::debug;

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const SNAPSHOT_CHANNEL_CAPACITY: usize = 8;
const SUBSCRIPTION_CHANNEL_CAPACITY: usize = 32;

/// How often the worker checks for the bootstrapped engine instance while
/// none has arrived yet.
const BOOTSTRAP_CHECK: Duration = Duration::from_millis(50);
/// Wait cap when no poll or probe deadline is armed.
const IDLE_WAIT: Duration = Duration::from_secs(60);

/// Sender used by the UI thread to dispatch commands to the player thread.
pub type PlayerCommandSender = mpsc::SyncSender<Command>;

/// Receiver used by the UI thread to read snapshots from the player thread.
pub type SnapshotReceiver = mpsc::Receiver<PlayerSnapshot>;

/// Messages emitted by the player bridge subscription.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Ready(PlayerCommandSender),
    Snapshot(PlayerSnapshot),
    Disconnected,
}

/// Builds a subscription that starts the player bridge and forwards
/// snapshots.
pub fn player_subscription() -> Subscription<BridgeEvent> {
    Subscription::run(bridge_worker_stream)
}

fn bridge_worker_stream() -> impl iced::futures::Stream<Item = BridgeEvent> {
    bridge_worker_stream_with(spawn_sim_bridge)
}

fn bridge_worker_stream_with(
    spawn_bridge: fn() -> (PlayerCommandSender, SnapshotReceiver),
) -> impl iced::futures::Stream<Item = BridgeEvent> {
    stream::channel(
        SUBSCRIPTION_CHANNEL_CAPACITY,
        move |mut output| async move {
            let (player_tx, snapshot_rx) = spawn_bridge();
            let _ = output.send(BridgeEvent::Ready(player_tx)).await;

            let (forward_tx, mut forward_rx) =
                futures_mpsc::channel::<BridgeEvent>(SUBSCRIPTION_CHANNEL_CAPACITY);

            thread::spawn(move || {
                let mut forward_tx = forward_tx;
                while let Ok(snapshot) = snapshot_rx.recv() {
                    if executor::block_on(forward_tx.send(BridgeEvent::Snapshot(snapshot))).is_err()
                    {
                        return;
                    }
                }
                let _ = executor::block_on(forward_tx.send(BridgeEvent::Disconnected));
            });

            while let Some(event) = forward_rx.next().await {
                if output.send(event).await.is_err() {
                    break;
                }
            }
        },
    )
}

/// Spawns the production bridge backed by the simulated playback engine.
pub fn spawn_sim_bridge() -> (PlayerCommandSender, SnapshotReceiver) {
    if !player::request_bootstrap() {
        debug!("engine loader already requested in this process");
    }
    let store = TrimStore::open_default();
    debug!(path = ?store.path(), "trim store opened");
    spawn_player_bridge(Synchronizer::new(store), engine_sim::spawn_bootstrap())
}

/// Spawns a bridge around any playback engine. The engine instance arrives
/// on `engine_rx` once its asynchronous bootstrap finishes; delivery doubles
/// as the ready notification.
pub fn spawn_player_bridge<E>(
    mut sync: Synchronizer<E>,
    engine_rx: mpsc::Receiver<E>,
) -> (PlayerCommandSender, SnapshotReceiver)
where
    E: PlaybackEngine + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (snapshot_tx, snapshot_rx) =
        mpsc::sync_channel::<PlayerSnapshot>(SNAPSHOT_CHANNEL_CAPACITY);

    thread::spawn(move || {
        let start_events = sync.start();
        let mut worker = Worker {
            sync,
            snapshot_tx,
            poll_due: None,
            probes: Vec::new(),
        };
        if !worker.apply(start_events) {
            return;
        }
        worker.run(command_rx, engine_rx);
    });

    (command_tx, snapshot_rx)
}

/// Owns the synchronizer on its dedicated thread and turns its timer events
/// into real deadlines: one re-armed poll tick plus one-shot duration probes.
struct Worker<E: PlaybackEngine> {
    sync: Synchronizer<E>,
    snapshot_tx: mpsc::SyncSender<PlayerSnapshot>,
    poll_due: Option<Instant>,
    probes: Vec<(Instant, u64)>,
}

impl<E: PlaybackEngine> Worker<E> {
    fn run(mut self, command_rx: mpsc::Receiver<Command>, engine_rx: mpsc::Receiver<E>) {
        let mut engine_rx = Some(engine_rx);

        loop {
            if let Some(rx) = engine_rx.as_ref() {
                if let Ok(instance) = rx.try_recv() {
                    self.sync.attach_engine(instance);
                    let events = self.sync.engine_ready();
                    if !self.apply(events) {
                        return;
                    }
                    engine_rx = None;
                }
            }

            match command_rx.recv_timeout(self.wait_budget(engine_rx.is_some())) {
                Ok(Command::Teardown) => {
                    let events = self.sync.handle_command(Command::Teardown);
                    let _ = self.apply(events);
                    return;
                }
                Ok(command) => {
                    let events = self.sync.handle_command(command);
                    if !self.apply(events) {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !self.fire_due() {
                        return;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("command channel closed, tearing down playback");
                    let _ = self.sync.handle_command(Command::Teardown);
                    return;
                }
            }
        }
    }

    /// Forwards snapshots to the UI and folds timer events into deadlines.
    /// Returns `false` once the UI side is gone.
    fn apply(&mut self, events: Vec<Event>) -> bool {
        for event in events {
            match event {
                Event::SnapshotChanged(snapshot) => {
                    if self.snapshot_tx.send(snapshot).is_err() {
                        return false;
                    }
                }
                Event::PollStarted => {
                    self.poll_due =
                        Some(Instant::now() + Duration::from_millis(POLL_INTERVAL_MS));
                }
                Event::PollStopped => {
                    self.poll_due = None;
                }
                Event::ProbeScheduled { generation, .. } => {
                    self.probes.push((
                        Instant::now() + Duration::from_millis(PROBE_INTERVAL_MS),
                        generation,
                    ));
                }
            }
        }
        true
    }

    fn wait_budget(&self, awaiting_engine: bool) -> Duration {
        let now = Instant::now();
        let mut next = self.poll_due;
        for (due, _) in &self.probes {
            next = Some(next.map_or(*due, |current| current.min(*due)));
        }

        let mut wait = next.map_or(IDLE_WAIT, |due| due.saturating_duration_since(now));
        if awaiting_engine {
            wait = wait.min(BOOTSTRAP_CHECK);
        }
        wait
    }

    fn fire_due(&mut self) -> bool {
        let now = Instant::now();

        if self.poll_due.is_some_and(|due| due <= now) {
            self.poll_due = Some(now + Duration::from_millis(POLL_INTERVAL_MS));
            let events = self.sync.handle_command(Command::PollTick);
            if !self.apply(events) {
                return false;
            }
        }

        let mut due_generations = Vec::new();
        self.probes.retain(|(due, generation)| {
            if *due <= now {
                due_generations.push(*generation);
                false
            } else {
                true
            }
        });
        for generation in due_generations {
            let events = self
                .sync
                .handle_command(Command::ProbeDuration { generation });
            if !self.apply(events) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use engine_sim::SimEngine;
    use iced::futures::{StreamExt, executor, pin_mut};
    use player::{Command, Phase, PlayerSnapshot, Synchronizer, TrimStore, VideoSelection};
    use tempfile::TempDir;

    use super::{
        BridgeEvent, PlayerCommandSender, SnapshotReceiver, bridge_worker_stream_with,
        spawn_player_bridge,
    };

    fn demo_selection() -> VideoSelection {
        VideoSelection {
            id: String::from("dQw4w9WgXcQ"),
            title: String::from("Demo video"),
        }
    }

    fn spawn_bridge_in(dir: &TempDir) -> (PlayerCommandSender, SnapshotReceiver) {
        let store = TrimStore::open(dir.path().join("trim_store.json"));
        let (engine_tx, engine_rx) = mpsc::sync_channel(1);
        engine_tx
            .send(SimEngine::with_demo_catalog().with_cue_latency(Duration::ZERO))
            .expect("preload engine instance");
        spawn_player_bridge(Synchronizer::new(store), engine_rx)
    }

    fn wait_for_phase(snapshot_rx: &SnapshotReceiver, phase: Phase) -> PlayerSnapshot {
        loop {
            let snapshot = snapshot_rx
                .recv_timeout(Duration::from_secs(2))
                .expect("snapshot before timeout");
            if snapshot.phase == phase {
                return snapshot;
            }
        }
    }

    #[test]
    fn selection_reaches_paused_at_resolved_duration() {
        let dir = TempDir::new().expect("temp dir");
        let (command_tx, snapshot_rx) = spawn_bridge_in(&dir);

        command_tx
            .send(Command::Select(demo_selection()))
            .expect("send select");

        let snapshot = wait_for_phase(&snapshot_rx, Phase::ReadyPaused);
        assert_eq!(snapshot.duration_seconds, 212.0);
        assert_eq!(snapshot.current_time_seconds, 0.0);
        assert!(snapshot.engine_ready);
    }

    #[test]
    fn saved_trim_restores_paused_position_at_trim_start() {
        let dir = TempDir::new().expect("temp dir");
        let store_path = dir.path().join("trim_store.json");
        let mut store = TrimStore::open(&store_path);
        store
            .save(
                "dQw4w9WgXcQ",
                player::TrimRange {
                    start: 20.0,
                    end: 80.0,
                },
            )
            .expect("seed trim range");

        let (engine_tx, engine_rx) = mpsc::sync_channel(1);
        engine_tx
            .send(SimEngine::with_demo_catalog().with_cue_latency(Duration::ZERO))
            .expect("preload engine instance");
        let (command_tx, snapshot_rx) =
            spawn_player_bridge(Synchronizer::new(TrimStore::open(&store_path)), engine_rx);

        command_tx
            .send(Command::Select(demo_selection()))
            .expect("send select");

        let snapshot = wait_for_phase(&snapshot_rx, Phase::ReadyPaused);
        assert_eq!(snapshot.trim.start, 20.0);
        assert_eq!(snapshot.current_time_seconds, 212.0 * 0.2);
    }

    #[test]
    fn play_starts_polling_and_pause_returns_to_paused() {
        let dir = TempDir::new().expect("temp dir");
        let (command_tx, snapshot_rx) = spawn_bridge_in(&dir);

        command_tx
            .send(Command::Select(demo_selection()))
            .expect("send select");
        wait_for_phase(&snapshot_rx, Phase::ReadyPaused);

        command_tx.send(Command::Play).expect("send play");
        let playing = wait_for_phase(&snapshot_rx, Phase::ReadyPlaying);
        assert!(playing.is_playing);

        command_tx.send(Command::Pause).expect("send pause");
        let paused = wait_for_phase(&snapshot_rx, Phase::ReadyPaused);
        assert!(!paused.is_playing);
    }

    #[test]
    fn dropping_command_sender_tears_the_worker_down() {
        let dir = TempDir::new().expect("temp dir");
        let (command_tx, snapshot_rx) = spawn_bridge_in(&dir);

        command_tx
            .send(Command::Select(demo_selection()))
            .expect("send select");
        wait_for_phase(&snapshot_rx, Phase::ReadyPaused);

        drop(command_tx);

        // Worker exits and drops its snapshot sender; the channel drains and
        // then disconnects.
        loop {
            match snapshot_rx.recv_timeout(Duration::from_secs(2)) {
                Ok(_) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => panic!("worker did not shut down"),
            }
        }
    }

    #[test]
    fn bridge_worker_stream_emits_ready_snapshots_and_disconnected() {
        let (bridge_tx, bridge_rx) = mpsc::channel::<BridgeEvent>();

        thread::spawn(move || {
            let stream = bridge_worker_stream_with(spawn_stream_bridge);
            executor::block_on(async move {
                pin_mut!(stream);
                while let Some(event) = stream.next().await {
                    let done = matches!(event, BridgeEvent::Disconnected);
                    if bridge_tx.send(event).is_err() || done {
                        break;
                    }
                }
            });
        });

        let ready = bridge_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("ready event");
        let BridgeEvent::Ready(command_tx) = ready else {
            panic!("expected BridgeEvent::Ready");
        };

        command_tx
            .send(Command::Select(demo_selection()))
            .expect("send select");

        loop {
            let event = bridge_rx
                .recv_timeout(Duration::from_secs(2))
                .expect("forwarded event");
            match event {
                BridgeEvent::Snapshot(snapshot) if snapshot.phase == Phase::ReadyPaused => break,
                BridgeEvent::Snapshot(_) => continue,
                other => panic!("unexpected event before paused: {other:?}"),
            }
        }

        drop(command_tx);

        loop {
            match bridge_rx.recv_timeout(Duration::from_secs(2)) {
                Ok(BridgeEvent::Disconnected) => break,
                Ok(BridgeEvent::Snapshot(_)) => continue,
                Ok(other) => panic!("unexpected event: {other:?}"),
                Err(error) => panic!("stream ended without disconnect: {error}"),
            }
        }
    }

    fn spawn_stream_bridge() -> (PlayerCommandSender, SnapshotReceiver) {
        let path = std::env::temp_dir().join(format!(
            "trimdeck-bridge-stream-{}.json",
            std::process::id()
        ));
        let store = TrimStore::open(path);
        let (engine_tx, engine_rx) = mpsc::sync_channel(1);
        engine_tx
            .send(SimEngine::with_demo_catalog().with_cue_latency(Duration::ZERO))
            .expect("preload engine instance");
        spawn_player_bridge(Synchronizer::new(store), engine_rx)
    }
}

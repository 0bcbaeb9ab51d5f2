//! Async handle that drives a [`GameController`] in real time.
//!
//! The controller itself never touches a timer. A session owns it behind a
//! `tokio::sync::Mutex`, keeps at most one tick task alive while the clock
//! runs, republishes controller events on a broadcast channel and writes
//! snapshots to an optional store.

use super::ticker::{spawn_tick_loop, Ticker};
use crate::config::{EngineConfig, FieldPreset};
use crate::engine::{ApplyReport, ClockAdvance, GameController, GameEvent, GameView, PositionToggle, Routed};
use crate::error::Outcome;
use crate::models::{PlayerId, Position};
use crate::save::{load_game, save_game, LoadReport, SaveError, SnapshotStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub(crate) struct SessionInner {
    pub(crate) game: GameController,
    pub(crate) ticker: Ticker,
    store: Option<Box<dyn SnapshotStore>>,
    events: broadcast::Sender<GameEvent>,
    secs_since_save: u32,
}

impl SessionInner {
    fn new(game: GameController, store: Option<Box<dyn SnapshotStore>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { game, ticker: Ticker::default(), store, events, secs_since_save: 0 }
    }

    /// One second of wall time. Returns whether the loop should keep going.
    pub(crate) fn on_tick(&mut self) -> bool {
        self.game.tick();
        self.flush();
        self.game.is_running()
    }

    /// Publish pending events and save if they call for it.
    fn flush(&mut self) {
        let mut structural = false;
        for event in self.game.drain_events() {
            match &event {
                GameEvent::TimeAdvanced { seconds } => {
                    self.secs_since_save = self.secs_since_save.saturating_add(*seconds);
                }
                _ => structural |= event.is_structural(),
            }
            // no receivers is fine
            let _ = self.events.send(event);
        }

        if structural || self.secs_since_save >= self.game.config().autosave_interval_secs {
            self.autosave();
        }
    }

    fn autosave(&mut self) {
        self.secs_since_save = 0;
        if let Some(store) = self.store.as_deref_mut() {
            if let Err(err) = save_game(store, &self.game) {
                log::warn!("autosave failed (recoverable: {}): {err}", err.is_recoverable());
            }
        }
    }
}

/// Exactly one live tick task while the clock runs and the session is not
/// suspended; none otherwise. `inner` is the locked contents of `shared`.
fn sync_ticker(shared: &Arc<Mutex<SessionInner>>, inner: &mut SessionInner, period: Duration) {
    let should_tick = inner.game.is_running() && inner.game.suspension().is_none();
    if should_tick {
        if inner.ticker.arm(|generation| spawn_tick_loop(shared, generation, period)) {
            log::debug!("ticker armed (generation {})", inner.ticker.generation());
        }
    } else if inner.ticker.disarm() {
        log::debug!("ticker disarmed");
    }
}

/// Cloneable handle; all clones share one game.
#[derive(Clone)]
pub struct LiveSession {
    inner: Arc<Mutex<SessionInner>>,
    events: broadcast::Sender<GameEvent>,
    tick_period: Duration,
}

impl LiveSession {
    pub fn new(config: EngineConfig) -> Self {
        Self::from_game(GameController::new(config), None)
    }

    pub fn with_store(config: EngineConfig, store: Box<dyn SnapshotStore>) -> Self {
        Self::from_game(GameController::new(config), Some(store))
    }

    /// Load the last snapshot from `store` (or start fresh) and resume
    /// ticking if the saved clock was running.
    ///
    /// Must be called inside a tokio runtime.
    pub fn restore(config: EngineConfig, store: Box<dyn SnapshotStore>) -> (Self, LoadReport) {
        let (game, report) = load_game(store.as_ref(), config);
        if !report.is_clean() {
            log::warn!("restored with {} repair(s)", report.warnings.len());
        }
        let session = Self::from_game(game, Some(store));
        // nobody else holds the lock yet
        if let Ok(mut inner) = session.inner.try_lock() {
            sync_ticker(&session.inner, &mut inner, session.tick_period);
        }
        (session, report)
    }

    fn from_game(game: GameController, store: Option<Box<dyn SnapshotStore>>) -> Self {
        let inner = SessionInner::new(game, store);
        let events = inner.events.clone();
        Self { inner: Arc::new(Mutex::new(inner)), events, tick_period: TICK_PERIOD }
    }

    /// Events published after this call. Slow receivers may lag.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Run `f` against the controller, then bring the ticker in line with the
    /// clock and publish what changed.
    async fn command<T>(&self, f: impl FnOnce(&mut GameController) -> T) -> T {
        let mut inner = self.inner.lock().await;
        let out = f(&mut inner.game);
        sync_ticker(&self.inner, &mut inner, self.tick_period);
        inner.flush();
        out
    }

    // ========================
    // Read access
    // ========================

    pub async fn view(&self) -> GameView {
        self.inner.lock().await.game.view()
    }

    /// Read anything off the controller without mutating it.
    pub async fn read<T>(&self, f: impl FnOnce(&GameController) -> T) -> T {
        f(&self.inner.lock().await.game)
    }

    pub async fn is_ticking(&self) -> bool {
        self.inner.lock().await.ticker.is_armed()
    }

    // ========================
    // Clock
    // ========================

    pub async fn start(&self) {
        self.command(|game| game.start_game()).await
    }

    pub async fn pause(&self) {
        self.command(|game| game.pause_game()).await
    }

    pub async fn reset_game(&self) {
        self.command(|game| game.reset_game()).await
    }

    pub async fn reset_clock_only(&self) {
        self.command(|game| game.reset_clock_only()).await
    }

    pub async fn set_duration(&self, seconds: u32) {
        self.command(|game| game.set_duration(seconds)).await
    }

    // ========================
    // Roster
    // ========================

    pub async fn add_player(&self, first_name: &str, last_name: Option<&str>, number: Option<u8>) -> Outcome<PlayerId> {
        self.command(|game| game.add_player(first_name, last_name, number)).await
    }

    pub async fn remove_player(&self, id: PlayerId) -> Outcome {
        self.command(|game| game.remove_player(id)).await
    }

    pub async fn rename_player(&self, id: PlayerId, first_name: &str, last_name: Option<&str>) -> Outcome {
        self.command(|game| game.rename_player(id, first_name, last_name)).await
    }

    pub async fn set_player_number(&self, id: PlayerId, number: Option<u8>) -> Outcome {
        self.command(|game| game.set_player_number(id, number)).await
    }

    pub async fn reorder_player(&self, from: usize, to: usize) -> Outcome {
        self.command(|game| game.reorder_player(from, to)).await
    }

    // ========================
    // Lineup
    // ========================

    pub async fn assign_or_queue(&self, player: PlayerId, position: Position) -> Outcome<Routed> {
        self.command(|game| game.assign_or_queue(player, position)).await
    }

    pub async fn apply_queue(&self) -> Outcome<ApplyReport> {
        self.command(|game| game.apply_queue()).await
    }

    pub async fn clear_queue(&self) -> usize {
        self.command(|game| game.clear_queue()).await
    }

    pub async fn cancel_queued(&self, player: PlayerId) -> Outcome {
        self.command(|game| game.cancel_queued(player)).await
    }

    pub async fn set_active_position(&self, position: Position, toggle: PositionToggle) -> Outcome {
        self.command(|game| game.set_active_position(position, toggle)).await
    }

    pub async fn apply_preset(&self, preset: FieldPreset) {
        self.command(|game| game.apply_preset(preset)).await
    }

    // ========================
    // Suspension
    // ========================

    /// Stop ticking and remember when. The snapshot written here carries the
    /// timestamp, so catch-up also works after a process restart.
    pub async fn prepare_for_suspension(&self) {
        self.command(|game| game.prepare_for_suspension()).await
    }

    pub async fn resume(&self) -> Option<ClockAdvance> {
        self.command(|game| game.resume()).await
    }

    pub async fn prepare_for_suspension_at(&self, now_ms: u64) {
        self.command(|game| game.prepare_for_suspension_at(now_ms)).await
    }

    pub async fn resume_at(&self, now_ms: u64) -> Option<ClockAdvance> {
        self.command(|game| game.resume_at(now_ms)).await
    }

    // ========================
    // Persistence
    // ========================

    /// Save immediately. `Ok(false)` when the session has no store.
    pub async fn save_now(&self) -> Result<bool, SaveError> {
        let mut inner = self.inner.lock().await;
        inner.secs_since_save = 0;
        let SessionInner { game, store, .. } = &mut *inner;
        match store.as_deref_mut() {
            Some(store) => save_game(store, game).map(|_| true),
            None => Ok(false),
        }
    }

    /// Inspect the backing store, if any.
    pub async fn with_store_ref<T>(&self, f: impl FnOnce(&dyn SnapshotStore) -> T) -> Option<T> {
        self.inner.lock().await.store.as_deref().map(f)
    }
}

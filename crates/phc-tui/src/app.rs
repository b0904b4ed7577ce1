//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks: terminal input, the metadata feed, enrichment lookups, the audio engine.
//! - The event loop draws each frame, then awaits the next message or tick.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Player transitions return `PlayerEffect`s, which App carries out against
//!   the audio engine and the feed link.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Block,
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use phc_core::config::Config;
use phc_core::debounce::Debouncer;
use phc_core::enrich::{Enrichment, ItunesClient};
use phc_core::feed::FeedEvent;
use phc_core::metadata::StationIdentity;
use phc_core::pipeline::{EnrichRequest, MetadataPipeline};
use phc_core::storage::StorageError;
use phc_core::theme::ThemeStore;

use crate::{
    action::Action,
    app_state::{AppState, FeedStatus},
    audio::{AudioCommand, AudioEngine, SharedAnalyser},
    component::Component,
    components::{
        help_overlay::{centered_rect, HelpOverlay},
        history_panel::HistoryPanel,
        now_playing::NowPlayingBar,
        scope_panel::ScopePanel,
        theme_panel::ThemePanel,
    },
    feed_link::FeedLink,
    player::{MediaEvent, Player, PlayerEffect},
    widgets::{pane_chrome::SPINNER_FRAMES, toast::ToastManager},
};

// ── Internal event bus ────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    Feed(FeedEvent),
    /// Lookup result, keyed by what was playing when it was scheduled.
    Enriched(EnrichRequest, Enrichment),
    Media(MediaEvent),
}

impl From<FeedEvent> for AppMessage {
    fn from(ev: FeedEvent) -> Self {
        AppMessage::Feed(ev)
    }
}

const METER_FPS: u64 = 25;
const BAR_HEIGHT: u16 = 4;

pub struct App {
    state: AppState,
    theme_store: ThemeStore,
    toast: ToastManager,

    now_playing: NowPlayingBar,
    history_panel: HistoryPanel,
    theme_panel: ThemePanel,
    help_overlay: HelpOverlay,
    scope_panel: ScopePanel,

    feed: FeedLink,
    enrich_debounce: Debouncer,
    itunes: Option<ItunesClient>,

    audio_tx: mpsc::Sender<AudioCommand>,
    audio_task: Option<tokio::task::JoinHandle<()>>,

    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    should_quit: bool,
}

impl App {
    /// Build the app and start the audio engine. Must run inside a runtime.
    pub fn new(config: &Config, theme_store: ThemeStore) -> Self {
        let (tx, rx) = mpsc::channel::<AppMessage>(1024);
        let analyser = SharedAnalyser::default();
        let engine = AudioEngine::new(
            config.stream.stream_url.clone(),
            config.player.default_volume.clamp(0.0, 1.0),
            Arc::clone(&analyser),
            tx.clone(),
        );
        let (audio_tx, audio_task) = engine.spawn();
        let mut app = Self::assemble(config, theme_store, analyser, audio_tx, tx, rx);
        app.audio_task = Some(audio_task);
        app
    }

    fn assemble(
        config: &Config,
        theme_store: ThemeStore,
        analyser: SharedAnalyser,
        audio_tx: mpsc::Sender<AudioCommand>,
        tx: mpsc::Sender<AppMessage>,
        rx: mpsc::Receiver<AppMessage>,
    ) -> Self {
        let pipeline = MetadataPipeline::new(
            StationIdentity::from(&config.station),
            config.player.history_limit,
        );
        let state = AppState::new(
            pipeline,
            Player::new(config.player.default_volume),
            theme_store.theme(),
        );
        let itunes = match ItunesClient::from_config(&config.enrichment) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("enrichment disabled: {}", e);
                None
            }
        };

        Self {
            state,
            theme_store,
            toast: ToastManager::new(),
            now_playing: NowPlayingBar::new(),
            history_panel: HistoryPanel::new(),
            theme_panel: ThemePanel::new(),
            help_overlay: HelpOverlay::new(),
            scope_panel: ScopePanel::new(analyser),
            feed: FeedLink::new(
                config.feed.metadata_url.clone(),
                Duration::from_millis(config.feed.reconnect_ms),
            ),
            enrich_debounce: Debouncer::new(Duration::from_millis(config.enrichment.debounce_ms)),
            itunes,
            audio_tx,
            audio_task: None,
            tx,
            rx: Some(rx),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut rx = self
            .rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app event loop already started"))?;

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // Toast expiry + spinner animation.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Waveform frame tick; frames only flow while the draw loop runs.
        let mut meter_tick = tokio::time::interval(Duration::from_millis(1000 / METER_FPS));
        meter_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg).await;
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else { break };
                        drained += 1;
                        redraw |= self.handle_message(next).await;
                    }
                    needs_redraw = redraw;
                }

                _ = ui_tick.tick() => {
                    self.toast.tick();
                    if self.state.player.is_loading() {
                        self.state.spinner_frame =
                            (self.state.spinner_frame + 1) % SPINNER_FRAMES.len();
                    }
                    needs_redraw = true;
                }

                _ = meter_tick.tick() => {
                    needs_redraw = self.on_frame();
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.shutdown().await;
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Cancel everything in flight and stop the audio engine.
    async fn shutdown(&mut self) {
        info!("shutting down");
        self.enrich_debounce.cancel();
        self.feed.close();
        self.state.feed_status = FeedStatus::Closed;
        let _ = self.audio_tx.send(AudioCommand::Shutdown).await;
        if let Some(task) = self.audio_task.take() {
            if tokio::time::timeout(Duration::from_secs(3), task).await.is_err() {
                warn!("audio engine did not stop in time");
            }
        }
    }

    /// One draw-loop frame. Returns whether anything changed.
    fn on_frame(&mut self) -> bool {
        if self.state.player.draw_loop().next_frame().is_none() {
            return false;
        }
        self.scope_panel.capture();
        true
    }

    // ── Messages ──────────────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,

            AppMessage::Feed(ev) => self.on_feed_event(ev),

            AppMessage::Enriched(req, found) => {
                let wb = self.state.pipeline.apply_enrichment(&req, &found);
                debug!("enrichment for {:?} / {:?}: {:?}", req.title, req.artist, wb);
                wb.changed()
            }

            AppMessage::Media(ev) => {
                let effects = self.state.player.on_media_event(&ev);
                if let MediaEvent::Failed(reason) = &ev {
                    if !effects.is_empty() {
                        self.toast.error(format!("Playback failed: {}", reason));
                    }
                }
                self.run_effects(effects).await;
                true
            }
        }
    }

    fn on_feed_event(&mut self, ev: FeedEvent) -> bool {
        // Late events from a subscription that was closed on pause.
        if !self.feed.is_open() {
            return false;
        }
        match ev {
            FeedEvent::Open => {
                self.state.feed_status = FeedStatus::Open;
                true
            }
            FeedEvent::Message(data) => match self.state.pipeline.ingest(&data) {
                Ok(true) => {
                    // A new stream title, sentinel or not, supersedes the pending timer.
                    self.enrich_debounce.cancel();
                    if let Some(req) = self.state.pipeline.process() {
                        self.schedule_enrichment(req);
                    }
                    true
                }
                Ok(false) => false,
                Err(e) => {
                    warn!("dropping feed message {:?}: {}", data, e);
                    self.toast.error("Received malformed track metadata");
                    true
                }
            },
            FeedEvent::Error(e) => {
                debug!("feed error: {}", e);
                self.state.feed_status = FeedStatus::Reconnecting;
                self.toast.info("Metadata connection lost, reconnecting…");
                true
            }
        }
    }

    /// Replace any pending lookup with one for `req`.
    fn schedule_enrichment(&mut self, req: EnrichRequest) {
        let Some(client) = self.itunes.clone() else {
            return;
        };
        let tx = self.tx.clone();
        self.enrich_debounce.schedule(async move {
            match client.lookup(&req.search_term).await {
                Ok(Some(found)) => {
                    let _ = tx.send(AppMessage::Enriched(req, found)).await;
                }
                Ok(None) => debug!("no search result for {:?}", req.search_term),
                Err(e) => warn!("lookup for {:?} failed: {}", req.search_term, e),
            }
        });
    }

    // ── Player effects ────────────────────────────────────────────────────────

    async fn run_effects(&mut self, effects: Vec<PlayerEffect>) {
        for effect in effects {
            debug!("effect: {:?}", effect);
            match effect {
                PlayerEffect::BuildGraph => self.send_audio(AudioCommand::BuildGraph).await,
                PlayerEffect::ResumeContext => self.send_audio(AudioCommand::ResumeContext).await,
                PlayerEffect::StartPlayback => self.send_audio(AudioCommand::Play).await,
                PlayerEffect::PausePlayback => self.send_audio(AudioCommand::Pause).await,
                PlayerEffect::SuspendContext => self.send_audio(AudioCommand::SuspendContext).await,
                PlayerEffect::OpenFeed => {
                    self.feed.open(self.tx.clone());
                    self.state.feed_status = FeedStatus::Connecting;
                }
                PlayerEffect::CloseFeed => {
                    self.feed.close();
                    self.state.feed_status = FeedStatus::Closed;
                }
            }
        }
    }

    async fn send_audio(&self, cmd: AudioCommand) {
        if self.audio_tx.send(cmd).await.is_err() {
            warn!("audio engine gone, dropped {:?}", cmd);
        }
    }

    // ── Keys & actions ────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }
        // Topmost overlay gets the key.
        let target: &mut dyn Component = if self.help_overlay.visible {
            &mut self.help_overlay
        } else if self.theme_panel.visible {
            &mut self.theme_panel
        } else if self.history_panel.visible {
            &mut self.history_panel
        } else {
            &mut self.now_playing
        };
        let actions = target.handle_key(key, &self.state);
        trace!("key {:?} → {:?}: {:?}", key.code, target.id(), actions);
        actions
    }

    async fn dispatch(&mut self, action: Action) {
        if action != Action::Noop {
            debug!("dispatch: {:?}", action);
        }
        match action {
            Action::TogglePlay => {
                let effects = self.state.player.toggle();
                self.run_effects(effects).await;
            }
            Action::VolumeUp => {
                let v = self.state.player.volume_up();
                self.send_audio(AudioCommand::SetVolume(v)).await;
            }
            Action::VolumeDown => {
                let v = self.state.player.volume_down();
                self.send_audio(AudioCommand::SetVolume(v)).await;
            }

            Action::ToggleHistory => {
                self.theme_panel.visible = false;
                self.history_panel.toggle();
            }
            Action::ToggleThemePanel => {
                self.history_panel.visible = false;
                self.theme_panel.toggle(self.state.theme.color_scheme);
            }
            Action::ToggleHelp => self.help_overlay.toggle(),
            Action::ToggleExpanded => self.state.expanded = !self.state.expanded,

            Action::SetColorScheme(scheme) => {
                if scheme != self.state.theme.color_scheme {
                    let r = self.theme_store.set_color_scheme(scheme);
                    self.after_theme_change(r);
                }
            }
            Action::ToggleThemeMode => {
                let r = self.theme_store.toggle_mode();
                self.after_theme_change(r);
            }

            Action::OpenLink(url) => self.open_link(&url),
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        self.toast.success("Link copied to clipboard");
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            Action::Quit => self.should_quit = true,
            Action::Noop => {}
        }
    }

    fn after_theme_change(&mut self, result: Result<(), StorageError>) {
        if let Err(e) = result {
            warn!("theme not saved: {}", e);
            self.toast.error("Could not save theme preference");
        }
        self.state.set_theme(self.theme_store.theme());
    }

    fn open_link(&mut self, url: &str) {
        let (cmd, args) = phc_core::platform::url_opener();
        let spawned = std::process::Command::new(cmd)
            .args(args)
            .arg(url)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();
        match spawned {
            Ok(_) => {
                info!("opened {}", url);
                self.toast.info("Opening in browser…");
            }
            Err(e) => {
                warn!("could not run {}: {}", cmd, e);
                self.toast.error(format!("could not open link: {}", e));
            }
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(self.state.palette.style_base()), area);

        if self.state.expanded {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(8), Constraint::Length(6)])
                .split(area);
            self.now_playing.draw(frame, rows[0], &self.state);
            self.scope_panel.draw(frame, rows[1], &self.state);
        } else {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(BAR_HEIGHT)])
                .split(area);
            self.scope_panel.draw(frame, rows[0], &self.state);
            self.now_playing.draw(frame, rows[1], &self.state);
        }

        let overlay_area = Rect {
            height: area.height.saturating_sub(BAR_HEIGHT),
            ..area
        };
        if self.history_panel.visible {
            let w = (overlay_area.width / 2).max(40).min(overlay_area.width);
            let panel = Rect {
                x: overlay_area.x + overlay_area.width - w,
                width: w,
                ..overlay_area
            };
            self.history_panel.draw(frame, panel, &self.state);
        }
        if self.theme_panel.visible {
            let panel = centered_rect(40, ThemePanel::height(), overlay_area);
            self.theme_panel.draw(frame, panel, &self.state);
        }
        if self.help_overlay.visible {
            self.help_overlay.draw(frame, area, &self.state);
        }

        self.toast.draw(frame, area, &self.state.palette);
    }
}

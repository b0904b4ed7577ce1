//! Playback state machine.
//!
//! `Player` decides; it never performs I/O. Each transition returns the
//! [`PlayerEffect`]s the App must carry out (audio engine commands, feed
//! open/close). A failed effect is reported back through
//! [`Player::on_media_event`], which forces the state back to `Paused`.

pub const VOLUME_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayState {
    #[default]
    Paused,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEffect {
    /// Build the analysis graph. Emitted at most once per session.
    BuildGraph,
    ResumeContext,
    StartPlayback,
    OpenFeed,
    PausePlayback,
    SuspendContext,
    CloseFeed,
}

/// What the audio output reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// Buffering; more data needed before audio continues.
    Waiting,
    /// Enough data to play.
    CanPlay,
    /// Playback could not start or died.
    Failed(String),
}

/// Frame scheduler for the waveform. Frames are only handed out while the
/// loop is running.
#[derive(Debug, Default)]
pub struct DrawLoop {
    active: bool,
    frame: u64,
}

impl DrawLoop {
    fn start(&mut self) {
        self.active = true;
    }

    fn cancel(&mut self) {
        self.active = false;
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Next frame number, or `None` while cancelled.
    pub fn next_frame(&mut self) -> Option<u64> {
        if !self.active {
            return None;
        }
        self.frame += 1;
        Some(self.frame)
    }

    #[cfg(test)]
    pub fn frames_drawn(&self) -> u64 {
        self.frame
    }
}

#[derive(Debug)]
pub struct Player {
    state: PlayState,
    volume: f32,
    loading: bool,
    graph_built: bool,
    draw_loop: DrawLoop,
}

impl Player {
    pub fn new(volume: f32) -> Self {
        Self {
            state: PlayState::Paused,
            volume: volume.clamp(0.0, 1.0),
            loading: false,
            graph_built: false,
            draw_loop: DrawLoop::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[cfg(test)]
    pub fn graph_built(&self) -> bool {
        self.graph_built
    }

    pub fn draw_loop(&mut self) -> &mut DrawLoop {
        &mut self.draw_loop
    }

    pub fn toggle(&mut self) -> Vec<PlayerEffect> {
        match self.state {
            PlayState::Paused => self.play(),
            PlayState::Playing => self.pause(),
        }
    }

    fn play(&mut self) -> Vec<PlayerEffect> {
        self.state = PlayState::Playing;
        let mut effects = Vec::with_capacity(5);
        if !self.graph_built {
            self.graph_built = true;
            effects.push(PlayerEffect::BuildGraph);
        }
        effects.extend([
            PlayerEffect::ResumeContext,
            PlayerEffect::StartPlayback,
            PlayerEffect::OpenFeed,
        ]);
        self.draw_loop.start();
        effects
    }

    fn pause(&mut self) -> Vec<PlayerEffect> {
        self.state = PlayState::Paused;
        self.loading = false;
        self.draw_loop.cancel();
        vec![
            PlayerEffect::PausePlayback,
            PlayerEffect::SuspendContext,
            PlayerEffect::CloseFeed,
        ]
    }

    /// Apply an output event. Returns teardown effects when a failure forced
    /// the player back to `Paused`.
    pub fn on_media_event(&mut self, event: &MediaEvent) -> Vec<PlayerEffect> {
        match event {
            MediaEvent::Waiting => {
                if self.is_playing() {
                    self.loading = true;
                }
                Vec::new()
            }
            MediaEvent::CanPlay => {
                self.loading = false;
                Vec::new()
            }
            MediaEvent::Failed(reason) => {
                if !self.is_playing() {
                    return Vec::new();
                }
                tracing::warn!("playback failed, forcing pause: {}", reason);
                self.pause()
            }
        }
    }

    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = volume.clamp(0.0, 1.0);
        self.volume
    }

    pub fn volume_up(&mut self) -> f32 {
        self.set_volume(round_step(self.volume + VOLUME_STEP))
    }

    pub fn volume_down(&mut self) -> f32 {
        self.set_volume(round_step(self.volume - VOLUME_STEP))
    }
}

/// Snap to the step grid so repeated steps don't drift.
fn round_step(v: f32) -> f32 {
    (v / VOLUME_STEP).round() * VOLUME_STEP
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlayerEffect::*;

    #[test]
    fn test_first_play_builds_graph_once() {
        let mut p = Player::new(0.6);
        assert_eq!(p.toggle(), vec![BuildGraph, ResumeContext, StartPlayback, OpenFeed]);
        assert!(p.is_playing());
        assert_eq!(p.toggle(), vec![PausePlayback, SuspendContext, CloseFeed]);
        assert_eq!(p.toggle(), vec![ResumeContext, StartPlayback, OpenFeed]);
        assert!(p.graph_built());
    }

    #[test]
    fn test_off_then_on_rebuilds_feed() {
        let mut p = Player::new(0.6);
        let mut feed_open = false;
        for _ in 0..3 {
            for eff in p.toggle() {
                match eff {
                    OpenFeed => {
                        assert!(!feed_open);
                        feed_open = true;
                    }
                    CloseFeed => {
                        assert!(feed_open);
                        feed_open = false;
                    }
                    _ => {}
                }
            }
        }
        assert!(feed_open);
    }

    #[test]
    fn test_draw_loop_stops_while_paused() {
        let mut p = Player::new(0.6);
        assert_eq!(p.draw_loop().next_frame(), None);

        p.toggle();
        assert_eq!(p.draw_loop().next_frame(), Some(1));
        assert_eq!(p.draw_loop().next_frame(), Some(2));

        p.toggle();
        for _ in 0..10 {
            assert_eq!(p.draw_loop().next_frame(), None);
        }
        assert_eq!(p.draw_loop().frames_drawn(), 2);
    }

    #[test]
    fn test_failed_start_forces_pause() {
        let mut p = Player::new(0.6);
        p.toggle();
        p.on_media_event(&MediaEvent::Waiting);
        let effects = p.on_media_event(&MediaEvent::Failed("blocked".into()));
        assert_eq!(effects, vec![PausePlayback, SuspendContext, CloseFeed]);
        assert_eq!(p.state(), PlayState::Paused);
        assert!(!p.is_loading());
        assert!(!p.draw_loop().is_active());

        // A late failure while already paused changes nothing.
        assert!(p.on_media_event(&MediaEvent::Failed("late".into())).is_empty());
    }

    #[test]
    fn test_loading_only_while_playing() {
        let mut p = Player::new(0.6);
        p.on_media_event(&MediaEvent::Waiting);
        assert!(!p.is_loading());

        p.toggle();
        p.on_media_event(&MediaEvent::Waiting);
        assert!(p.is_loading());
        p.on_media_event(&MediaEvent::CanPlay);
        assert!(!p.is_loading());

        p.on_media_event(&MediaEvent::Waiting);
        p.toggle();
        assert!(!p.is_loading());
    }

    #[test]
    fn test_volume_bounds() {
        let mut p = Player::new(1.7);
        assert_eq!(p.volume(), 1.0);
        assert_eq!(p.volume_up(), 1.0);
        for _ in 0..40 {
            p.volume_down();
        }
        assert_eq!(p.volume(), 0.0);
        p.set_volume(0.6);
        assert!((p.volume_up() - 0.65).abs() < 1e-6);
    }
}

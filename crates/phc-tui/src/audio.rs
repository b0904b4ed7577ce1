/// AudioEngine: single owner of the mpv process and the PCM analysis tap.
///
/// The App never talks to mpv directly. It sends [`AudioCommand`]s and gets
/// [`MediaEvent`]s back as `AppMessage::Media`. mpv plays the stream; a
/// separate ffmpeg process decodes the same URL to mono s16le and feeds the
/// shared [`Analyser`] the waveform reads from.
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::AppMessage;
use crate::mpv::{self, MpvDriver, MpvEvent, MpvHandle};
use crate::player::MediaEvent;
use crate::scope::analyser::{s16le_to_f32, Analyser};

pub const TAP_SAMPLE_RATE: u32 = 44_100;
const TAP_READ_BYTES: usize = 2048;

pub type SharedAnalyser = Arc<Mutex<Analyser>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCommand {
    BuildGraph,
    ResumeContext,
    Play,
    Pause,
    SuspendContext,
    SetVolume(f32),
    Shutdown,
}

/// Stream → analyser wiring. Built once; resumed and suspended with playback.
pub struct AnalysisGraph {
    stream_url: String,
    analyser: SharedAnalyser,
    tap: Option<tokio::task::AbortHandle>,
}

impl AnalysisGraph {
    pub fn new(stream_url: impl Into<String>, analyser: SharedAnalyser) -> Self {
        Self {
            stream_url: stream_url.into(),
            analyser,
            tap: None,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.tap.is_some()
    }

    pub fn resume(&mut self) {
        if self.tap.is_some() {
            return;
        }
        let url = self.stream_url.clone();
        let analyser = Arc::clone(&self.analyser);
        let handle = tokio::spawn(async move {
            if let Err(e) = run_pcm_tap(&url, &analyser).await {
                warn!("pcm tap stopped: {}", e);
            }
        });
        self.tap = Some(handle.abort_handle());
    }

    pub fn suspend(&mut self) {
        if let Some(tap) = self.tap.take() {
            tap.abort();
        }
        if let Ok(mut a) = self.analyser.lock() {
            a.reset();
        }
    }
}

impl Drop for AnalysisGraph {
    fn drop(&mut self) {
        if let Some(tap) = self.tap.take() {
            tap.abort();
        }
    }
}

async fn run_pcm_tap(url: &str, analyser: &SharedAnalyser) -> anyhow::Result<()> {
    use std::path::PathBuf;
    use tokio::process::Command;

    let rate = TAP_SAMPLE_RATE.to_string();
    let ffmpeg_bin =
        phc_core::platform::find_ffmpeg_binary().unwrap_or_else(|| PathBuf::from("ffmpeg"));
    let mut child = Command::new(ffmpeg_bin)
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostdin",
            "-fflags",
            "nobuffer",
            "-flags",
            "low_delay",
            "-probesize",
            "64k",
            "-i",
            url,
            "-vn",
            "-ac",
            "1",
            "-ar",
            &rate,
            "-f",
            "s16le",
            "pipe:1",
        ])
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("ffmpeg stdout not captured"))?;
    pump_pcm(stdout, analyser).await?;

    let status = child.wait().await?;
    if !status.success() {
        anyhow::bail!("ffmpeg exited: {}", status);
    }
    Ok(())
}

/// Read s16le from `reader` into the analyser until EOF. An odd trailing
/// byte is carried into the next read.
pub async fn pump_pcm<R>(mut reader: R, analyser: &SharedAnalyser) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; TAP_READ_BYTES + 1];
    let mut carry = 0usize;
    let mut samples = Vec::with_capacity(TAP_READ_BYTES / 2);
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf[carry..]).await?;
        if n == 0 {
            break;
        }
        let filled = carry + n;
        let even = filled & !1;
        samples.clear();
        s16le_to_f32(&buf[..even], &mut samples);
        total += samples.len() as u64;
        if let Ok(mut a) = analyser.lock() {
            a.push(&samples);
        }
        carry = filled - even;
        if carry == 1 {
            buf[0] = buf[even];
        }
    }
    Ok(total)
}

enum EngineEvent {
    Command(AudioCommand),
    Mpv(MpvEvent),
    Heartbeat,
}

pub struct AudioEngine {
    stream_url: String,
    volume: f32,
    analyser: SharedAnalyser,
    graph: Option<AnalysisGraph>,
    mpv_driver: MpvDriver,
    mpv_handle: Option<MpvHandle>,
    mpv_event_tx: mpsc::Sender<MpvEvent>,
    mpv_event_rx: mpsc::Receiver<MpvEvent>,
    app_tx: mpsc::Sender<AppMessage>,
    intend_playing: bool,
}

impl AudioEngine {
    pub fn new(
        stream_url: impl Into<String>,
        volume: f32,
        analyser: SharedAnalyser,
        app_tx: mpsc::Sender<AppMessage>,
    ) -> Self {
        let (mpv_event_tx, mpv_event_rx) = mpsc::channel(256);
        Self {
            stream_url: stream_url.into(),
            volume,
            analyser,
            graph: None,
            mpv_driver: MpvDriver::new(),
            mpv_handle: None,
            mpv_event_tx,
            mpv_event_rx,
            app_tx,
            intend_playing: false,
        }
    }

    /// Spawn the engine; the returned sender is its only input.
    pub fn spawn(self) -> (mpsc::Sender<AudioCommand>, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(64);
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<AudioCommand>) {
        info!("AudioEngine: starting");
        let mut heartbeat = tokio::time::interval(tokio::time::Duration::from_secs(10));
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            let event = tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(c) => EngineEvent::Command(c),
                    None => EngineEvent::Command(AudioCommand::Shutdown),
                },
                Some(ev) = self.mpv_event_rx.recv() => EngineEvent::Mpv(ev),
                _ = heartbeat.tick() => EngineEvent::Heartbeat,
            };

            match event {
                EngineEvent::Command(AudioCommand::Shutdown) => break,
                EngineEvent::Command(cmd) => self.handle_command(cmd).await,
                EngineEvent::Mpv(ev) => {
                    if !self.intend_playing {
                        continue;
                    }
                    if let Some(media) = mpv::media_event(&ev) {
                        debug!("AudioEngine: {:?}", media);
                        self.report(media).await;
                    }
                }
                EngineEvent::Heartbeat => {
                    if self.mpv_handle.is_some() && !self.mpv_driver.process_alive() {
                        self.mpv_handle = None;
                        if self.intend_playing {
                            self.report(MediaEvent::Failed("mpv exited".into())).await;
                        }
                    }
                }
            }
        }

        self.graph = None;
        if let Some(h) = self.mpv_handle.take() {
            let _ = h.stop().await;
        }
        self.mpv_driver.kill().await;
        info!("AudioEngine: stopped");
    }

    async fn handle_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::BuildGraph => {
                if self.graph.is_none() {
                    self.graph = Some(AnalysisGraph::new(
                        self.stream_url.clone(),
                        Arc::clone(&self.analyser),
                    ));
                }
            }
            AudioCommand::ResumeContext => {
                if let Some(g) = self.graph.as_mut() {
                    g.resume();
                }
            }
            AudioCommand::SuspendContext => {
                if let Some(g) = self.graph.as_mut() {
                    g.suspend();
                }
            }
            AudioCommand::Play => {
                self.intend_playing = true;
                if let Err(e) = self.start_playback().await {
                    warn!("AudioEngine: play failed: {}", e);
                    self.intend_playing = false;
                    self.report(MediaEvent::Failed(e.to_string())).await;
                }
            }
            AudioCommand::Pause => {
                self.intend_playing = false;
                if let Some(h) = &self.mpv_handle {
                    if let Err(e) = h.set_pause(true).await {
                        warn!("AudioEngine: pause failed: {}", e);
                    }
                }
            }
            AudioCommand::SetVolume(v) => {
                self.volume = v;
                if let Some(h) = &self.mpv_handle {
                    if let Err(e) = h.set_volume(v).await {
                        warn!("AudioEngine: set_volume failed: {}", e);
                    }
                }
            }
            AudioCommand::Shutdown => {}
        }
    }

    async fn start_playback(&mut self) -> anyhow::Result<()> {
        let handle = match self.mpv_handle.clone() {
            Some(h) if h.is_connected() => h,
            _ => {
                let h = self
                    .mpv_driver
                    .spawn_and_connect(self.volume, self.mpv_event_tx.clone())
                    .await?;
                h.observe_properties().await;
                self.mpv_handle = Some(h.clone());
                h
            }
        };
        // Live stream: always reload rather than resume stale buffered audio.
        handle.load_stream(&self.stream_url, self.volume).await
    }

    async fn report(&self, event: MediaEvent) {
        let _ = self.app_tx.send(AppMessage::Media(event)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(fft: usize) -> SharedAnalyser {
        Arc::new(Mutex::new(Analyser::new(fft)))
    }

    fn read_bytes(a: &SharedAnalyser, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        a.lock().unwrap().byte_time_domain(&mut out);
        out
    }

    #[tokio::test]
    async fn test_pump_pcm_fills_analyser() {
        let a = shared(4);
        let pcm: Vec<u8> = [i16::MAX, i16::MIN, 0, 0]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let n = pump_pcm(&pcm[..], &a).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(read_bytes(&a, 4), vec![255, 0, 128, 128]);
    }

    #[tokio::test]
    async fn test_pump_pcm_carries_odd_byte() {
        let a = shared(2);
        let (mut w, r) = tokio::io::duplex(64);
        let pump = {
            let a = Arc::clone(&a);
            tokio::spawn(async move { pump_pcm(r, &a).await.unwrap() })
        };
        use tokio::io::AsyncWriteExt;
        let bytes = i16::MIN.to_le_bytes();
        w.write_all(&[0x00, 0x00, bytes[0]]).await.unwrap();
        w.flush().await.unwrap();
        tokio::task::yield_now().await;
        w.write_all(&[bytes[1]]).await.unwrap();
        drop(w);
        assert_eq!(pump.await.unwrap(), 2);
        assert_eq!(read_bytes(&a, 2), vec![128, 0]);
    }

    #[tokio::test]
    async fn test_suspend_resets_to_silence() {
        let a = shared(4);
        a.lock().unwrap().push(&[0.5, 0.5, 0.5, 0.5]);
        let mut g = AnalysisGraph::new("http://127.0.0.1:1/none", Arc::clone(&a));
        assert!(!g.is_running());
        g.suspend();
        assert_eq!(read_bytes(&a, 4), vec![128; 4]);
    }
}

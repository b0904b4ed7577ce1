/// mpv JSON IPC driver.
///
/// ```text
///   MpvDriver::spawn_and_connect()
///         │
///         ├── writer_task   ← MpvRequest via mpsc → socket
///         └── reader_task   ← JSON lines from socket
///                                ├── reply (request_id)  → pending oneshot
///                                └── event               → event_tx
/// ```
///
/// Unsolicited events are mapped to [`MediaEvent`]s by [`media_event`].
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

use crate::player::MediaEvent;

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

pub const OBS_CORE_IDLE: u64 = 1;
pub const OBS_PAUSED_FOR_CACHE: u64 = 2;

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct MpvRequest {
    req_id: u64,
    payload: String,
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// Unsolicited event or property change.
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.event_name()? == "property-change" {
            let id = self.raw.get("id")?.as_u64()?;
            Some((id, self.raw.get("data").unwrap_or(&Value::Null)))
        } else {
            None
        }
    }

    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }
}

/// Translate an mpv event into what the player cares about.
///
/// Buffering: `start-file` and `paused-for-cache=true`. Ready:
/// `playback-restart`, `paused-for-cache=false`, `core-idle=false`.
/// An `end-file` with reason `error` is a failure.
pub fn media_event(ev: &MpvEvent) -> Option<MediaEvent> {
    if let Some((id, data)) = ev.as_property_change() {
        return match (id, data.as_bool()) {
            (OBS_PAUSED_FOR_CACHE, Some(true)) => Some(MediaEvent::Waiting),
            (OBS_PAUSED_FOR_CACHE, Some(false)) => Some(MediaEvent::CanPlay),
            (OBS_CORE_IDLE, Some(false)) => Some(MediaEvent::CanPlay),
            _ => None,
        };
    }
    match ev.event_name()? {
        "start-file" => Some(MediaEvent::Waiting),
        "playback-restart" => Some(MediaEvent::CanPlay),
        "end-file" if ev.raw.get("reason").and_then(Value::as_str) == Some("error") => {
            let detail = ev
                .raw
                .get("file_error")
                .and_then(Value::as_str)
                .unwrap_or("stream error");
            Some(MediaEvent::Failed(detail.to_string()))
        }
        _ => None,
    }
}

/// Cloneable command handle.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<MpvRequest>,
}

impl MpvHandle {
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let mut payload = serde_json::to_string(&json!({ "command": command, "request_id": req_id }))?;
        payload.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(MpvRequest {
                req_id,
                payload,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv writer task gone"))?;

        tokio::time::timeout(tokio::time::Duration::from_secs(5), reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }

    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    pub async fn load_stream(&self, url: &str, volume: f32) -> anyhow::Result<()> {
        debug!("mpv: loadfile {}", url);
        self.send(json!(["loadfile", url, "replace"])).await?;
        self.set_volume(volume).await?;
        self.set_pause(false).await
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    pub async fn set_volume(&self, vol: f32) -> anyhow::Result<()> {
        let pct = (vol * 100.0).clamp(0.0, 100.0);
        self.send(json!(["set_property", "volume", pct])).await?;
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(json!(["stop"])).await?;
        Ok(())
    }

    /// Must be called after every fresh connection.
    pub async fn observe_properties(&self) {
        for (id, name) in [
            (OBS_CORE_IDLE, "core-idle"),
            (OBS_PAUSED_FOR_CACHE, "paused-for-cache"),
        ] {
            if let Err(e) = self.send(json!(["observe_property", id, name])).await {
                warn!("mpv: observe_property {} failed: {}", name, e);
            }
        }
    }
}

/// Owns the mpv child process.
pub struct MpvDriver {
    socket_name: String,
    process: Option<tokio::process::Child>,
}

impl MpvDriver {
    pub fn new() -> Self {
        Self {
            socket_name: phc_core::platform::mpv_socket_name(),
            process: None,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(child) = self.process.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!("mpv exited: {}", status);
                false
            }
            Err(e) => {
                warn!("mpv process check failed: {}", e);
                false
            }
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
    }

    fn spawn_process(&mut self, volume: f32) -> anyhow::Result<()> {
        let mpv_binary = phc_core::platform::find_mpv_binary()
            .ok_or_else(|| anyhow::anyhow!("mpv not found (install mpv or put it beside the executable)"))?;

        let stderr_path = phc_core::platform::data_dir().join("mpv-stderr.log");
        let stderr = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;

        let child = tokio::process::Command::new(&mpv_binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--quiet")
            .arg(phc_core::platform::mpv_socket_arg())
            .arg(format!(
                "--volume={}",
                (volume * 100.0).clamp(0.0, 100.0).round() as i64
            ))
            .stdout(std::process::Stdio::null())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: spawned pid {:?}, stderr → {:?}", child.id(), stderr_path);
        self.process = Some(child);
        Ok(())
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        volume: f32,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;
        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        self.spawn_process(volume)?;

        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            if socket_path.exists() {
                break;
            }
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to {:?}", socket_path);
        let (read_half, write_half) = stream.into_split();
        Ok(start_io_tasks(read_half, write_half, event_tx))
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        volume: f32,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;
        self.spawn_process(volume)?;

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe_path) {
                info!("mpv: connected to {}", pipe_path);
                let (read_half, write_half) = tokio::io::split(client);
                return Ok(start_io_tasks(read_half, write_half, event_tx));
            }
        }
        anyhow::bail!("mpv named pipe did not appear")
    }
}

fn start_io_tasks<R, W>(read_half: R, write_half: W, event_tx: mpsc::Sender<MpvEvent>) -> MpvHandle
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let pending: Pending = Arc::default();
    let (cmd_tx, cmd_rx) = mpsc::channel::<MpvRequest>(64);
    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(BufReader::new(read_half), pending, event_tx));
    MpvHandle { tx: cmd_tx }
}

async fn fail_all(pending: &Pending, why: &str) {
    for (_, tx) in pending.lock().await.drain() {
        let _ = tx.send(Err(anyhow::anyhow!("{}", why)));
    }
}

async fn reader_task<R>(mut reader: BufReader<R>, pending: Pending, event_tx: mpsc::Sender<MpvEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection closed");
                fail_all(&pending, "mpv IPC connection closed").await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };

                if let Some(req_id) = val.get("request_id").and_then(Value::as_u64) {
                    let Some(tx) = pending.lock().await.remove(&req_id) else {
                        continue;
                    };
                    let result = match val["error"].as_str() {
                        Some("success") => Ok(val),
                        other => Err(anyhow::anyhow!("mpv error: {}", other.unwrap_or("unknown"))),
                    };
                    let _ = tx.send(result);
                } else if event_tx.send(MpvEvent { raw: val }).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                fail_all(&pending, "mpv IPC read error").await;
                break;
            }
        }
    }
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<MpvRequest>, pending: Pending)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register before writing so the reader can always match the reply.
        pending.lock().await.insert(req.req_id, req.reply);
        debug!("mpv writer: req={} {}", req.req_id, req.payload.trim());
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: exiting");
}

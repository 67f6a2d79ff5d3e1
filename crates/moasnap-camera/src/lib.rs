//! Camera session ownership: exclusive stream acquisition, facing-mode
//! control, and the live preview feed.

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use moasnap_types::{
    camera::{CaptureConstraints, FacingMode, SessionStatus},
    frame::LiveFrame,
    Result, SnapError,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

pub mod ffmpeg;

/// Device media layer. Opening hands back an owned, exclusive frame source.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, constraints: &CaptureConstraints) -> Result<Box<dyn FrameSource>>;
}

#[async_trait]
pub trait FrameSource: Send {
    async fn read_frame(&mut self) -> Result<LiveFrame>;
    /// Releases the underlying resource. Must be idempotent.
    async fn stop(&mut self);
}

/// Owns the camera resource and its facing-mode state. At most one
/// Active/Opening session exists because the manager is the sole owner of
/// the source handle and always closes before reopening.
pub struct CaptureSessionManager<D: CameraDevice> {
    device: D,
    facing: FacingMode,
    status: SessionStatus,
    source: Option<Box<dyn FrameSource>>,
    preview_tx: broadcast::Sender<LiveFrame>,
}

impl<D: CameraDevice> CaptureSessionManager<D> {
    pub fn new(device: D) -> Self {
        let (preview_tx, _) = broadcast::channel(16);
        Self {
            device,
            facing: FacingMode::default(),
            status: SessionStatus::Closed,
            source: None,
            preview_tx,
        }
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Acquires the device stream. An already-open session is fully closed
    /// first so two streams never coexist. On failure the session stays
    /// Closed; retry is up to the caller.
    pub async fn open_session(&mut self, facing: FacingMode) -> Result<()> {
        if self.status != SessionStatus::Closed {
            self.close_session().await;
        }

        self.facing = facing;
        self.status = SessionStatus::Opening;
        info!("카메라 세션 열기: facing={}", facing.as_constraint());

        match self
            .device
            .open(&CaptureConstraints::square_hd(facing))
            .await
        {
            Ok(source) => {
                self.source = Some(source);
                self.status = SessionStatus::Active;
                Ok(())
            }
            Err(err) => {
                self.status = SessionStatus::Closed;
                Err(device_error(format!("카메라를 열 수 없습니다: {err}")))
            }
        }
    }

    /// Stops and releases the stream. Safe to call on every exit path; a
    /// second call is a no-op.
    pub async fn close_session(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop().await;
            info!("카메라 세션 종료");
        }
        self.status = SessionStatus::Closed;
    }

    /// Flips the facing mode. The current stream is fully closed strictly
    /// before the new one is requested.
    pub async fn toggle_facing(&mut self) -> Result<()> {
        let next = self.facing.flipped();
        self.close_session().await;
        self.open_session(next).await
    }

    pub async fn read_frame(&mut self) -> Result<LiveFrame> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| device_error("세션이 활성 상태가 아닙니다"))?;
        source.read_frame().await
    }

    /// Reads one frame and republishes it on the preview feed.
    pub async fn pump_preview(&mut self) -> Result<LiveFrame> {
        let frame = self.read_frame().await?;
        let _ = self.preview_tx.send(frame.clone());
        Ok(frame)
    }

    pub fn preview_frames(&self) -> BoxStream<'static, LiveFrame> {
        BroadcastStream::new(self.preview_tx.subscribe())
            .filter_map(|frame| async move { frame.ok() })
            .boxed()
    }
}

/// Generate an error aligned with camera semantics.
pub fn device_error(message: impl Into<String>) -> SnapError {
    SnapError::DeviceUnavailable(message.into())
}

/// Candidate capture device node found on the host.
#[derive(Debug, Clone, Serialize)]
pub struct CameraCandidate {
    pub path: String,
}

/// Enumerates `/dev/video*` nodes. Best effort; an unreadable `/dev` simply
/// yields an empty list.
pub fn probe_cameras() -> Vec<CameraCandidate> {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return Vec::new();
    };
    let mut found: Vec<CameraCandidate> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            name.starts_with("video").then(|| CameraCandidate {
                path: format!("/dev/{name}"),
            })
        })
        .collect();
    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}

/// Synthetic device used for early integration and testing. Frames encode
/// their own coordinates so downstream geometry is checkable.
pub struct PatternDevice {
    width: u32,
    height: u32,
}

impl PatternDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[async_trait]
impl CameraDevice for PatternDevice {
    async fn open(&self, constraints: &CaptureConstraints) -> Result<Box<dyn FrameSource>> {
        info!(
            "패턴 장치 열기: facing={} ideal={}x{}",
            constraints.facing.as_constraint(),
            constraints.ideal_width,
            constraints.ideal_height
        );
        Ok(Box::new(PatternSource {
            width: self.width,
            height: self.height,
            stopped: false,
        }))
    }
}

struct PatternSource {
    width: u32,
    height: u32,
    stopped: bool,
}

#[async_trait]
impl FrameSource for PatternSource {
    async fn read_frame(&mut self) -> Result<LiveFrame> {
        if self.stopped {
            return Err(device_error("frame source already stopped"));
        }
        let mut data = Vec::with_capacity((self.width * self.height * 4) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 0, 255]);
            }
        }
        Ok(LiveFrame::from_rgba(self.width, self.height, data))
    }

    async fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[derive(Default)]
    struct StreamCounter {
        open_now: AtomicUsize,
        max_open: AtomicUsize,
        stops: AtomicUsize,
    }

    impl StreamCounter {
        fn on_open(&self) {
            let now = self.open_now.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_open.fetch_max(now, Ordering::SeqCst);
        }

        fn on_stop(&self) {
            self.open_now.fetch_sub(1, Ordering::SeqCst);
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingDevice {
        counter: Arc<StreamCounter>,
    }

    struct CountingSource {
        counter: Arc<StreamCounter>,
        stopped: bool,
    }

    #[async_trait]
    impl CameraDevice for CountingDevice {
        async fn open(&self, _constraints: &CaptureConstraints) -> Result<Box<dyn FrameSource>> {
            self.counter.on_open();
            Ok(Box::new(CountingSource {
                counter: self.counter.clone(),
                stopped: false,
            }))
        }
    }

    #[async_trait]
    impl FrameSource for CountingSource {
        async fn read_frame(&mut self) -> Result<LiveFrame> {
            if self.stopped {
                return Err(device_error("stopped"));
            }
            Ok(LiveFrame::from_rgba(2, 2, vec![0u8; 16]))
        }

        async fn stop(&mut self) {
            if !self.stopped {
                self.stopped = true;
                self.counter.on_stop();
            }
        }
    }

    struct BrokenDevice;

    #[async_trait]
    impl CameraDevice for BrokenDevice {
        async fn open(&self, _constraints: &CaptureConstraints) -> Result<Box<dyn FrameSource>> {
            Err(device_error("permission denied"))
        }
    }

    fn counting_manager() -> (CaptureSessionManager<CountingDevice>, Arc<StreamCounter>) {
        let counter = Arc::new(StreamCounter::default());
        let manager = CaptureSessionManager::new(CountingDevice {
            counter: counter.clone(),
        });
        (manager, counter)
    }

    #[tokio::test]
    async fn toggle_sequence_never_holds_two_streams() {
        let (mut manager, counter) = counting_manager();
        manager.open_session(FacingMode::Rear).await.expect("open");

        for _ in 0..5 {
            manager.toggle_facing().await.expect("toggle");
        }

        assert_eq!(counter.max_open.load(Ordering::SeqCst), 1);
        assert_eq!(manager.status(), SessionStatus::Active);
        assert_eq!(manager.facing(), FacingMode::Front);

        manager.close_session().await;
        assert_eq!(counter.open_now.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_session_twice_is_a_noop() {
        let (mut manager, counter) = counting_manager();
        manager.open_session(FacingMode::Rear).await.expect("open");

        manager.close_session().await;
        manager.close_session().await;

        assert_eq!(manager.status(), SessionStatus::Closed);
        assert_eq!(counter.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn open_failure_leaves_session_closed() {
        let mut manager = CaptureSessionManager::new(BrokenDevice);
        let result = manager.open_session(FacingMode::Front).await;

        assert!(matches!(result, Err(SnapError::DeviceUnavailable(_))));
        assert_eq!(manager.status(), SessionStatus::Closed);

        // No automatic retry happened; a manual reopen is still possible.
        let result = manager.open_session(FacingMode::Front).await;
        assert!(result.is_err());
        assert_eq!(manager.status(), SessionStatus::Closed);
    }

    #[tokio::test]
    async fn read_frame_requires_an_active_session() {
        let (mut manager, _counter) = counting_manager();
        assert!(manager.read_frame().await.is_err());

        manager.open_session(FacingMode::Rear).await.expect("open");
        assert!(manager.read_frame().await.is_ok());

        manager.close_session().await;
        assert!(manager.read_frame().await.is_err());
    }

    #[tokio::test]
    async fn preview_feed_republishes_pumped_frames() {
        let mut manager = CaptureSessionManager::new(PatternDevice::new(4, 4));
        manager.open_session(FacingMode::Rear).await.expect("open");

        let mut frames = manager.preview_frames();
        manager.pump_preview().await.expect("pump");

        let frame = frames.next().await.expect("preview frame");
        assert_eq!((frame.width, frame.height), (4, 4));
        manager.close_session().await;
    }

    #[test]
    fn pattern_frame_encodes_coordinates() {
        let mut source = PatternSource {
            width: 8,
            height: 8,
            stopped: false,
        };
        let frame = futures::executor::block_on(source.read_frame()).expect("frame");
        let offset = ((3 * frame.width + 5) * 4) as usize;
        assert_eq!(&frame.data[offset..offset + 4], &[5, 3, 0, 255]);
    }
}

use async_trait::async_trait;
use image::ImageFormat;
use moasnap_types::{
    camera::{CaptureConstraints, FacingMode},
    config::CameraConfig,
    frame::LiveFrame,
    Result,
};
use tokio::process::Command;

use crate::{device_error, CameraDevice, FrameSource};

/// V4L2 camera backend. Each frame read is a one-shot ffmpeg grab decoded
/// into RGBA; the facing mode selects the device node.
#[derive(Debug, Clone)]
pub struct FfmpegDevice {
    rear_device: String,
    front_device: String,
    input_format: String,
}

impl FfmpegDevice {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            rear_device: config.rear_device.clone(),
            front_device: config.front_device.clone(),
            input_format: config.input_format.clone(),
        }
    }

    fn device_for(&self, facing: FacingMode) -> &str {
        match facing {
            FacingMode::Rear => &self.rear_device,
            FacingMode::Front => &self.front_device,
        }
    }
}

#[async_trait]
impl CameraDevice for FfmpegDevice {
    async fn open(&self, constraints: &CaptureConstraints) -> Result<Box<dyn FrameSource>> {
        let source = FfmpegSource {
            device: self.device_for(constraints.facing).to_owned(),
            input_format: self.input_format.clone(),
            video_size: format!("{}x{}", constraints.ideal_width, constraints.ideal_height),
            square_aspect: constraints.square_aspect,
            stopped: false,
        };

        // Permission and device failures must surface at open time, not on
        // the first capture.
        source.grab_frame().await?;
        Ok(Box::new(source))
    }
}

struct FfmpegSource {
    device: String,
    input_format: String,
    video_size: String,
    square_aspect: bool,
    stopped: bool,
}

impl FfmpegSource {
    async fn grab_frame(&self) -> Result<LiveFrame> {
        let mut command = Command::new("ffmpeg");
        command.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "v4l2",
            "-input_format",
            &self.input_format,
            "-video_size",
            &self.video_size,
            "-i",
            &self.device,
        ]);
        if self.square_aspect {
            command.args(["-vf", "crop=min(iw\\,ih):min(iw\\,ih)"]);
        }
        command.args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "mjpeg", "pipe:1"]);

        let output = command.output().await.map_err(|err| {
            device_error(format!("ffmpeg 실행 실패({}): {err}", self.device))
        })?;
        if !output.status.success() {
            return Err(device_error(format!(
                "ffmpeg 프레임 캡처 실패({}): {}",
                self.device,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let img = image::load_from_memory_with_format(&output.stdout, ImageFormat::Jpeg)
            .map_err(|err| device_error(format!("프레임 디코딩 실패: {err}")))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(LiveFrame::from_rgba(width, height, rgba.into_raw()))
    }
}

#[async_trait]
impl FrameSource for FfmpegSource {
    async fn read_frame(&mut self) -> Result<LiveFrame> {
        if self.stopped {
            return Err(device_error("frame source already stopped"));
        }
        self.grab_frame().await
    }

    async fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use moasnap_types::config::CameraConfig;

    use super::*;

    fn config() -> CameraConfig {
        CameraConfig {
            rear_device: "/dev/video0".into(),
            front_device: "/dev/video2".into(),
            input_format: "mjpeg".into(),
            capture_dir: None,
        }
    }

    #[test]
    fn facing_selects_the_device_node() {
        let device = FfmpegDevice::new(&config());
        assert_eq!(device.device_for(FacingMode::Rear), "/dev/video0");
        assert_eq!(device.device_for(FacingMode::Front), "/dev/video2");
    }

    #[tokio::test]
    async fn stopped_source_refuses_reads() {
        let mut source = FfmpegSource {
            device: "/dev/video9".into(),
            input_format: "mjpeg".into(),
            video_size: "1080x1080".into(),
            square_aspect: true,
            stopped: false,
        };
        source.stop().await;
        source.stop().await;
        assert!(source.read_frame().await.is_err());
    }
}

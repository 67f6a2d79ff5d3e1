//! Square-crop/mirror rendering and snap encoding.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageBuffer, Rgba};
use moasnap_types::{
    camera::FacingMode,
    frame::{CapturedFrame, DisplayGeometry, LiveFrame},
    snap::{SnapImage, SNAP_JPEG_QUALITY},
    Result, SnapError,
};
use tracing::info;

/// Deterministically crops one live frame to the centered square visible on
/// screen and scales it by the device pixel ratio. Front-facing frames are
/// horizontally mirrored so the capture matches what the user saw.
///
/// Output depends only on the inputs; there is no hidden state.
pub fn render_square(
    frame: &LiveFrame,
    display: &DisplayGeometry,
    facing: FacingMode,
) -> Result<CapturedFrame> {
    if frame.is_empty() {
        return Err(frame_error("소스 프레임이 비어 있습니다"));
    }
    if display.width <= 0.0 || display.height <= 0.0 || display.pixel_ratio <= 0.0 {
        return Err(frame_error(format!(
            "잘못된 표시 영역: {}x{}@{}",
            display.width, display.height, display.pixel_ratio
        )));
    }

    let source =
        ImageBuffer::<Rgba<u8>, _>::from_raw(frame.width, frame.height, frame.data.as_slice())
            .ok_or_else(|| frame_error("픽셀 버퍼 크기가 프레임 크기와 다릅니다"))?;

    let crop_side = display.width.min(display.height);
    let scale_x = frame.width as f64 / display.width;
    let scale_y = frame.height as f64 / display.height;
    let origin_x = (display.width - crop_side) / 2.0 * scale_x;
    let origin_y = (display.height - crop_side) / 2.0 * scale_y;
    // The source rect is square in source-pixel space, sized by the
    // horizontal scale, exactly like the on-screen draw.
    let source_side = crop_side * scale_x;

    let out_side = (crop_side * display.pixel_ratio).round().max(1.0) as u32;
    let step = source_side / out_side as f64;

    let mut out = ImageBuffer::<Rgba<u8>, Vec<u8>>::new(out_side, out_side);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let crop_x = if facing.is_front() { out_side - 1 - x } else { x };
        let src_x = (origin_x + crop_x as f64 * step).floor() as i64;
        let src_y = (origin_y + y as f64 * step).floor() as i64;
        let src_x = src_x.clamp(0, frame.width as i64 - 1) as u32;
        let src_y = src_y.clamp(0, frame.height as i64 - 1) as u32;
        *pixel = *source.get_pixel(src_x, src_y);
    }

    Ok(CapturedFrame::new(out_side, out_side, out.into_raw()))
}

/// Serializes a raster into the snap artifact: a JPEG at quality 95 named
/// `snap.jpg`.
pub fn encode_snap(frame: &CapturedFrame) -> Result<SnapImage> {
    if frame.width() == 0 || frame.height() == 0 || frame.data().is_empty() {
        return Err(encoding_error("빈 래스터는 인코딩할 수 없습니다"));
    }

    let buffer =
        ImageBuffer::<Rgba<u8>, _>::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or_else(|| encoding_error("픽셀 버퍼 크기가 래스터 크기와 다릅니다"))?;
    // JPEG carries no alpha channel.
    let rgb = DynamicImage::ImageRgba8(buffer).to_rgb8();

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, SNAP_JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .map_err(|err| encoding_error(format!("JPEG 인코딩 실패: {err}")))?;

    Ok(SnapImage::jpeg(bytes))
}

/// Persists a rendered capture as PNG for debugging sessions.
pub fn persist_capture(frame: &CapturedFrame, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|err| encoding_error(format!("캡처 디렉터리 생성 실패({:?}): {err}", dir)))?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
    let path = dir.join(format!("snap_{}.png", timestamp));
    let buffer =
        ImageBuffer::<Rgba<u8>, _>::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or_else(|| encoding_error("이미지 버퍼 생성 실패"))?;
    buffer
        .save(&path)
        .map_err(|err| encoding_error(format!("캡처 저장 실패: {err}")))?;
    info!("저장된 스냅 캡처: {:?}", path);
    Ok(path)
}

pub fn frame_error(message: impl Into<String>) -> SnapError {
    SnapError::EmptyFrame(message.into())
}

pub fn encoding_error(message: impl Into<String>) -> SnapError {
    SnapError::Encoding(message.into())
}

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mission::MissionContext;

pub const SNAP_FILE_NAME: &str = "snap.jpg";
pub const SNAP_CONTENT_TYPE: &str = "image/jpeg";
/// Lossy quality used for the snap artifact (~0.95).
pub const SNAP_JPEG_QUALITY: u8 = 95;

const SHOOT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Encoded snap payload uploaded as a single attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SnapImage {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            file_name: SNAP_FILE_NAME.to_owned(),
            content_type: SNAP_CONTENT_TYPE.to_owned(),
            bytes,
        }
    }
}

/// Immutable upload request. A retried attempt gets a fresh request with a
/// new attempt id; the underlying capture is reused as-is.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub attempt_id: Uuid,
    pub meeting_id: u64,
    pub shoot_date: String,
    pub mission: MissionContext,
    pub image: SnapImage,
}

impl UploadRequest {
    pub fn new(
        meeting_id: u64,
        capture_time: Option<DateTime<Local>>,
        mission: MissionContext,
        image: SnapImage,
    ) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            meeting_id,
            shoot_date: format_shoot_date(capture_time.unwrap_or_else(Local::now)),
            mission,
            image,
        }
    }
}

/// Local wall-clock timestamp in the wire format `YYYY-MM-DDTHH:mm`.
pub fn format_shoot_date(moment: DateTime<Local>) -> String {
    moment.format(SHOOT_DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadErrorKind {
    NoMeeting,
    Network,
}

/// Lifecycle of one capture's upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Idle,
    Pending,
    Success,
    Error(UploadErrorKind),
}

impl UploadState {
    pub fn is_pending(self) -> bool {
        matches!(self, UploadState::Pending)
    }
}

/// History entry recorded for every finished upload attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub attempt_id: Uuid,
    pub meeting_id: u64,
    pub mission: MissionContext,
    pub outcome: UploadState,
    pub recorded_at: DateTime<Utc>,
}

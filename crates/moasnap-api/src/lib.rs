//! Snap upload and participant endpoints: wire payloads, the collaborator
//! trait, and the HTTP implementation.

use async_trait::async_trait;
use moasnap_types::{
    mission::MissionContext,
    participant::ParticipantProfile,
    snap::{SnapImage, UploadRequest},
    Result, SnapError,
};
use serde::{Deserialize, Serialize};

pub mod http;

pub use http::HttpSnapApi;

/// Metadata part of a snap upload. Exactly one of the mission id fields may
/// be present; absent fields are omitted from the wire payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapData {
    pub shoot_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_mission_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<u64>,
}

impl SnapData {
    /// Maps the mission context onto the wire fields.
    pub fn from_request(request: &UploadRequest) -> Self {
        Self {
            shoot_date: request.shoot_date.clone(),
            random_mission_id: request.mission.random_mission_id(),
            mission_id: request.mission.selected_mission_id(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSnapResponse {
    pub snap_id: Option<u64>,
    pub snap_url: Option<String>,
}

/// Upload collaborators. Exactly one of the three upload operations is
/// invoked per submit, chosen by the mission context.
#[async_trait]
pub trait SnapApi: Send + Sync {
    async fn upload_simple_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse>;

    async fn upload_random_mission_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse>;

    async fn upload_meeting_mission_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse>;

    async fn fetch_participant_me(&self, meeting_id: u64) -> Result<ParticipantProfile>;
}

#[async_trait]
impl<T: SnapApi + ?Sized> SnapApi for std::sync::Arc<T> {
    async fn upload_simple_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse> {
        self.as_ref().upload_simple_snap(meeting_id, data, image).await
    }

    async fn upload_random_mission_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse> {
        self.as_ref()
            .upload_random_mission_snap(meeting_id, data, image)
            .await
    }

    async fn upload_meeting_mission_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse> {
        self.as_ref()
            .upload_meeting_mission_snap(meeting_id, data, image)
            .await
    }

    async fn fetch_participant_me(&self, meeting_id: u64) -> Result<ParticipantProfile> {
        self.as_ref().fetch_participant_me(meeting_id).await
    }
}

pub fn network_error(message: impl Into<String>) -> SnapError {
    SnapError::Network(message.into())
}

/// Which upload operation a mission context routes to. Kept next to the
/// trait so dispatch and endpoints stay in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEndpoint {
    Simple,
    RandomMission,
    MeetingMission,
}

impl UploadEndpoint {
    pub fn for_mission(mission: MissionContext) -> Self {
        match mission {
            MissionContext::None => UploadEndpoint::Simple,
            MissionContext::Random { .. } => UploadEndpoint::RandomMission,
            MissionContext::Select { .. } => UploadEndpoint::MeetingMission,
        }
    }
}

#[cfg(test)]
mod tests {
    use moasnap_types::snap::SnapImage;

    use super::*;

    fn request(mission: MissionContext) -> UploadRequest {
        UploadRequest::new(7, None, mission, SnapImage::jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]))
    }

    #[test]
    fn random_mission_serializes_only_its_own_id() {
        let data = SnapData::from_request(&request(MissionContext::Random { mission_id: 42 }));
        let json = serde_json::to_value(&data).expect("serialize");

        assert_eq!(json["randomMissionId"], 42);
        assert!(json.get("missionId").is_none());
    }

    #[test]
    fn select_mission_serializes_only_its_own_id() {
        let data = SnapData::from_request(&request(MissionContext::Select { mission_id: 9 }));
        let json = serde_json::to_value(&data).expect("serialize");

        assert_eq!(json["missionId"], 9);
        assert!(json.get("randomMissionId").is_none());
    }

    #[test]
    fn plain_snap_serializes_no_mission_fields() {
        let data = SnapData::from_request(&request(MissionContext::None));
        let json = serde_json::to_value(&data).expect("serialize");

        assert!(json.get("missionId").is_none());
        assert!(json.get("randomMissionId").is_none());
        assert!(json["shootDate"].is_string());
    }

    #[test]
    fn mission_context_routes_to_one_endpoint() {
        assert_eq!(
            UploadEndpoint::for_mission(MissionContext::None),
            UploadEndpoint::Simple
        );
        assert_eq!(
            UploadEndpoint::for_mission(MissionContext::Random { mission_id: 1 }),
            UploadEndpoint::RandomMission
        );
        assert_eq!(
            UploadEndpoint::for_mission(MissionContext::Select { mission_id: 1 }),
            UploadEndpoint::MeetingMission
        );
    }
}

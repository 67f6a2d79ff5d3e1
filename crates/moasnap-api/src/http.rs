use async_trait::async_trait;
use moasnap_types::{
    config::ApiConfig,
    participant::ParticipantProfile,
    snap::SnapImage,
    Result,
};
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::{network_error, SnapApi, SnapData, UploadSnapResponse};

/// HTTP client for the meeting snap service.
#[derive(Clone)]
pub struct HttpSnapApi {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpSnapApi {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            auth_token: config.auth_token.clone(),
        }
    }

    fn snap_form(data: &SnapData, image: &SnapImage) -> Result<Form> {
        let payload = serde_json::to_string(data)
            .map_err(|err| network_error(format!("snapData 직렬화 실패: {err}")))?;
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|err| network_error(format!("invalid attachment mime type: {err}")))?;
        Ok(Form::new().text("snapData", payload).part("image", part))
    }

    async fn post_snap(
        &self,
        path: String,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse> {
        let url = format!("{}{path}", self.base_url);
        debug!("스냅 업로드 요청: {url}");

        let mut builder = self.client.post(&url).multipart(Self::snap_form(data, image)?);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| network_error(format!("업로드 요청 실패({url}): {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(network_error(format!(
                "업로드 실패 status={status} body={body}"
            )));
        }

        response
            .json::<UploadSnapResponse>()
            .await
            .map_err(|err| network_error(format!("업로드 응답 파싱 실패: {err}")))
    }
}

#[async_trait]
impl SnapApi for HttpSnapApi {
    async fn upload_simple_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse> {
        self.post_snap(format!("/api/v1/meetings/{meeting_id}/snaps"), data, image)
            .await
    }

    async fn upload_random_mission_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse> {
        self.post_snap(
            format!("/api/v1/meetings/{meeting_id}/snaps/random-mission"),
            data,
            image,
        )
        .await
    }

    async fn upload_meeting_mission_snap(
        &self,
        meeting_id: u64,
        data: &SnapData,
        image: &SnapImage,
    ) -> Result<UploadSnapResponse> {
        self.post_snap(
            format!("/api/v1/meetings/{meeting_id}/snaps/meeting-mission"),
            data,
            image,
        )
        .await
    }

    async fn fetch_participant_me(&self, meeting_id: u64) -> Result<ParticipantProfile> {
        let url = format!(
            "{}/api/v1/meetings/{meeting_id}/participants/me",
            self.base_url
        );

        let mut builder = self.client.get(&url);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| network_error(format!("참여자 조회 실패({url}): {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(network_error(format!("참여자 조회 실패 status={status}")));
        }

        response
            .json::<ParticipantProfile>()
            .await
            .map_err(|err| network_error(format!("참여자 응답 파싱 실패: {err}")))
    }
}

//! Upload coordination: exactly-once submission per capture, lifecycle
//! tracking, and post-upload profile reconciliation.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, Utc};
use moasnap_api::{SnapApi, SnapData, UploadEndpoint, UploadSnapResponse};
use moasnap_ops::UploadHistory;
use moasnap_types::{
    mission::MissionContext,
    participant::ParticipantProfile,
    snap::{SnapImage, UploadErrorKind, UploadRecord, UploadRequest, UploadState},
    Result, SnapError, ValidationError,
};
use tokio::sync::watch;
use tracing::{info, warn};

/// Shared user state, injected as an explicit setter. The coordinator never
/// assumes a concrete state-management mechanism.
pub trait ProfileSink: Send + Sync {
    fn apply(&self, profile: &ParticipantProfile);
}

/// Navigation seam; fired only after the reconciliation attempt resolves.
pub trait Navigator: Send + Sync {
    fn go_meeting_home(&self);
}

/// Capture-view side effects plus a liveness flag. Once the owning view is
/// torn down, reconciliation writes and navigation are suppressed; the
/// in-flight upload itself is never aborted.
#[derive(Clone)]
pub struct ViewContext {
    profile_sink: Arc<dyn ProfileSink>,
    navigator: Arc<dyn Navigator>,
    alive: watch::Receiver<bool>,
}

impl ViewContext {
    pub fn is_alive(&self) -> bool {
        *self.alive.borrow()
    }
}

/// Held by the view owner; dropping it marks the view as destroyed.
pub struct ViewGuard {
    tx: watch::Sender<bool>,
}

impl ViewGuard {
    pub fn detach(self) {}
}

impl Drop for ViewGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(false);
    }
}

pub fn bind_view(
    profile_sink: Arc<dyn ProfileSink>,
    navigator: Arc<dyn Navigator>,
) -> (ViewGuard, ViewContext) {
    let (tx, rx) = watch::channel(true);
    (
        ViewGuard { tx },
        ViewContext {
            profile_sink,
            navigator,
            alive: rx,
        },
    )
}

/// Builds and submits exactly one upload per capture and reconciles shared
/// user state afterwards.
pub struct UploadCoordinator<A: SnapApi> {
    api: A,
    state: Mutex<UploadState>,
    history: UploadHistory,
}

impl<A: SnapApi> UploadCoordinator<A> {
    pub fn new(api: A, history: UploadHistory) -> Self {
        Self {
            api,
            state: Mutex::new(UploadState::Idle),
            history,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state.lock().map(|s| *s).unwrap_or(UploadState::Idle)
    }

    /// Explicit transition back to Idle on a new capture. Pending uploads
    /// keep their state.
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            if matches!(*state, UploadState::Success | UploadState::Error(_)) {
                *state = UploadState::Idle;
            }
        }
    }

    /// Duplicate-tap guard: flips the state to Pending, or refuses when a
    /// prior submit is still in flight.
    fn begin_submit(&self) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SnapError::Ops("failed to lock upload state".into()))?;
        if state.is_pending() {
            return Err(SnapError::Validation(ValidationError::SubmitInFlight));
        }
        *state = UploadState::Pending;
        Ok(())
    }

    fn finish_submit(&self, outcome: UploadState) {
        if let Ok(mut state) = self.state.lock() {
            *state = outcome;
        }
    }

    /// Submits the encoded capture. On failure the caller's image stays
    /// usable for a resubmit without recapturing.
    pub async fn submit(
        &self,
        image: &SnapImage,
        mission: MissionContext,
        meeting_id: Option<u64>,
        capture_time: Option<DateTime<Local>>,
        view: &ViewContext,
    ) -> Result<UploadSnapResponse> {
        let meeting_id =
            meeting_id.ok_or(SnapError::Validation(ValidationError::NoMeeting))?;
        self.begin_submit()?;

        let request = UploadRequest::new(meeting_id, capture_time, mission, image.clone());
        let data = SnapData::from_request(&request);
        info!(
            attempt = %request.attempt_id,
            meeting = meeting_id,
            "스냅 업로드 시작: {}",
            request.shoot_date
        );

        let result = match UploadEndpoint::for_mission(mission) {
            UploadEndpoint::Simple => {
                self.api
                    .upload_simple_snap(meeting_id, &data, &request.image)
                    .await
            }
            UploadEndpoint::RandomMission => {
                self.api
                    .upload_random_mission_snap(meeting_id, &data, &request.image)
                    .await
            }
            UploadEndpoint::MeetingMission => {
                self.api
                    .upload_meeting_mission_snap(meeting_id, &data, &request.image)
                    .await
            }
        };

        match result {
            Ok(response) => {
                self.finish_submit(UploadState::Success);
                self.record(&request, UploadState::Success).await;
                self.reconcile(meeting_id, view).await;
                if view.is_alive() {
                    view.navigator.go_meeting_home();
                } else {
                    info!("뷰가 닫혀 내비게이션을 건너뜁니다");
                }
                Ok(response)
            }
            Err(err) => {
                let outcome = UploadState::Error(UploadErrorKind::Network);
                self.finish_submit(outcome);
                self.record(&request, outcome).await;
                warn!(attempt = %request.attempt_id, "스냅 업로드 실패: {err}");
                Err(err)
            }
        }
    }

    /// The snap is already persisted server-side at this point: a failed
    /// refresh is logged and never reverts the Success state.
    async fn reconcile(&self, meeting_id: u64, view: &ViewContext) {
        match self.api.fetch_participant_me(meeting_id).await {
            Ok(profile) => {
                if view.is_alive() {
                    view.profile_sink.apply(&profile);
                } else {
                    info!("뷰가 닫혀 프로필 반영을 건너뜁니다");
                }
            }
            Err(err) => {
                let err = SnapError::Reconciliation(err.to_string());
                warn!("참여자 정보 갱신 실패: {err}");
            }
        }
    }

    async fn record(&self, request: &UploadRequest, outcome: UploadState) {
        self.history
            .record_attempt(UploadRecord {
                attempt_id: request.attempt_id,
                meeting_id: request.meeting_id,
                mission: request.mission,
                outcome,
                recorded_at: Utc::now(),
            })
            .await;
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantRole {
    #[serde(rename = "LEADER")]
    Leader,
    #[serde(rename = "PARTICIPANT")]
    Participant,
}

/// Server-authoritative participant record applied to shared user state
/// after a snap upload persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantProfile {
    pub participant_id: u64,
    pub nickname: String,
    pub role: ParticipantRole,
    pub shoot_count: u32,
}

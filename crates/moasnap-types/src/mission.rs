use serde::{Deserialize, Serialize};

/// Prompt source attached to a snap. Exactly one mission id may be carried,
/// so the invalid both-ids-set state is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissionContext {
    None,
    Random { mission_id: u64 },
    Select { mission_id: u64 },
}

impl MissionContext {
    pub fn random_mission_id(&self) -> Option<u64> {
        match self {
            MissionContext::Random { mission_id } => Some(*mission_id),
            _ => None,
        }
    }

    pub fn selected_mission_id(&self) -> Option<u64> {
        match self {
            MissionContext::Select { mission_id } => Some(*mission_id),
            _ => None,
        }
    }
}

impl Default for MissionContext {
    fn default() -> Self {
        MissionContext::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_id_is_ever_populated() {
        let random = MissionContext::Random { mission_id: 42 };
        assert_eq!(random.random_mission_id(), Some(42));
        assert_eq!(random.selected_mission_id(), None);

        let select = MissionContext::Select { mission_id: 7 };
        assert_eq!(select.random_mission_id(), None);
        assert_eq!(select.selected_mission_id(), Some(7));

        assert_eq!(MissionContext::None.random_mission_id(), None);
        assert_eq!(MissionContext::None.selected_mission_id(), None);
    }
}

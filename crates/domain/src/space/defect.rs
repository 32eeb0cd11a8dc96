//! Defect state — the derived "has defective equipment" view of a space.

use serde::{Deserialize, Serialize};

/// Number of defective equipments assigned to a space, and the flag derived
/// from it.
///
/// The only constructor is [`DefectState::from_count`], so the flag can never
/// disagree with the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawDefectState")]
pub struct DefectState {
    count: u32,
    is_defective: bool,
}

impl DefectState {
    /// Build the state from a (possibly negative) count, clamped at zero.
    #[must_use]
    pub fn from_count(count: i64) -> Self {
        let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
        Self {
            count,
            is_defective: count > 0,
        }
    }

    #[must_use]
    pub fn count(self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn is_defective(self) -> bool {
        self.is_defective
    }
}

#[derive(Deserialize)]
struct RawDefectState {
    count: u32,
}

impl From<RawDefectState> for DefectState {
    fn from(raw: RawDefectState) -> Self {
        Self::from_count(i64::from(raw.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_not_be_defective_when_count_is_zero() {
        let state = DefectState::from_count(0);
        assert_eq!(state.count(), 0);
        assert!(!state.is_defective());
    }

    #[test]
    fn should_clamp_negative_count_to_zero() {
        let state = DefectState::from_count(-4);
        assert_eq!(state, DefectState::default());
    }

    #[test]
    fn should_keep_flag_in_sync_with_count() {
        for count in 0..50 {
            let state = DefectState::from_count(count);
            assert_eq!(state.is_defective(), state.count() > 0);
        }
    }

    #[test]
    fn should_recompute_flag_when_deserializing() {
        let state: DefectState =
            serde_json::from_str(r#"{"count": 2, "is_defective": false}"#).unwrap();
        assert!(state.is_defective());
    }
}

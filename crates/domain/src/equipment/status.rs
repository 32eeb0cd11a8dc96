//! Equipment status — the lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::error::{InvalidTransition, ValidationError};

/// Condition of a piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Good,
    NeedsRepair,
    NeedsReplacement,
    InMaintenance,
    OutOfService,
    AwaitingPart,
}

impl EquipmentStatus {
    /// Every variant, in display order.
    pub const ALL: [Self; 6] = [
        Self::Good,
        Self::NeedsRepair,
        Self::NeedsReplacement,
        Self::InMaintenance,
        Self::OutOfService,
        Self::AwaitingPart,
    ];

    /// Statuses that count towards a space's defective-equipment total.
    pub const DEFECTIVE: [Self; 4] = [
        Self::NeedsRepair,
        Self::NeedsReplacement,
        Self::InMaintenance,
        Self::AwaitingPart,
    ];

    /// Statuses reachable from `self` in one step, excluding `self`.
    #[must_use]
    pub fn reachable(self) -> &'static [Self] {
        match self {
            Self::Good => &[
                Self::NeedsRepair,
                Self::NeedsReplacement,
                Self::InMaintenance,
            ],
            Self::NeedsRepair => &[
                Self::Good,
                Self::NeedsReplacement,
                Self::InMaintenance,
                Self::AwaitingPart,
            ],
            Self::NeedsReplacement => &[Self::Good, Self::OutOfService],
            Self::InMaintenance => &[
                Self::Good,
                Self::NeedsRepair,
                Self::NeedsReplacement,
                Self::AwaitingPart,
            ],
            Self::OutOfService => &[],
            Self::AwaitingPart => &[Self::InMaintenance, Self::NeedsReplacement],
        }
    }

    /// Whether moving to `target` is allowed. Staying put always is.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self == target || self.reachable().contains(&target)
    }

    /// Validate a move to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `target` is not reachable.
    pub fn transition_to(self, target: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
            })
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.reachable().is_empty()
    }

    /// Whether equipment in this status makes its space defective.
    #[must_use]
    pub fn is_defective(self) -> bool {
        Self::DEFECTIVE.contains(&self)
    }

    /// Whether entering this status should raise an alert.
    #[must_use]
    pub fn is_critical(self) -> bool {
        matches!(self, Self::OutOfService | Self::NeedsReplacement)
    }

    /// Whether entering this status records a failure in the history.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::NeedsRepair | Self::NeedsReplacement)
    }

    /// Severity weight in `[0, 1]` used by risk scoring.
    #[must_use]
    pub fn severity(self) -> f64 {
        match self {
            Self::Good => 0.0,
            Self::AwaitingPart | Self::InMaintenance => 0.4,
            Self::NeedsRepair => 0.6,
            Self::NeedsReplacement => 0.9,
            Self::OutOfService => 1.0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::NeedsRepair => "needs_repair",
            Self::NeedsReplacement => "needs_replacement",
            Self::InMaintenance => "in_maintenance",
            Self::OutOfService => "out_of_service",
            Self::AwaitingPart => "awaiting_part",
        }
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue {
                field: "equipment status",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::EquipmentStatus::{
        AwaitingPart, Good, InMaintenance, NeedsRepair, NeedsReplacement, OutOfService,
    };
    use super::*;

    const TABLE: &[(EquipmentStatus, EquipmentStatus)] = &[
        (Good, NeedsRepair),
        (Good, NeedsReplacement),
        (Good, InMaintenance),
        (NeedsRepair, Good),
        (NeedsRepair, NeedsReplacement),
        (NeedsRepair, InMaintenance),
        (NeedsRepair, AwaitingPart),
        (NeedsReplacement, Good),
        (NeedsReplacement, OutOfService),
        (InMaintenance, Good),
        (InMaintenance, NeedsRepair),
        (InMaintenance, NeedsReplacement),
        (InMaintenance, AwaitingPart),
        (AwaitingPart, InMaintenance),
        (AwaitingPart, NeedsReplacement),
    ];

    #[test]
    fn should_accept_exactly_the_listed_transitions() {
        for from in EquipmentStatus::ALL {
            for to in EquipmentStatus::ALL {
                let listed = TABLE.contains(&(from, to));
                let result = from.transition_to(to);
                if from == to || listed {
                    assert_eq!(result, Ok(to), "{from} -> {to} should be allowed");
                } else {
                    assert_eq!(
                        result,
                        Err(InvalidTransition { from, to }),
                        "{from} -> {to} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn should_treat_out_of_service_as_terminal() {
        assert!(OutOfService.is_terminal());
        for to in EquipmentStatus::ALL {
            assert_eq!(OutOfService.can_transition_to(to), to == OutOfService);
        }
        let terminal_count = EquipmentStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .count();
        assert_eq!(terminal_count, 1);
    }

    #[test]
    fn should_not_be_symmetric() {
        assert!(Good.can_transition_to(NeedsReplacement));
        assert!(!AwaitingPart.can_transition_to(Good));
        assert!(NeedsRepair.can_transition_to(AwaitingPart));
        assert!(!AwaitingPart.can_transition_to(NeedsRepair));
    }

    #[test]
    fn should_classify_defective_statuses() {
        assert!(!Good.is_defective());
        assert!(!OutOfService.is_defective());
        for status in EquipmentStatus::DEFECTIVE {
            assert!(status.is_defective());
        }
    }

    #[test]
    fn should_flag_critical_statuses() {
        let critical: Vec<_> = EquipmentStatus::ALL
            .into_iter()
            .filter(|s| s.is_critical())
            .collect();
        assert_eq!(critical, vec![NeedsReplacement, OutOfService]);
    }

    #[test]
    fn should_order_severity_weights() {
        assert!(Good.severity() < InMaintenance.severity());
        assert!((InMaintenance.severity() - AwaitingPart.severity()).abs() < f64::EPSILON);
        assert!(AwaitingPart.severity() < NeedsRepair.severity());
        assert!(NeedsRepair.severity() < NeedsReplacement.severity());
        assert!(NeedsReplacement.severity() < OutOfService.severity());
    }

    #[test]
    fn should_serialize_as_snake_case() {
        let json = serde_json::to_string(&NeedsReplacement).unwrap();
        assert_eq!(json, "\"needs_replacement\"");
        assert_eq!("awaiting_part".parse::<EquipmentStatus>().unwrap(), AwaitingPart);
    }
}

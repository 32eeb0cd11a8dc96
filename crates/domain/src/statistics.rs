//! Statistics — snapshot DTOs, derived-ratio formulas and risk scoring.
//!
//! Everything here is pure: the application layer gathers counts through the
//! repository ports and hands them to these functions.

use serde::{Deserialize, Serialize};

use crate::building::BuildingType;
use crate::equipment::{Equipment, EquipmentCategory, EquipmentStatus, EquipmentType};
use crate::id::{BuildingId, EquipmentId, SpaceId};
use crate::space::SpaceType;
use crate::time::Timestamp;

/// Round to one decimal place, half away from zero.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / total * 100`, rounded, or `when_empty` if `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: u64, total: u64, when_empty: f64) -> f64 {
    if total == 0 {
        return when_empty;
    }
    round1(part as f64 / total as f64 * 100.0)
}

/// Share of equipment in good condition. An empty fleet is 100% good.
#[must_use]
pub fn good_condition_rate(good: u64, total_equipment: u64) -> f64 {
    percentage(good, total_equipment, 100.0)
}

/// Share of room-type spaces with an occupant.
#[must_use]
pub fn room_occupancy_rate(occupied_rooms: u64, room_spaces: u64) -> f64 {
    percentage(occupied_rooms, room_spaces, 0.0)
}

/// Share of spaces flagged defective.
#[must_use]
pub fn defective_space_rate(defective_spaces: u64, total_spaces: u64) -> f64 {
    percentage(defective_spaces, total_spaces, 0.0)
}

/// Average number of assigned equipments per space.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn equipment_per_space(assigned_equipment: u64, total_spaces: u64) -> f64 {
    if total_spaces == 0 {
        return 0.0;
    }
    round1(assigned_equipment as f64 / total_spaces as f64)
}

/// Weight of the consumed-lifespan component in [`risk_score`].
pub const AGE_WEIGHT: f64 = 0.35;
/// Weight of the failure-history component in [`risk_score`].
pub const FAILURE_WEIGHT: f64 = 0.25;
/// Weight of the current-status component in [`risk_score`].
pub const SEVERITY_WEIGHT: f64 = 0.40;

/// Risk that a piece of equipment needs attention, in `[0, 1]`.
///
/// Non-decreasing in each input. Failures saturate smoothly so that an
/// unbounded history still maps into the unit interval.
#[must_use]
pub fn risk_score(age_ratio: f64, failure_count: u32, status: EquipmentStatus) -> f64 {
    let age = if age_ratio.is_finite() {
        age_ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let failures = 1.0 - 1.0 / (1.0 + f64::from(failure_count) / 2.0);
    let score = AGE_WEIGHT * age + FAILURE_WEIGHT * failures + SEVERITY_WEIGHT * status.severity();
    score.clamp(0.0, 1.0)
}

/// Coarse bucket of a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Self::Critical
        } else if score >= 0.5 {
            Self::High
        } else if score >= 0.25 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// One bar of a histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket<K> {
    pub key: K,
    pub count: u64,
}

impl<K> Bucket<K> {
    #[must_use]
    pub fn new(key: K, count: u64) -> Self {
        Self { key, count }
    }
}

/// Count stored under `key`, zero when absent.
#[must_use]
pub fn count_of<K: PartialEq>(buckets: &[Bucket<K>], key: &K) -> u64 {
    buckets
        .iter()
        .filter(|bucket| bucket.key == *key)
        .map(|bucket| bucket.count)
        .sum()
}

/// Roll an equipment-type histogram up into categories, in first-seen order.
#[must_use]
pub fn rollup_categories(by_type: &[Bucket<EquipmentType>]) -> Vec<Bucket<EquipmentCategory>> {
    let mut out: Vec<Bucket<EquipmentCategory>> = Vec::new();
    for bucket in by_type {
        let category = bucket.key.category();
        match out.iter_mut().find(|b| b.key == category) {
            Some(existing) => existing.count += bucket.count,
            None => out.push(Bucket::new(category, bucket.count)),
        }
    }
    out
}

/// Space counts as returned by the space read-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSummary {
    pub total: u64,
    pub active: u64,
    pub rooms: u64,
    pub occupied: u64,
    pub free: u64,
    pub defective: u64,
    pub by_type: Vec<Bucket<SpaceType>>,
}

/// Equipment counts assembled from the equipment read-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSummary {
    pub total: u64,
    pub assigned: u64,
    pub good: u64,
    pub defective: u64,
    pub out_of_service: u64,
    pub by_status: Vec<Bucket<EquipmentStatus>>,
    pub by_type: Vec<Bucket<EquipmentType>>,
    pub by_category: Vec<Bucket<EquipmentCategory>>,
}

impl EquipmentSummary {
    /// Derive totals from the status and type histograms.
    #[must_use]
    pub fn from_histograms(
        by_status: Vec<Bucket<EquipmentStatus>>,
        by_type: Vec<Bucket<EquipmentType>>,
        assigned: u64,
    ) -> Self {
        let total = by_status.iter().map(|b| b.count).sum();
        let defective = by_status
            .iter()
            .filter(|b| b.key.is_defective())
            .map(|b| b.count)
            .sum();
        Self {
            total,
            assigned,
            good: count_of(&by_status, &EquipmentStatus::Good),
            defective,
            out_of_service: count_of(&by_status, &EquipmentStatus::OutOfService),
            by_category: rollup_categories(&by_type),
            by_status,
            by_type,
        }
    }
}

/// Derived ratios shared by global and per-building snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub good_condition_rate: f64,
    pub room_occupancy_rate: f64,
    pub defective_space_rate: f64,
    pub equipment_per_space: f64,
}

impl Rates {
    #[must_use]
    pub fn compute(spaces: &SpaceSummary, equipment: &EquipmentSummary) -> Self {
        Self {
            good_condition_rate: good_condition_rate(equipment.good, equipment.total),
            room_occupancy_rate: room_occupancy_rate(spaces.occupied, spaces.rooms),
            defective_space_rate: defective_space_rate(spaces.defective, spaces.total),
            equipment_per_space: equipment_per_space(equipment.assigned, spaces.total),
        }
    }
}

/// A space ranked by its number of defective equipments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectiveSpace {
    pub space_id: SpaceId,
    pub space_number: String,
    pub building_id: BuildingId,
    pub defective_count: u32,
    /// Highest equipment risk score in the space, when computed.
    pub max_risk_score: Option<f64>,
}

/// Risk evaluation of a single equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub equipment_id: EquipmentId,
    pub name: String,
    pub equipment_type: EquipmentType,
    pub status: EquipmentStatus,
    pub space_id: Option<SpaceId>,
    pub age_ratio: f64,
    pub failure_history_count: u32,
    pub score: f64,
    pub level: RiskLevel,
}

impl RiskAssessment {
    /// Score `equipment` as of `at`.
    #[must_use]
    pub fn of(equipment: &Equipment, at: Timestamp) -> Self {
        let age_ratio = equipment.age_ratio(at);
        let score = risk_score(
            age_ratio,
            equipment.failure_history_count(),
            equipment.status(),
        );
        Self {
            equipment_id: equipment.id,
            name: equipment.name.clone(),
            equipment_type: equipment.equipment_type(),
            status: equipment.status(),
            space_id: equipment.space_id(),
            age_ratio,
            failure_history_count: equipment.failure_history_count(),
            score,
            level: RiskLevel::from_score(score),
        }
    }
}

/// Building counts for the global snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingCounts {
    pub total: u64,
    pub by_type: Vec<Bucket<BuildingType>>,
}

/// Fleet-wide snapshot, optionally restricted to one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub generated_at: Timestamp,
    pub building_filter: Option<BuildingId>,
    pub buildings: BuildingCounts,
    pub active_floors: u64,
    pub spaces: SpaceSummary,
    pub equipment: EquipmentSummary,
    pub rates: Rates,
    pub most_defective_spaces: Vec<DefectiveSpace>,
}

/// Snapshot of a single building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingStats {
    pub generated_at: Timestamp,
    pub building_id: BuildingId,
    pub code: String,
    pub name: String,
    pub building_type: BuildingType,
    pub active_floors: u64,
    pub spaces: SpaceSummary,
    pub equipment: EquipmentSummary,
    pub rates: Rates,
    pub most_defective_spaces: Vec<DefectiveSpace>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn should_round_to_one_decimal() {
        assert!(approx(round1(66.666), 66.7));
        assert!(approx(round1(33.333), 33.3));
        assert!(approx(round1(12.25), 12.3));
        assert!(approx(round1(0.0), 0.0));
    }

    #[test]
    fn should_return_full_good_rate_when_fleet_is_empty() {
        assert!(approx(good_condition_rate(0, 0), 100.0));
    }

    #[test]
    fn should_compute_good_rate_from_counts() {
        assert!(approx(good_condition_rate(3, 4), 75.0));
        assert!(approx(good_condition_rate(2, 3), 66.7));
    }

    #[test]
    fn should_return_zero_rates_without_spaces() {
        assert!(approx(room_occupancy_rate(0, 0), 0.0));
        assert!(approx(defective_space_rate(0, 0), 0.0));
        assert!(approx(equipment_per_space(5, 0), 0.0));
    }

    #[test]
    fn should_average_equipment_per_space() {
        assert!(approx(equipment_per_space(10, 3), 3.3));
        assert!(approx(equipment_per_space(9, 3), 3.0));
    }

    #[test]
    fn should_keep_risk_score_in_unit_interval() {
        assert!(approx(risk_score(0.0, 0, EquipmentStatus::Good), 0.0));
        let max = risk_score(1.0, u32::MAX, EquipmentStatus::OutOfService);
        assert!(max <= 1.0 && max > 0.99);
        assert!(approx(risk_score(f64::NAN, 0, EquipmentStatus::Good), 0.0));
        assert!(approx(risk_score(-3.0, 0, EquipmentStatus::Good), 0.0));
    }

    #[test]
    fn should_grow_monotonically_with_each_input() {
        let base = risk_score(0.3, 1, EquipmentStatus::NeedsRepair);
        assert!(risk_score(0.6, 1, EquipmentStatus::NeedsRepair) > base);
        assert!(risk_score(0.3, 4, EquipmentStatus::NeedsRepair) > base);
        assert!(risk_score(0.3, 1, EquipmentStatus::NeedsReplacement) > base);

        let mut previous = -1.0;
        for failures in 0..100 {
            let score = risk_score(0.5, failures, EquipmentStatus::Good);
            assert!(score > previous);
            previous = score;
        }
    }

    #[test]
    fn should_bucket_scores_into_levels() {
        assert_eq!(RiskLevel::from_score(0.1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.25), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.75), RiskLevel::Critical);
    }

    #[test]
    fn should_derive_summary_totals_from_histograms() {
        let summary = EquipmentSummary::from_histograms(
            vec![
                Bucket::new(EquipmentStatus::Good, 3),
                Bucket::new(EquipmentStatus::NeedsRepair, 1),
                Bucket::new(EquipmentStatus::AwaitingPart, 2),
                Bucket::new(EquipmentStatus::OutOfService, 1),
            ],
            vec![
                Bucket::new(EquipmentType::Bed, 4),
                Bucket::new(EquipmentType::Desk, 2),
                Bucket::new(EquipmentType::Heater, 1),
            ],
            5,
        );
        assert_eq!(summary.total, 7);
        assert_eq!(summary.good, 3);
        assert_eq!(summary.defective, 3);
        assert_eq!(summary.out_of_service, 1);
        assert_eq!(
            summary.by_category,
            vec![
                Bucket::new(EquipmentCategory::Furniture, 6),
                Bucket::new(EquipmentCategory::Hvac, 1),
            ]
        );
    }

    #[test]
    fn should_combine_summaries_into_rates() {
        let spaces = SpaceSummary {
            total: 4,
            active: 4,
            rooms: 2,
            occupied: 1,
            free: 1,
            defective: 1,
            by_type: Vec::new(),
        };
        let equipment = EquipmentSummary {
            total: 4,
            assigned: 4,
            good: 3,
            ..EquipmentSummary::default()
        };
        let rates = Rates::compute(&spaces, &equipment);
        assert!(approx(rates.good_condition_rate, 75.0));
        assert!(approx(rates.room_occupancy_rate, 50.0));
        assert!(approx(rates.defective_space_rate, 25.0));
        assert!(approx(rates.equipment_per_space, 1.0));
    }

    #[test]
    fn should_assess_equipment_from_its_state() {
        let equipment = Equipment::builder()
            .equipment_type(EquipmentType::Refrigerator)
            .name("Fridge 3")
            .status(EquipmentStatus::NeedsReplacement)
            .failure_history_count(2)
            .build()
            .unwrap();

        let assessment = RiskAssessment::of(&equipment, crate::time::now());

        assert!(approx(assessment.age_ratio, 0.0));
        assert!(approx(assessment.score, 0.25 * 0.5 + 0.40 * 0.9));
        assert_eq!(assessment.level, RiskLevel::Moderate);
        assert_eq!(assessment.name, "Fridge 3");
    }
}

//! 투자 빈도 정책.
//!
//! 총점 구간(하한 포함)을 빈도와 금액 배수로 매핑합니다.
//!
//! | 총점 | 레벨 | 빈도 | 배수 |
//! |---|---|---|---|
//! | ≥ 80 | extreme_oversold | daily | 1.5 |
//! | 65 ~ 79 | value_zone | weekly | 1.2 |
//! | 40 ~ 64 | neutral | biweekly | 1.0 |
//! | 20 ~ 39 | overvalued | monthly | 0.8 |
//! | < 20 | bubble | monthly | 0.5 |
//!
//! 중립이 아닌 특수 조건이 있으면 해당 조건의 정책이 표 조회 결과를 대체합니다.

use dca_core::{ConditionType, FrequencyDecision, SpecialCondition};

/// 점수 구간 하한 (내림차순).
const SCORE_BANDS: [(f64, ConditionType); 4] = [
    (80.0, ConditionType::ExtremeOversold),
    (65.0, ConditionType::ValueZone),
    (40.0, ConditionType::Neutral),
    (20.0, ConditionType::Overvalued),
];

/// 투자 빈도 정책.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyPolicy;

impl FrequencyPolicy {
    pub fn new() -> Self {
        Self
    }

    /// 총점이 속한 구간 레벨.
    pub fn level_for(&self, total_score: f64) -> ConditionType {
        SCORE_BANDS
            .iter()
            .find(|(lower, _)| total_score >= *lower)
            .map(|(_, level)| *level)
            .unwrap_or(ConditionType::Bubble)
    }

    /// 빈도 결정.
    pub fn decide(
        &self,
        total_score: f64,
        condition: Option<&SpecialCondition>,
    ) -> FrequencyDecision {
        if let Some(c) = condition.filter(|c| c.condition_type != ConditionType::Neutral) {
            let (frequency, amount_factor) = c.condition_type.policy();
            return FrequencyDecision {
                frequency,
                amount_factor,
                level: c.condition_type,
                rationale: format!("{} ({})", c.condition_type.description(), c.description),
                overridden: true,
            };
        }

        let level = self.level_for(total_score);
        let (frequency, amount_factor) = level.policy();
        FrequencyDecision {
            frequency,
            amount_factor,
            level,
            rationale: format!("시장 점수 {:.1}: {}", total_score, level.description()),
            overridden: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dca_core::Frequency;

    #[test]
    fn test_band_boundaries() {
        let policy = FrequencyPolicy::new();
        let cases = [
            (80.0, ConditionType::ExtremeOversold),
            (79.0, ConditionType::ValueZone),
            (79.99, ConditionType::ValueZone),
            (65.0, ConditionType::ValueZone),
            (64.0, ConditionType::Neutral),
            (40.0, ConditionType::Neutral),
            (39.0, ConditionType::Overvalued),
            (20.0, ConditionType::Overvalued),
            (19.0, ConditionType::Bubble),
            (0.0, ConditionType::Bubble),
        ];
        for (score, expected) in cases {
            assert_eq!(policy.level_for(score), expected, "score {}", score);
        }
    }

    #[test]
    fn test_table_decision() {
        let decision = FrequencyPolicy::new().decide(85.0, None);
        assert_eq!(decision.frequency, Frequency::Daily);
        assert_eq!(decision.amount_factor, 1.5);
        assert!(!decision.overridden);

        let decision = FrequencyPolicy::new().decide(40.0, None);
        assert_eq!(decision.frequency, Frequency::Biweekly);
        assert_eq!(decision.amount_factor, 1.0);
    }

    #[test]
    fn test_condition_overrides_table() {
        let condition = SpecialCondition {
            condition_type: ConditionType::SystemicRisk,
            description: "test".to_string(),
        };
        let decision = FrequencyPolicy::new().decide(85.0, Some(&condition));
        assert_eq!(decision.frequency, Frequency::Monthly);
        assert_eq!(decision.amount_factor, 0.5);
        assert_eq!(decision.level, ConditionType::SystemicRisk);
        assert!(decision.overridden);
    }

    #[test]
    fn test_neutral_condition_does_not_override() {
        let condition = SpecialCondition {
            condition_type: ConditionType::Neutral,
            description: "flat".to_string(),
        };
        let decision = FrequencyPolicy::new().decide(70.0, Some(&condition));
        assert_eq!(decision.level, ConditionType::ValueZone);
        assert!(!decision.overridden);
    }

    #[test]
    fn test_decision_is_pure() {
        let policy = FrequencyPolicy::new();
        assert_eq!(policy.decide(55.5, None), policy.decide(55.5, None));
    }
}

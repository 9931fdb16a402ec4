//! Achievement checking logic
//!
//! Pure condition evaluation. Never fails and never touches storage.

use super::definitions::{Achievement, Comparison, Condition};

/// Equality is checked at this many decimal places (grades use one).
pub const EQUALS_PRECISION_DECIMALS: i32 = 1;

/// Round to whole units of `10^-EQUALS_PRECISION_DECIMALS`, half away from zero.
fn to_precision_units(value: f64) -> i64 {
    (value * 10f64.powi(EQUALS_PRECISION_DECIMALS)).round() as i64
}

/// Check whether `measured` satisfies `condition`.
///
/// `Equals` compares both sides after rounding to one decimal place, so
/// 10.04 and 9.95 both count as 10.0. The strict comparisons use the raw
/// value. NaN and infinities never satisfy anything.
pub fn condition_met(condition: &Condition, measured: f64) -> bool {
    if !measured.is_finite() {
        return false;
    }
    match condition.comparison {
        Comparison::Equals => {
            to_precision_units(measured) == to_precision_units(condition.value)
        }
        Comparison::GreaterThan => measured > condition.value,
        Comparison::LessThan => measured < condition.value,
    }
}

/// Check whether `measured` unlocks `achievement`
pub fn evaluate(achievement: &Achievement, measured: f64) -> bool {
    condition_met(&achievement.condition, measured)
}

/// Achievements of `candidates` that `measured` unlocks and that are not yet
/// in `unlocked`
pub fn check_achievements<'a>(
    candidates: impl Iterator<Item = &'a Achievement>,
    measured: f64,
    unlocked: &[String],
) -> Vec<&'a Achievement> {
    candidates
        .filter(|a| !unlocked.iter().any(|id| id == &a.id))
        .filter(|a| evaluate(a, measured))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::definitions::{AchievementKind, Rarity};

    fn grade_achievement(comparison: Comparison, value: f64) -> Achievement {
        Achievement {
            id: "grade".to_string(),
            title: "Grade".to_string(),
            description: String::new(),
            icon: String::new(),
            rarity: Rarity::Common,
            xp_reward: 10,
            kind: AchievementKind::Grade,
            condition: Condition {
                kind: AchievementKind::Grade,
                value,
                comparison,
            },
        }
    }

    #[test]
    fn test_equals_rounds_to_one_decimal() {
        let perfect = grade_achievement(Comparison::Equals, 10.0);
        assert!(evaluate(&perfect, 10.0));
        assert!(evaluate(&perfect, 10.04));
        assert!(evaluate(&perfect, 9.95));
        assert!(!evaluate(&perfect, 9.8));
        assert!(!evaluate(&perfect, 10.05 + 0.01));
    }

    #[test]
    fn test_equals_is_reflexive() {
        for value in [0.0, 0.1, 5.5, 7.25, 9.95, 10.0, 99.9, 100.0] {
            let a = grade_achievement(Comparison::Equals, value);
            assert!(evaluate(&a, a.condition.value), "not reflexive at {value}");
        }
    }

    #[test]
    fn test_strict_comparisons() {
        let above = grade_achievement(Comparison::GreaterThan, 9.0);
        assert!(evaluate(&above, 9.01));
        assert!(!evaluate(&above, 9.0));
        assert!(!evaluate(&above, 8.5));

        let below = grade_achievement(Comparison::LessThan, 1.0);
        assert!(evaluate(&below, 0.0));
        assert!(!evaluate(&below, 1.0));
    }

    #[test]
    fn test_evaluate_is_pure() {
        let a = grade_achievement(Comparison::GreaterThan, 7.0);
        let first = evaluate(&a, 7.5);
        for _ in 0..100 {
            assert_eq!(evaluate(&a, 7.5), first);
        }
    }

    #[test]
    fn test_non_finite_values_never_unlock() {
        let below = grade_achievement(Comparison::LessThan, 1.0);
        let above = grade_achievement(Comparison::GreaterThan, 1.0);
        assert!(!evaluate(&below, f64::NAN));
        assert!(!evaluate(&below, f64::NEG_INFINITY));
        assert!(!evaluate(&above, f64::INFINITY));
    }

    #[test]
    fn test_check_achievements_skips_unlocked() {
        let a = grade_achievement(Comparison::GreaterThan, 5.0);
        let list = [a];
        assert_eq!(check_achievements(list.iter(), 6.0, &[]).len(), 1);
        assert!(check_achievements(list.iter(), 6.0, &["grade".to_string()]).is_empty());
        assert!(check_achievements(list.iter(), 4.0, &[]).is_empty());
    }
}

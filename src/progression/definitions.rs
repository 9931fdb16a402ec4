//! Achievement definitions and the catalog
//!
//! The catalog is static data loaded once at startup: either the built-in
//! list or a TOML file with `[[achievement]]` tables.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Rarity tier shown next to an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
        }
    }
}

/// What kind of measurement an achievement looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AchievementKind {
    Grade,
    Attendance,
    Task,
    Streak,
    Special,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grade => "grade",
            Self::Attendance => "attendance",
            Self::Task => "task",
            Self::Streak => "streak",
            Self::Special => "special",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "grade" => Some(Self::Grade),
            "attendance" => Some(Self::Attendance),
            "task" => Some(Self::Task),
            "streak" => Some(Self::Streak),
            "special" => Some(Self::Special),
            _ => None,
        }
    }

    pub fn all() -> &'static [AchievementKind] {
        &[
            Self::Grade,
            Self::Attendance,
            Self::Task,
            Self::Streak,
            Self::Special,
        ]
    }
}

/// How the measured value is compared against the condition value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    Equals,
    GreaterThan,
    LessThan,
}

/// Unlock condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    pub value: f64,
    pub comparison: Comparison,
}

/// Achievement definition with all metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub rarity: Rarity,
    pub xp_reward: u64,
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    pub condition: Condition,
}

/// Catalog validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate achievement id: {0}")]
    DuplicateId(String),
    #[error("achievement {0} must award a positive amount of XP")]
    ZeroReward(String),
    #[error("achievement {0} has a condition for a different measurement type")]
    KindMismatch(String),
    #[error("achievement {0} has a non-finite condition value")]
    NonFiniteValue(String),
    #[error("achievement id must not be empty")]
    EmptyId,
}

/// Ordered list of achievement definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "achievement", default)]
    achievements: Vec<Achievement>,
}

impl Catalog {
    /// Build a catalog, validating every definition
    pub fn new(achievements: Vec<Achievement>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for a in &achievements {
            if a.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !seen.insert(a.id.as_str()) {
                return Err(CatalogError::DuplicateId(a.id.clone()));
            }
            if a.xp_reward == 0 {
                return Err(CatalogError::ZeroReward(a.id.clone()));
            }
            if a.condition.kind != a.kind {
                return Err(CatalogError::KindMismatch(a.id.clone()));
            }
            if !a.condition.value.is_finite() {
                return Err(CatalogError::NonFiniteValue(a.id.clone()));
            }
        }
        Ok(Self { achievements })
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read achievement catalog: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid achievement catalog: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: Catalog = toml::from_str(content).context("Failed to parse catalog TOML")?;
        Ok(Self::new(raw.achievements)?)
    }

    /// The catalog shipped with the crate
    pub fn builtin() -> Self {
        Self {
            achievements: builtin_achievements(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter()
    }

    pub fn of_kind(&self, kind: AchievementKind) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter().filter(move |a| a.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.achievements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.achievements.is_empty()
    }

    /// Total possible XP from all achievements
    pub fn total_xp(&self) -> u64 {
        self.achievements.iter().map(|a| a.xp_reward).sum()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[allow(clippy::too_many_arguments)]
fn def(
    id: &str,
    title: &str,
    description: &str,
    icon: &str,
    rarity: Rarity,
    xp_reward: u64,
    kind: AchievementKind,
    comparison: Comparison,
    value: f64,
) -> Achievement {
    Achievement {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        rarity,
        xp_reward,
        kind,
        condition: Condition {
            kind,
            value,
            comparison,
        },
    }
}

fn builtin_achievements() -> Vec<Achievement> {
    use AchievementKind::*;
    use Comparison::*;
    use Rarity::*;

    vec![
        // === GRADE ===
        def("grade_pass", "Aprovado", "Get a grade above 7.0", "📗", Common, 20, Grade, GreaterThan, 7.0),
        def("grade_excellent", "Excelente", "Get a grade above 9.0", "📘", Rare, 50, Grade, GreaterThan, 9.0),
        def("grade_perfect", "Nota Máxima", "Get a perfect 10", "🏆", Epic, 100, Grade, Equals, 10.0),
        // === ATTENDANCE ===
        def("attendance_regular", "Presente", "Keep attendance above 75%", "🙋", Common, 20, Attendance, GreaterThan, 75.0),
        def("attendance_exemplary", "Assíduo", "Keep attendance above 90%", "📅", Rare, 60, Attendance, GreaterThan, 90.0),
        def("attendance_full", "Sempre Presente", "Reach 100% attendance", "💯", Epic, 120, Attendance, Equals, 100.0),
        // === TASK ===
        def("task_first", "Primeira Entrega", "Complete your first task", "✅", Common, 10, Task, GreaterThan, 0.0),
        def("task_ten", "Produtivo", "Complete more than 10 tasks", "📈", Rare, 40, Task, GreaterThan, 10.0),
        def("task_fifty", "Incansável", "Complete more than 50 tasks", "🚀", Epic, 150, Task, GreaterThan, 50.0),
        // === STREAK ===
        def("streak_week", "Semana Firme", "Study 7 days in a row", "🔥", Rare, 70, Streak, GreaterThan, 6.0),
        def("streak_month", "Mês de Foco", "Study 30 days in a row", "👑", Legendary, 300, Streak, GreaterThan, 29.0),
        // === SPECIAL ===
        def("special_no_backlog", "Caixa Zero", "Finish the week with no pending tasks", "🧘", Epic, 80, Special, LessThan, 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let builtin = Catalog::builtin();
        let validated = Catalog::new(builtin.iter().cloned().collect()).unwrap();
        assert_eq!(validated.len(), builtin.len());
        assert!(builtin.total_xp() > 0);
        for kind in AchievementKind::all() {
            assert!(builtin.of_kind(*kind).count() > 0, "no {kind:?} achievements");
        }
    }

    #[test]
    fn test_catalog_rejects_duplicates_and_zero_rewards() {
        let a = def("x", "X", "", "", Rarity::Common, 10, AchievementKind::Task, Comparison::GreaterThan, 1.0);
        let err = Catalog::new(vec![a.clone(), a.clone()]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("x".to_string()));

        let mut zero = a.clone();
        zero.xp_reward = 0;
        assert_eq!(
            Catalog::new(vec![zero]).unwrap_err(),
            CatalogError::ZeroReward("x".to_string())
        );

        let mut mismatch = a;
        mismatch.condition.kind = AchievementKind::Grade;
        assert_eq!(
            Catalog::new(vec![mismatch]).unwrap_err(),
            CatalogError::KindMismatch("x".to_string())
        );
    }

    #[test]
    fn test_catalog_from_toml() {
        let toml = r#"
[[achievement]]
id = "grade_ten"
title = "Dez"
description = "Score a 10"
icon = "⭐"
rarity = "LEGENDARY"
xp_reward = 200
type = "GRADE"
condition = { type = "GRADE", value = 10.0, comparison = "EQUALS" }
"#;
        let catalog = Catalog::from_toml(toml).unwrap();
        let a = catalog.get("grade_ten").unwrap();
        assert_eq!(a.rarity, Rarity::Legendary);
        assert_eq!(a.condition.comparison, Comparison::Equals);
        assert_eq!(catalog.of_kind(AchievementKind::Grade).count(), 1);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(AchievementKind::parse("Grade"), Some(AchievementKind::Grade));
        assert_eq!(AchievementKind::parse("streak"), Some(AchievementKind::Streak));
        assert_eq!(AchievementKind::parse("unknown"), None);
    }
}

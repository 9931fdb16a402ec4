//! XP and Level system
//!
//! Fixed threshold table, level lookup, progress and XP-to-next calculations.
//! This table is the only leveling formula in the crate.

/// Level definition
///
/// A level covers `min_xp..max_xp`; `max_xp == None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub level: u32,
    pub min_xp: u64,
    pub max_xp: Option<u64>,
    pub title: &'static str,
}

impl Level {
    pub const fn new(level: u32, min_xp: u64, max_xp: Option<u64>, title: &'static str) -> Self {
        Self {
            level,
            min_xp,
            max_xp,
            title,
        }
    }

    /// Whether `xp` falls inside this level's range
    pub fn contains(&self, xp: u64) -> bool {
        xp >= self.min_xp && self.max_xp.is_none_or(|max| xp < max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_xp.is_none()
    }
}

/// All level definitions (must be contiguous and sorted by `min_xp`)
pub static LEVELS: &[Level] = &[
    Level::new(1, 0, Some(100), "Calouro"),
    Level::new(2, 100, Some(250), "Iniciante"),
    Level::new(3, 250, Some(500), "Aprendiz"),
    Level::new(4, 500, Some(1000), "Estudante"),
    Level::new(5, 1000, Some(2000), "Dedicado"),
    Level::new(6, 2000, Some(3500), "Veterano"),
    Level::new(7, 3500, Some(5500), "Especialista"),
    Level::new(8, 5500, Some(8000), "Mestre"),
    Level::new(9, 8000, Some(12000), "Sábio"),
    Level::new(10, 12000, None, "Lenda"),
];

/// Problems found by [`validate_table`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelTableError {
    #[error("level table is empty")]
    Empty,
    #[error("first level must start at 0 XP, starts at {0}")]
    NonZeroStart(u64),
    #[error("level {level} has an empty or inverted range")]
    EmptyRange { level: u32 },
    #[error("gap or overlap between level {level} and the next one")]
    NotContiguous { level: u32 },
    #[error("only the last level may be unbounded (level {level} is)")]
    UnboundedTooEarly { level: u32 },
    #[error("last level must be unbounded")]
    BoundedTail,
}

/// Check the table invariants: first entry starts at 0, entries are
/// contiguous and non-overlapping, and only the last one is unbounded.
pub fn validate_table(table: &[Level]) -> Result<(), LevelTableError> {
    let first = table.first().ok_or(LevelTableError::Empty)?;
    if first.min_xp != 0 {
        return Err(LevelTableError::NonZeroStart(first.min_xp));
    }

    for pair in table.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        let Some(max) = current.max_xp else {
            return Err(LevelTableError::UnboundedTooEarly {
                level: current.level,
            });
        };
        if max <= current.min_xp {
            return Err(LevelTableError::EmptyRange {
                level: current.level,
            });
        }
        if next.min_xp != max {
            return Err(LevelTableError::NotContiguous {
                level: current.level,
            });
        }
    }

    match table.last() {
        Some(last) if last.max_xp.is_none() => Ok(()),
        _ => Err(LevelTableError::BoundedTail),
    }
}

/// Find the level for `xp` in an arbitrary table.
///
/// Falls back to the first entry when nothing matches, which cannot happen
/// for a table accepted by [`validate_table`].
///
/// # Panics
///
/// Panics if `table` is empty.
pub fn level_in(table: &[Level], xp: u64) -> &Level {
    table
        .iter()
        .find(|l| l.contains(xp))
        .unwrap_or(&table[0])
}

/// Level for `xp` in the reference table
pub fn level_of(xp: u64) -> &'static Level {
    level_in(LEVELS, xp)
}

/// Progress through `level` as a whole percentage in `0..=100`.
pub fn progress_of(xp: u64, level: &Level) -> u8 {
    let Some(max) = level.max_xp else {
        return 100;
    };
    let span = max.saturating_sub(level.min_xp);
    if span == 0 {
        return 100;
    }
    let into = xp.saturating_sub(level.min_xp);
    // Integer floor of into * 100 / span
    let pct = (u128::from(into) * 100) / u128::from(span);
    pct.min(100) as u8
}

/// XP still needed to leave `level` (0 for the unbounded level)
pub fn xp_to_next_level(xp: u64, level: &Level) -> u64 {
    match level.max_xp {
        Some(max) => max.saturating_sub(xp),
        None => 0,
    }
}

/// Player stats derived from a stored XP total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    pub total_xp: u64,
    pub level: u32,
    pub title: String,
    /// XP at which the current level starts
    pub current_level_xp: u64,
    /// XP at which the next level starts (None if max)
    pub next_level_xp: Option<u64>,
    pub progress: u8,
    pub xp_to_next: u64,
}

impl PlayerStats {
    pub fn new(total_xp: u64) -> Self {
        let level = level_of(total_xp);
        Self {
            total_xp,
            level: level.level,
            title: level.title.to_string(),
            current_level_xp: level.min_xp,
            next_level_xp: level.max_xp,
            progress: progress_of(total_xp, level),
            xp_to_next: xp_to_next_level(total_xp, level),
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.next_level_xp.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table_is_valid() {
        assert_eq!(LEVELS.len(), 10);
        assert_eq!(validate_table(LEVELS), Ok(()));
    }

    #[test]
    fn test_level_of_boundaries() {
        assert_eq!(level_of(0).level, 1);
        assert_eq!(level_of(99).level, 1);
        assert_eq!(level_of(100).level, 2);
        assert_eq!(level_of(249).level, 2);
        assert_eq!(level_of(250).level, 3);
        assert_eq!(level_of(11_999).level, 9);
        assert_eq!(level_of(12_000).level, 10);
        assert_eq!(level_of(u64::MAX).level, 10); // Beyond every finite threshold
    }

    #[test]
    fn test_exactly_one_level_matches_and_lookup_is_monotonic() {
        let mut previous = 0;
        for xp in (0..20_000u64).chain([50_000, 1_000_000, u64::MAX]) {
            let matching = LEVELS.iter().filter(|l| l.contains(xp)).count();
            assert_eq!(matching, 1, "xp {xp} matched {matching} levels");

            let level = level_of(xp).level;
            assert!(level >= previous, "level went down at xp {xp}");
            previous = level;
        }
    }

    #[test]
    fn test_fallback_to_first_entry_when_nothing_matches() {
        // A broken table that starts above zero: nothing covers xp 0
        let broken = [
            Level::new(1, 10, Some(20), "A"),
            Level::new(2, 20, Some(30), "B"),
        ];
        assert!(validate_table(&broken).is_err());
        assert_eq!(level_in(&broken, 0).title, "A");
        assert_eq!(level_in(&broken, 99).title, "A");
    }

    #[test]
    fn test_validate_table_rejects_bad_tables() {
        assert_eq!(validate_table(&[]), Err(LevelTableError::Empty));
        assert_eq!(
            validate_table(&[Level::new(1, 0, Some(10), "A"), Level::new(2, 11, None, "B")]),
            Err(LevelTableError::NotContiguous { level: 1 })
        );
        assert_eq!(
            validate_table(&[Level::new(1, 0, None, "A"), Level::new(2, 10, None, "B")]),
            Err(LevelTableError::UnboundedTooEarly { level: 1 })
        );
        assert_eq!(
            validate_table(&[Level::new(1, 0, Some(10), "A")]),
            Err(LevelTableError::BoundedTail)
        );
    }

    #[test]
    fn test_progress_within_bounds() {
        for xp in 0..13_000u64 {
            let level = level_of(xp);
            let p = progress_of(xp, level);
            assert!(p <= 100);
        }
        assert_eq!(progress_of(0, level_of(0)), 0);
        assert_eq!(progress_of(50, level_of(50)), 50);
        assert_eq!(progress_of(99, level_of(99)), 99);
        assert_eq!(progress_of(12_000, level_of(12_000)), 100);
        assert_eq!(progress_of(9_999_999, level_of(9_999_999)), 100);
    }

    #[test]
    fn test_progress_clamps_for_stale_level() {
        let first = &LEVELS[0];
        assert_eq!(progress_of(100, first), 100);
        assert_eq!(progress_of(5_000, first), 100);
        assert_eq!(progress_of(50, &LEVELS[1]), 0);
    }

    #[test]
    fn test_xp_to_next_level() {
        for level in LEVELS.iter().filter(|l| !l.is_unbounded()) {
            let max = level.max_xp.unwrap();
            assert_eq!(xp_to_next_level(level.min_xp, level), max - level.min_xp);
            assert_eq!(xp_to_next_level(max - 1, level), 1);
        }
        assert_eq!(xp_to_next_level(50_000, &LEVELS[9]), 0);
    }

    #[test]
    fn test_transition_from_calouro_to_iniciante() {
        let table = [
            Level::new(1, 0, Some(100), "Calouro"),
            Level::new(2, 100, Some(250), "Iniciante"),
        ];
        let before = level_in(&table, 90);
        assert_eq!(before.title, "Calouro");

        let after = level_in(&table, 90 + 60);
        assert_eq!(after.title, "Iniciante");
        assert_eq!(progress_of(150, after), 33);
        assert_eq!(xp_to_next_level(150, after), 100);
    }

    #[test]
    fn test_player_stats() {
        let stats = PlayerStats::new(175);
        assert_eq!(stats.level, 2);
        assert_eq!(stats.title, "Iniciante");
        assert_eq!(stats.progress, 50);
        assert_eq!(stats.xp_to_next, 75);
        assert!(!stats.is_max_level());
        assert!(PlayerStats::new(20_000).is_max_level());
    }
}

//! Level curve and level transitions

use serde::{Deserialize, Serialize};

use crate::store::{StoreError, StoreResult};

/// XP needed to clear each level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LevelCurve {
    /// `floor(base * growth^(level - 1))`
    Exponential { base: u32, growth: f64 },
    /// `level * per_level`
    Linear { per_level: u32 },
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::Exponential {
            base: 1000,
            growth: 1.5,
        }
    }
}

impl LevelCurve {
    /// Thresholds must be positive and must not shrink from one level to the next
    pub fn validate(&self) -> StoreResult<()> {
        match *self {
            Self::Exponential { base: 0, .. } => Err(StoreError::Config(
                "level_curve.base must be at least 1".to_string(),
            )),
            Self::Exponential { growth, .. } if !(growth > 1.0 && growth.is_finite()) => {
                Err(StoreError::Config(format!(
                    "level_curve.growth must be greater than 1.0, got {growth}"
                )))
            }
            Self::Linear { per_level: 0 } => Err(StoreError::Config(
                "level_curve.per_level must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// XP that must accumulate at `level` before moving to `level + 1`
    pub fn threshold_for(&self, level: u32) -> i64 {
        let level = level.max(1);
        let threshold = match *self {
            Self::Exponential { base, growth } => {
                let exponent = i32::try_from(level - 1).unwrap_or(i32::MAX);
                // Saturates to i64::MAX once the float overflows
                (f64::from(base) * growth.powi(exponent)).floor() as i64
            }
            Self::Linear { per_level } => i64::from(level) * i64::from(per_level),
        };
        // A zero threshold would level up forever
        threshold.max(1)
    }

    /// Add `amount` XP to `(level, current_xp)` and consume every threshold
    /// it clears. Returns the new `(level, current_xp)`.
    pub fn advance(&self, level: u32, current_xp: i64, amount: i64) -> (u32, i64) {
        let mut level = level.max(1);
        let mut xp = current_xp.saturating_add(amount);
        loop {
            let threshold = self.threshold_for(level);
            if xp < threshold {
                break;
            }
            let Some(next) = level.checked_add(1) else {
                break;
            };
            xp -= threshold;
            level = next;
        }
        (level, xp)
    }
}

/// Outcome of an XP grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub user_id: i64,
    pub previous_level: u32,
    pub level: u32,
    pub current_xp: i64,
    pub total_xp: i64,
    pub leveled_up: bool,
    /// Threshold of the current level
    pub xp_for_next: i64,
}

impl LevelInfo {
    /// Fraction of the way to the next level (0.0 - 1.0)
    pub fn progress_to_next(&self) -> f32 {
        if self.xp_for_next <= 0 {
            return 1.0;
        }
        (self.current_xp as f32 / self.xp_for_next as f32).clamp(0.0, 1.0)
    }

    /// XP still missing for the next level
    pub fn xp_remaining(&self) -> i64 {
        (self.xp_for_next - self.current_xp).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_thresholds() {
        let curve = LevelCurve::default();
        assert_eq!(curve.threshold_for(1), 1000);
        assert_eq!(curve.threshold_for(2), 1500);
        assert_eq!(curve.threshold_for(3), 2250);
        assert_eq!(curve.threshold_for(4), 3375);
    }

    #[test]
    fn test_linear_thresholds() {
        let curve = LevelCurve::Linear { per_level: 1000 };
        assert_eq!(curve.threshold_for(1), 1000);
        assert_eq!(curve.threshold_for(5), 5000);
    }

    #[test]
    fn test_advance_crosses_one_level() {
        let curve = LevelCurve::default();
        assert_eq!(curve.advance(1, 950, 100), (2, 50));
        assert_eq!(curve.advance(1, 0, 999), (1, 999));
    }

    #[test]
    fn test_advance_crosses_several_levels() {
        let curve = LevelCurve::default();
        // 1000 + 1500 clears levels 1 and 2
        assert_eq!(curve.advance(1, 0, 2500), (3, 0));
        let (level, xp) = curve.advance(1, 0, 10_000);
        assert!(xp < curve.threshold_for(level));
    }

    #[test]
    fn test_degenerate_curves_are_rejected() {
        let bad = [
            LevelCurve::Exponential { base: 0, growth: 1.5 },
            LevelCurve::Exponential { base: 1000, growth: 1.0 },
            LevelCurve::Exponential { base: 1000, growth: 0.5 },
            LevelCurve::Exponential { base: 1000, growth: f64::NAN },
            LevelCurve::Linear { per_level: 0 },
        ];
        for curve in bad {
            assert!(
                matches!(curve.validate(), Err(StoreError::Config(_))),
                "{curve:?} should be rejected"
            );
        }
        assert!(LevelCurve::default().validate().is_ok());
        assert!(LevelCurve::Linear { per_level: 1000 }.validate().is_ok());
    }

    #[test]
    fn test_advance_stops_at_max_level() {
        let curve = LevelCurve::Linear { per_level: 1 };
        let (level, xp) = curve.advance(u32::MAX - 5, 0, i64::MAX);
        assert_eq!(level, u32::MAX);
        assert!(xp > 0);
    }

    #[test]
    fn test_progress_to_next() {
        let info = LevelInfo {
            user_id: 1,
            previous_level: 2,
            level: 2,
            current_xp: 375,
            total_xp: 1375,
            leveled_up: false,
            xp_for_next: 1500,
        };
        assert!((info.progress_to_next() - 0.25).abs() < 0.001);
        assert_eq!(info.xp_remaining(), 1125);
    }
}

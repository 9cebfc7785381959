//! Skill-check resolver - attribute-vs-difficulty checks on a d20

use rand::Rng;

/// Outcome of one skill check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillCheckResult {
    pub roll: i32,
    pub modifier: i32,
    pub total: i32,
    pub success: bool,
}

/// Modifier derived from an attribute value: `floor((value - 10) / 2)`.
/// Floor division, so a value of 9 gives -1, not 0.
pub fn attribute_modifier(attribute_value: i64) -> i32 {
    ((attribute_value - 10).div_euclid(2)) as i32
}

/// Evaluate a check for a known roll. Success is `total >= difficulty`.
pub fn resolve(attribute_value: i64, difficulty: i32, roll: i32) -> SkillCheckResult {
    let modifier = attribute_modifier(attribute_value);
    let total = roll + modifier;
    SkillCheckResult {
        roll,
        modifier,
        total,
        success: total >= difficulty,
    }
}

/// Uniform d20 roll from the injected RNG
pub fn roll_d20<R: Rng>(rng: &mut R) -> i32 {
    rng.gen_range(1..=20)
}

/// Roll and evaluate in one step
pub fn check<R: Rng>(attribute_value: i64, difficulty: i32, rng: &mut R) -> SkillCheckResult {
    resolve(attribute_value, difficulty, roll_d20(rng))
}

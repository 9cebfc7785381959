//! Cultivation ladder configuration - realms, stages and destiny paths
//!
//! The ladder is ordinary data so mods can replace it wholesale; the engine
//! only assumes the ordering invariants checked by [`RealmConfig::validate`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Additive attribute bonuses granted by a stage, a destiny path or a piece
/// of equipment. Keyed by attribute name; capped attributes have the same
/// delta applied to their maximum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBonuses(pub BTreeMap<String, i64>);

impl StageBonuses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: impl Into<String>, delta: i64) -> Self {
        self.0.insert(attribute.into(), delta);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &i64)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One stage within a realm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmStage {
    pub id: String,
    pub name: String,
    /// Spiritual qi needed to break through out of this stage
    pub qi_required: u64,
    /// Bonuses applied on entering this stage
    pub bonuses: StageBonuses,
}

/// One realm - an ordered list of stages plus realm-level flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Realm {
    pub id: String,
    pub name: String,
    /// Entering this realm is gated by a heavenly tribulation. The engine
    /// only signals this to the caller; it never resolves the tribulation.
    #[serde(default)]
    pub has_tribulation: bool,
    pub stages: Vec<RealmStage>,
}

/// The full ordered ladder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmConfig {
    pub realms: Vec<Realm>,
}

impl RealmConfig {
    pub fn realm(&self, index: usize) -> Option<&Realm> {
        self.realms.get(index)
    }

    pub fn stage(&self, realm_index: usize, stage_index: usize) -> Option<&RealmStage> {
        self.realms.get(realm_index)?.stages.get(stage_index)
    }

    /// Check the ordering invariants: every realm has at least one stage and
    /// `qi_required` is non-decreasing within each realm.
    pub fn validate(&self) -> Result<(), String> {
        if self.realms.is_empty() {
            return Err("realm config has no realms".to_string());
        }
        for realm in &self.realms {
            if realm.stages.is_empty() {
                return Err(format!("realm '{}' has no stages", realm.id));
            }
            for pair in realm.stages.windows(2) {
                if pair[1].qi_required < pair[0].qi_required {
                    return Err(format!(
                        "realm '{}': qi requirement decreases from stage '{}' to '{}'",
                        realm.id, pair[0].id, pair[1].id
                    ));
                }
            }
        }
        Ok(())
    }

    /// The built-in ladder used when no mod supplies one
    pub fn standard() -> Self {
        fn stage(id: &str, name: &str, qi: u64, bonuses: StageBonuses) -> RealmStage {
            RealmStage {
                id: id.to_string(),
                name: name.to_string(),
                qi_required: qi,
                bonuses,
            }
        }

        Self {
            realms: vec![
                Realm {
                    id: "luyen-khi".to_string(),
                    name: "Luyện Khí".to_string(),
                    has_tribulation: false,
                    stages: vec![
                        stage(
                            "luyen-khi-so-ky",
                            "Luyện Khí Sơ Kỳ",
                            100,
                            StageBonuses::new().with("Thể Chất", 2).with("Linh Lực", 5),
                        ),
                        stage(
                            "luyen-khi-trung-ky",
                            "Luyện Khí Trung Kỳ",
                            250,
                            StageBonuses::new().with("Thể Chất", 3).with("Linh Lực", 8),
                        ),
                        stage(
                            "luyen-khi-hau-ky",
                            "Luyện Khí Hậu Kỳ",
                            500,
                            StageBonuses::new().with("Thể Chất", 5).with("Linh Lực", 12),
                        ),
                    ],
                },
                Realm {
                    id: "truc-co".to_string(),
                    name: "Trúc Cơ".to_string(),
                    has_tribulation: false,
                    stages: vec![
                        stage(
                            "truc-co-so-ky",
                            "Trúc Cơ Sơ Kỳ",
                            1200,
                            StageBonuses::new()
                                .with("Thể Chất", 10)
                                .with("Linh Lực", 25)
                                .with("Thọ Nguyên", 20),
                        ),
                        stage(
                            "truc-co-vien-man",
                            "Trúc Cơ Viên Mãn",
                            3000,
                            StageBonuses::new().with("Thể Chất", 15).with("Linh Lực", 40),
                        ),
                    ],
                },
                Realm {
                    id: "kim-dan".to_string(),
                    name: "Kim Đan".to_string(),
                    has_tribulation: true,
                    stages: vec![stage(
                        "kim-dan-so-ky",
                        "Kim Đan Sơ Kỳ",
                        8000,
                        StageBonuses::new()
                            .with("Thể Chất", 30)
                            .with("Linh Lực", 100)
                            .with("Thọ Nguyên", 100),
                    )],
                },
            ],
        }
    }
}

/// An optional, realm-gated permanent bonus track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinyPath {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Realm id that unlocks this path
    pub required_realm: String,
    pub bonuses: StageBonuses,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ladder_is_valid() {
        assert!(RealmConfig::standard().validate().is_ok());
    }

    #[test]
    fn decreasing_qi_within_a_realm_is_rejected() {
        let mut config = RealmConfig::standard();
        config.realms[0].stages[2].qi_required = 10;
        let err = config.validate().unwrap_err();
        assert!(err.contains("luyen-khi"));
    }

    #[test]
    fn empty_realm_is_rejected() {
        let mut config = RealmConfig::standard();
        config.realms[1].stages.clear();
        assert!(config.validate().is_err());
    }
}

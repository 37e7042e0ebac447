use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatPhase {
    Proceed,
    FightCondition,
    SpotEnemy,
    Formation,
    MissileAnim,
    FightPeriod,
    NightPrompt,
    Result,
    GetShip,
    FlagshipSevere,
    MapPage,
    BattlePage,
    ExercisePage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatMode {
    Normal,
    Battle,
    Exercise,
}

impl CombatMode {
    /// The phase that ends a fight in this mode.
    pub fn terminal_phase(self) -> CombatPhase {
        match self {
            CombatMode::Normal => CombatPhase::MapPage,
            CombatMode::Battle => CombatPhase::BattlePage,
            CombatMode::Exercise => CombatPhase::ExercisePage,
        }
    }
}

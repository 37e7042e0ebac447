use std::collections::HashMap;

use thiserror::Error;

use crate::phase::{CombatMode, CombatPhase};

/// A successor phase plus an optional per-edge timeout override (seconds),
/// overriding the phase's own default in the recognizer's phase table.
pub type PhaseTarget = (CombatPhase, Option<f64>);

/// Successors of a phase: either unconditional, or keyed by the previous
/// step's `last_action` label. The conditional form is an ordered list
/// (not a `HashMap`) specifically to preserve insertion order for
/// `resolve_successors`'s fallback-to-first-branch behavior.
#[derive(Debug, Clone)]
pub enum PhaseBranch {
    Unconditional(Vec<PhaseTarget>),
    Conditional(Vec<(String, Vec<PhaseTarget>)>),
}

pub type TransitionTable = HashMap<CombatPhase, PhaseBranch>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no transitions registered for phase {0:?}")]
pub struct UnknownPhaseError(pub CombatPhase);

/// Resolves the successors of `(phase, last_action)`. Unknown phases raise;
/// an unrecognized `last_action` within a known conditional branch falls
/// back to the *first* branch value in insertion order rather than raising
/// — this exact fallback, grounded in the source project's
/// `resolve_successors`, must not be "fixed" into an error: it is load-bearing
/// behavior relied on by the engine when upstream state is ambiguous.
pub fn resolve_successors(
    table: &TransitionTable,
    phase: CombatPhase,
    last_action: &str,
) -> Result<Vec<PhaseTarget>, UnknownPhaseError> {
    let branch = table.get(&phase).ok_or(UnknownPhaseError(phase))?;
    Ok(match branch {
        PhaseBranch::Unconditional(targets) => targets.clone(),
        PhaseBranch::Conditional(pairs) => pairs
            .iter()
            .find(|(action, _)| action == last_action)
            .map(|(_, targets)| targets.clone())
            .unwrap_or_else(|| {
                pairs
                    .first()
                    .map(|(_, targets)| targets.clone())
                    .expect("conditional branches are never empty")
            }),
    })
}

fn t(phase: CombatPhase) -> PhaseTarget {
    (phase, None)
}

fn tt(phase: CombatPhase, timeout: f64) -> PhaseTarget {
    (phase, Some(timeout))
}

pub fn normal_fight_transitions() -> TransitionTable {
    use CombatPhase::*;
    let mut table = HashMap::new();
    table.insert(
        Proceed,
        PhaseBranch::Conditional(vec![
            (
                "yes".to_string(),
                vec![t(FightCondition), t(SpotEnemy), t(Formation), t(FightPeriod), t(MapPage)],
            ),
            ("no".to_string(), vec![t(MapPage)]),
        ]),
    );
    table.insert(
        FightCondition,
        PhaseBranch::Unconditional(vec![t(SpotEnemy), t(Formation), t(FightPeriod)]),
    );
    table.insert(
        SpotEnemy,
        PhaseBranch::Conditional(vec![
            (
                "detour".to_string(),
                vec![t(FightCondition), t(SpotEnemy), t(Formation), t(FightPeriod)],
            ),
            ("retreat".to_string(), vec![t(MapPage)]),
            (
                "fight".to_string(),
                vec![t(Formation), t(FightPeriod), t(MissileAnim)],
            ),
        ]),
    );
    table.insert(
        Formation,
        PhaseBranch::Unconditional(vec![t(FightPeriod), t(MissileAnim)]),
    );
    table.insert(
        MissileAnim,
        PhaseBranch::Unconditional(vec![t(FightPeriod), t(Result)]),
    );
    table.insert(FightPeriod, PhaseBranch::Unconditional(vec![t(NightPrompt)]));
    table.insert(
        NightPrompt,
        PhaseBranch::Conditional(vec![
            ("yes".to_string(), vec![t(Result)]),
            ("no".to_string(), vec![tt(Result, 10.0)]),
        ]),
    );
    table.insert(
        Result,
        PhaseBranch::Unconditional(vec![t(Proceed), t(MapPage), t(GetShip), t(FlagshipSevere)]),
    );
    table.insert(
        GetShip,
        PhaseBranch::Unconditional(vec![t(Proceed), t(MapPage), t(FlagshipSevere)]),
    );
    table.insert(FlagshipSevere, PhaseBranch::Unconditional(vec![t(MapPage)]));
    table
}

pub fn battle_transitions() -> TransitionTable {
    use CombatPhase::*;
    let mut table = HashMap::new();
    table.insert(
        Proceed,
        PhaseBranch::Unconditional(vec![t(SpotEnemy), t(Formation), t(FightPeriod)]),
    );
    table.insert(
        SpotEnemy,
        PhaseBranch::Conditional(vec![
            ("retreat".to_string(), vec![t(BattlePage)]),
            ("fight".to_string(), vec![t(Formation), t(FightPeriod)]),
        ]),
    );
    table.insert(Formation, PhaseBranch::Unconditional(vec![t(FightPeriod)]));
    table.insert(
        FightPeriod,
        PhaseBranch::Unconditional(vec![t(NightPrompt), t(Result)]),
    );
    table.insert(
        NightPrompt,
        PhaseBranch::Conditional(vec![
            ("yes".to_string(), vec![t(Result)]),
            ("no".to_string(), vec![tt(Result, 7.0)]),
        ]),
    );
    table.insert(Result, PhaseBranch::Unconditional(vec![t(BattlePage)]));
    table
}

pub fn exercise_transitions() -> TransitionTable {
    use CombatPhase::*;
    let mut table = battle_transitions();
    // Exercise mode has no detour/retreat branch at SpotEnemy: unconditional.
    table.insert(SpotEnemy, PhaseBranch::Unconditional(vec![t(Formation), t(FightPeriod)]));
    table.insert(Result, PhaseBranch::Unconditional(vec![t(ExercisePage)]));
    table
}

pub fn transitions_for_mode(mode: CombatMode) -> TransitionTable {
    match mode {
        CombatMode::Normal => normal_fight_transitions(),
        CombatMode::Battle => battle_transitions(),
        CombatMode::Exercise => exercise_transitions(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CombatPhase::*;

    #[test]
    fn unknown_phase_raises() {
        let table = normal_fight_transitions();
        let err = resolve_successors(&table, BattlePage, "yes").unwrap_err();
        assert_eq!(err, UnknownPhaseError(BattlePage));
    }

    #[test]
    fn unrecognized_action_falls_back_to_first_branch() {
        let table = normal_fight_transitions();
        let result = resolve_successors(&table, Proceed, "unrecognized").unwrap();
        // first inserted branch for Proceed is "yes"
        assert_eq!(
            result,
            vec![
                (FightCondition, None),
                (SpotEnemy, None),
                (Formation, None),
                (FightPeriod, None),
                (MapPage, None),
            ]
        );
    }

    #[test]
    fn night_prompt_no_branch_has_timeout_override() {
        let table = normal_fight_transitions();
        let result = resolve_successors(&table, NightPrompt, "no").unwrap();
        assert_eq!(result, vec![(Result, Some(10.0))]);
    }

    #[test]
    fn exercise_spot_enemy_is_unconditional() {
        let table = exercise_transitions();
        let result = resolve_successors(&table, SpotEnemy, "anything").unwrap();
        assert_eq!(result, vec![(Formation, None), (FightPeriod, None)]);
    }
}

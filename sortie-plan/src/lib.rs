pub mod error;
pub mod phase;
pub mod plan;
pub mod rules;
pub mod transitions;

pub use error::RuleParseError;
pub use phase::{CombatMode, CombatPhase};
pub use plan::{CombatPlan, NodeDecision, PlanLoadError};
pub use rules::{
    evaluate_formation_rules, parse_action, parse_conjunction, parse_enemy_rule, Action,
    ComparisonOp, Condition, FormationRule, Rule, RuleEngine, SHIP_TYPE_TOKENS,
};
pub use transitions::{
    battle_transitions, exercise_transitions, normal_fight_transitions, resolve_successors,
    transitions_for_mode, PhaseBranch, PhaseTarget, TransitionTable, UnknownPhaseError,
};

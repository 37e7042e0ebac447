use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase::{CombatMode, CombatPhase};
use crate::rules::{
    parse_action, parse_conjunction, Action, Condition, FormationRule, Rule, RuleEngine,
};
use crate::transitions::{transitions_for_mode, TransitionTable};
use crate::RuleParseError;

/// Per-slot blood-repair threshold or uniform scalar, expanded to 6 slots.
fn expand_six(values: &ScalarOrVec6) -> [i32; 6] {
    match values {
        ScalarOrVec6::Scalar(v) => [*v; 6],
        ScalarOrVec6::Vec(v) => {
            let mut out = [0i32; 6];
            for (slot, value) in out.iter_mut().zip(v.iter()) {
                *slot = *value;
            }
            out
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ScalarOrVec6 {
    Scalar(i32),
    Vec(Vec<i32>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RuleItemSchema {
    Pair(String, String),
    Legacy(String),
}

impl RuleItemSchema {
    fn split(&self) -> Result<(String, String), RuleParseError> {
        match self {
            RuleItemSchema::Pair(cond, action) => Ok((cond.clone(), action.clone())),
            RuleItemSchema::Legacy(s) => {
                let (cond, action) = s
                    .split_once("=>")
                    .ok_or_else(|| RuleParseError::MalformedGroup(s.clone()))?;
                Ok((cond.trim().to_string(), action.trim().to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NodeDecisionSchema {
    formation: Option<u8>,
    night: Option<bool>,
    proceed: Option<bool>,
    proceed_stop: Option<ScalarOrVec6>,
    enemy_rules: Option<Vec<RuleItemSchema>>,
    enemy_formation_rules: Option<Vec<RuleItemSchema>>,
    detour: Option<bool>,
    long_missile_support: Option<bool>,
    #[serde(rename = "SL_when_spot_enemy_fails")]
    sl_when_spot_enemy_fails: Option<bool>,
    #[serde(rename = "SL_when_detour_fails")]
    sl_when_detour_fails: Option<bool>,
    #[serde(rename = "SL_when_enter_fight")]
    sl_when_enter_fight: Option<bool>,
    formation_when_spot_enemy_fails: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
struct CombatPlanSchema {
    name: String,
    mode: String,
    chapter: serde_yaml::Value,
    map: serde_yaml::Value,
    fleet_id: u32,
    fleet: Option<Vec<String>>,
    repair_mode: Option<ScalarOrVec6>,
    fight_condition: Option<i32>,
    #[serde(default)]
    selected_nodes: Vec<String>,
    node_defaults: Option<NodeDecisionSchema>,
    #[serde(default)]
    node_args: HashMap<String, NodeDecisionSchema>,
}

/// Per-node combat configuration. `enemy_rules` is evaluated against the
/// detected ship-type composition; `formation_rules` is evaluated first,
/// against the detected enemy formation name, and takes precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDecision {
    pub formation: u8,
    pub night: bool,
    pub proceed: bool,
    pub proceed_stop: [i32; 6],
    pub enemy_rules: Option<RuleEngine>,
    pub formation_rules: Option<Vec<FormationRule>>,
    pub detour: bool,
    pub long_missile_support: bool,
    pub sl_when_spot_enemy_fails: bool,
    pub sl_when_detour_fails: bool,
    pub sl_when_enter_fight: bool,
    pub formation_when_spot_enemy_fails: Option<u8>,
}

impl Default for NodeDecision {
    fn default() -> Self {
        NodeDecision {
            formation: 2, // double_column
            night: false,
            proceed: true,
            proceed_stop: [2; 6], // severe_damage
            enemy_rules: None,
            formation_rules: None,
            detour: false,
            long_missile_support: false,
            sl_when_spot_enemy_fails: false,
            sl_when_detour_fails: true,
            sl_when_enter_fight: false,
            formation_when_spot_enemy_fails: None,
        }
    }
}

fn build_rule_engine(items: &[RuleItemSchema]) -> Result<RuleEngine, RuleParseError> {
    let mut rules = Vec::with_capacity(items.len());
    for item in items {
        let (condition_str, action_token) = item.split()?;
        let conditions: Vec<Condition> = parse_conjunction(&condition_str)?;
        let action: Action = parse_action(&action_token)?;
        rules.push(Rule { conditions, action });
    }
    Ok(RuleEngine::new(rules))
}

fn build_formation_rules(items: &[RuleItemSchema]) -> Result<Vec<FormationRule>, RuleParseError> {
    items
        .iter()
        .map(|item| {
            let (name, action_token) = item.split()?;
            Ok(FormationRule {
                formation_name: name,
                action: parse_action(&action_token)?,
            })
        })
        .collect()
}

fn resolve_node(
    schema: &NodeDecisionSchema,
    base: &NodeDecision,
) -> Result<NodeDecision, RuleParseError> {
    Ok(NodeDecision {
        formation: schema.formation.unwrap_or(base.formation),
        night: schema.night.unwrap_or(base.night),
        proceed: schema.proceed.unwrap_or(base.proceed),
        proceed_stop: schema
            .proceed_stop
            .as_ref()
            .map(expand_six)
            .unwrap_or(base.proceed_stop),
        enemy_rules: match &schema.enemy_rules {
            Some(items) => Some(build_rule_engine(items)?),
            None => base.enemy_rules.clone(),
        },
        formation_rules: match &schema.enemy_formation_rules {
            Some(items) => Some(build_formation_rules(items)?),
            None => base.formation_rules.clone(),
        },
        detour: schema.detour.unwrap_or(base.detour),
        long_missile_support: schema.long_missile_support.unwrap_or(base.long_missile_support),
        sl_when_spot_enemy_fails: schema
            .sl_when_spot_enemy_fails
            .unwrap_or(base.sl_when_spot_enemy_fails),
        sl_when_detour_fails: schema.sl_when_detour_fails.unwrap_or(base.sl_when_detour_fails),
        sl_when_enter_fight: schema.sl_when_enter_fight.unwrap_or(base.sl_when_enter_fight),
        formation_when_spot_enemy_fails: schema
            .formation_when_spot_enemy_fails
            .or(base.formation_when_spot_enemy_fails),
    })
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => format!("{other:?}"),
    }
}

#[derive(Debug, Error)]
pub enum PlanLoadError {
    #[error("failed to parse plan yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown combat mode: {0:?}")]
    UnknownMode(String),
    #[error(transparent)]
    Rule(#[from] RuleParseError),
}

/// A loaded, fully-resolved combat plan: every selected node has a
/// concrete `NodeDecision`, merged from `node_defaults` down to per-node
/// overrides at load time.
#[derive(Debug, Clone)]
pub struct CombatPlan {
    pub name: String,
    pub mode: CombatMode,
    pub chapter: String,
    pub map_id: String,
    pub fleet_id: u32,
    pub fleet: Option<Vec<String>>,
    pub repair_mode: [i32; 6],
    pub fight_condition: i32,
    pub selected_nodes: Vec<String>,
    pub nodes: HashMap<String, NodeDecision>,
    pub default_node: NodeDecision,
}

impl CombatPlan {
    pub fn transitions(&self) -> TransitionTable {
        transitions_for_mode(self.mode)
    }

    pub fn end_phase(&self) -> CombatPhase {
        self.mode.terminal_phase()
    }

    pub fn get_node_decision(&self, node: &str) -> &NodeDecision {
        self.nodes.get(node).unwrap_or(&self.default_node)
    }

    /// Empty whitelist means every node is implicitly selected.
    pub fn is_selected_node(&self, node: &str) -> bool {
        self.selected_nodes.is_empty() || self.selected_nodes.iter().any(|n| n == node)
    }

    pub fn from_yaml(source: &str) -> Result<Self, PlanLoadError> {
        let schema: CombatPlanSchema = serde_yaml::from_str(source)?;

        let mode = match schema.mode.to_ascii_lowercase().as_str() {
            "normal" => CombatMode::Normal,
            "battle" => CombatMode::Battle,
            "exercise" => CombatMode::Exercise,
            other => return Err(PlanLoadError::UnknownMode(other.to_string())),
        };

        let default_base = NodeDecision::default();
        let default_node = match &schema.node_defaults {
            Some(defaults_schema) => resolve_node(defaults_schema, &default_base)?,
            None => default_base.clone(),
        };

        let mut nodes = HashMap::new();
        for (name, node_schema) in &schema.node_args {
            nodes.insert(name.clone(), resolve_node(node_schema, &default_node)?);
        }
        // any selected node missing from node_args falls back to a copy of node_defaults
        for selected in &schema.selected_nodes {
            nodes.entry(selected.clone()).or_insert_with(|| default_node.clone());
        }

        Ok(CombatPlan {
            name: schema.name,
            mode,
            chapter: yaml_value_to_string(&schema.chapter),
            map_id: yaml_value_to_string(&schema.map),
            fleet_id: schema.fleet_id,
            fleet: schema.fleet,
            repair_mode: schema
                .repair_mode
                .as_ref()
                .map(expand_six)
                .unwrap_or([2; 6]),
            fight_condition: schema.fight_condition.unwrap_or(0),
            selected_nodes: schema.selected_nodes,
            nodes,
            default_node,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN_YAML: &str = r#"
name: "1-1 farming"
mode: normal
chapter: 1
map: 1
fleet_id: 1
selected_nodes: ["A"]
node_defaults:
  formation: 2
  proceed: true
node_args:
  A:
    formation: 4
    night: true
    enemy_rules:
      - ["(BB >= 2) and (CV > 0)", "retreat"]
"#;

    #[test]
    fn loads_and_merges_node_defaults() {
        let plan = CombatPlan::from_yaml(PLAN_YAML).unwrap();
        assert_eq!(plan.mode, CombatMode::Normal);
        let node_a = plan.get_node_decision("A");
        assert_eq!(node_a.formation, 4);
        assert!(node_a.night);
        assert!(node_a.enemy_rules.is_some());
    }

    #[test]
    fn selected_node_missing_from_node_args_gets_default_copy() {
        let yaml = r#"
name: "p"
mode: normal
chapter: 1
map: 1
fleet_id: 1
selected_nodes: ["A", "B"]
node_defaults:
  formation: 3
node_args:
  A:
    formation: 5
"#;
        let plan = CombatPlan::from_yaml(yaml).unwrap();
        assert_eq!(plan.get_node_decision("A").formation, 5);
        assert_eq!(plan.get_node_decision("B").formation, 3);
    }

    #[test]
    fn empty_selected_nodes_allows_everything() {
        let plan = CombatPlan::from_yaml(PLAN_YAML).unwrap();
        assert!(plan.is_selected_node("A"));
        let mut plan = plan;
        plan.selected_nodes.clear();
        assert!(plan.is_selected_node("Z"));
    }
}

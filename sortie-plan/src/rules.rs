use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RuleParseError;

/// Ship-type tokens recognized in enemy-composition conditions, plus the
/// synthetic aggregate `ALL`.
pub const SHIP_TYPE_TOKENS: &[&str] = &[
    "CV", "CVL", "AV", "BB", "BBV", "BC", "CA", "CAV", "CLT", "CL", "BM", "DD", "SSG", "SS", "SC",
    "NAP", "ASDG", "AADG", "KP", "CG", "CBG", "BG", "ALL",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl ComparisonOp {
    fn parse(token: &str) -> Result<Self, RuleParseError> {
        match token {
            ">" => Ok(ComparisonOp::Gt),
            ">=" => Ok(ComparisonOp::Ge),
            "<" => Ok(ComparisonOp::Lt),
            "<=" => Ok(ComparisonOp::Le),
            "==" | "=" => Ok(ComparisonOp::Eq),
            "!=" => Ok(ComparisonOp::Ne),
            other => Err(RuleParseError::UnknownOperator(other.to_string())),
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOp::Gt => lhs > rhs,
            ComparisonOp::Ge => lhs >= rhs,
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Le => lhs <= rhs,
            ComparisonOp::Eq => lhs == rhs,
            ComparisonOp::Ne => lhs != rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: ComparisonOp,
    pub value: f64,
}

impl Condition {
    fn holds(&self, context: &HashMap<String, f64>) -> bool {
        let lhs = context.get(&self.field).copied().unwrap_or(0.0);
        self.op.apply(lhs, self.value)
    }
}

/// The decision a matching rule yields. Never produced by dynamic
/// evaluation of the source string — only by this typed parser and its
/// `RuleEngine` consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    NoAction,
    Retreat,
    Detour,
    SetFormation(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub conditions: Vec<Condition>,
    pub action: Action,
}

impl Rule {
    fn matches(&self, context: &HashMap<String, f64>) -> bool {
        self.conditions.iter().all(|c| c.holds(context))
    }
}

/// An ordered list of rules; evaluation returns the first matching rule's
/// action, or `Action::NoAction` if none match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleEngine {
    pub rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleEngine { rules }
    }

    pub fn evaluate(&self, context: &HashMap<String, f64>) -> Action {
        self.rules
            .iter()
            .find(|r| r.matches(context))
            .map(|r| r.action)
            .unwrap_or(Action::NoAction)
    }
}

/// Parses `"retreat"`, `"detour"`, or an integer formation id.
pub fn parse_action(token: &str) -> Result<Action, RuleParseError> {
    let token = token.trim();
    match token {
        "retreat" => Ok(Action::Retreat),
        "detour" => Ok(Action::Detour),
        other => other
            .parse::<u8>()
            .map(Action::SetFormation)
            .map_err(|_| RuleParseError::UnknownAction(token.to_string())),
    }
}

/// Parses one parenthesized group: `"(BB >= 2)"`.
fn parse_group(group: &str) -> Result<Condition, RuleParseError> {
    let trimmed = group.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| RuleParseError::MalformedGroup(trimmed.to_string()))?;

    let parts: Vec<&str> = inner.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(RuleParseError::MalformedGroup(trimmed.to_string()));
    }
    let [token, op, number] = [parts[0], parts[1], parts[2]];

    if !SHIP_TYPE_TOKENS.contains(&token) {
        return Err(RuleParseError::UnknownToken(token.to_string()));
    }
    let op = ComparisonOp::parse(op)?;
    let value: f64 = number
        .parse()
        .map_err(|_| RuleParseError::InvalidNumber(number.to_string()))?;

    Ok(Condition {
        field: token.to_string(),
        op,
        value,
    })
}

/// Parses a strict AND-only conjunction of parenthesized groups, e.g.
/// `"(BB >= 2) and (CV > 0)"`. Rejects `or` outright — this is a safety
/// invariant, not a missing feature: rule authors must write multiple rules
/// instead of disjunctions.
pub fn parse_conjunction(condition_str: &str) -> Result<Vec<Condition>, RuleParseError> {
    let trimmed = condition_str.trim();
    if trimmed.is_empty() {
        return Err(RuleParseError::Empty);
    }
    if trimmed
        .split_whitespace()
        .any(|w| w.eq_ignore_ascii_case("or"))
    {
        return Err(RuleParseError::OrNotAllowed(trimmed.to_string()));
    }

    trimmed
        .split(" and ")
        .map(|group| parse_group(group))
        .collect()
}

/// Parses one `(condition_str, action)` rule item into a `Rule`.
pub fn parse_enemy_rule(condition_str: &str, action_token: &str) -> Result<Rule, RuleParseError> {
    Ok(Rule {
        conditions: parse_conjunction(condition_str)?,
        action: parse_action(action_token)?,
    })
}

/// A rule keyed on the detected enemy formation name rather than a
/// composition condition (no AST needed: equality on a literal name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationRule {
    pub formation_name: String,
    pub action: Action,
}

/// First rule whose `formation_name` equals `detected`, else `NoAction`.
pub fn evaluate_formation_rules(rules: &[FormationRule], detected: &str) -> Action {
    rules
        .iter()
        .find(|r| r.formation_name == detected)
        .map(|r| r.action)
        .unwrap_or(Action::NoAction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn parses_single_condition() {
        let rule = parse_enemy_rule("(BB >= 2)", "retreat").unwrap();
        assert_eq!(rule.action, Action::Retreat);
        assert_eq!(rule.conditions.len(), 1);
    }

    #[test]
    fn parses_and_conjunction() {
        let rule = parse_enemy_rule("(BB >= 2) and (CV > 0)", "retreat").unwrap();
        assert_eq!(rule.conditions.len(), 2);
    }

    #[test]
    fn rejects_or() {
        let err = parse_conjunction("(BB >= 2) or (CV > 0)").unwrap_err();
        assert!(matches!(err, RuleParseError::OrNotAllowed(_)));
    }

    #[test]
    fn rejects_unknown_token() {
        let err = parse_conjunction("(ZZ >= 2)").unwrap_err();
        assert!(matches!(err, RuleParseError::UnknownToken(_)));
    }

    #[test]
    fn engine_returns_first_matching_rule() {
        let rules = vec![
            Rule {
                conditions: parse_conjunction("(BB >= 2) and (CV > 0)").unwrap(),
                action: Action::Retreat,
            },
            Rule {
                conditions: parse_conjunction("(DD >= 1)").unwrap(),
                action: Action::Detour,
            },
        ];
        let engine = RuleEngine::new(rules);
        let context = ctx(&[("BB", 3.0), ("CV", 1.0), ("DD", 5.0)]);
        assert_eq!(engine.evaluate(&context), Action::Retreat);
    }

    #[test]
    fn engine_defaults_to_no_action() {
        let engine = RuleEngine::new(vec![Rule {
            conditions: parse_conjunction("(BB >= 99)").unwrap(),
            action: Action::Retreat,
        }]);
        assert_eq!(engine.evaluate(&ctx(&[("BB", 1.0)])), Action::NoAction);
    }

    #[test]
    fn formation_rule_precedence_by_name() {
        let rules = vec![FormationRule {
            formation_name: "单纵阵".to_string(),
            action: Action::SetFormation(4),
        }];
        assert_eq!(evaluate_formation_rules(&rules, "单纵阵"), Action::SetFormation(4));
        assert_eq!(evaluate_formation_rules(&rules, "复纵阵"), Action::NoAction);
    }
}

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::damage::ShipDamageState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    FightCondition,
    SpotEnemy,
    Detour,
    Formation,
    EnterFight,
    NightBattle,
    Result,
    GetShip,
    Proceed,
    FlagshipDamage,
    AutoReturn,
    Sl,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatEvent {
    pub event_type: Option<EventType>,
    pub node: String,
    pub action: String,
    pub result: String,
    pub enemies: Option<HashMap<String, u32>>,
    pub ship_stats: Option<Vec<ShipDamageState>>,
    pub extra: HashMap<String, String>,
}

impl CombatEvent {
    pub fn new(event_type: EventType, node: impl Into<String>) -> Self {
        CombatEvent {
            event_type: Some(event_type),
            node: node.into(),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = result.into();
        self
    }

    pub fn with_ship_stats(mut self, stats: Vec<ShipDamageState>) -> Self {
        self.ship_stats = Some(stats);
        self
    }

    pub fn with_enemies(mut self, enemies: HashMap<String, u32>) -> Self {
        self.enemies = Some(enemies);
        self
    }
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(t) = &self.event_type {
            parts.push(format!("{t:?}"));
        }
        if !self.node.is_empty() {
            parts.push(format!("node={}", self.node));
        }
        if !self.action.is_empty() {
            parts.push(format!("action={}", self.action));
        }
        if !self.result.is_empty() {
            parts.push(format!("result={}", self.result));
        }
        write!(f, "{}", parts.join(" | "))
    }
}

/// A fixed rank over letter grades, used only as the comparison key for
/// `FightResult`'s `Ord` impl — a proper enum here rather than a
/// string-indexed lookup table, since Rust's derive makes that the more
/// idiomatic expression of "closed, ordered set of grades".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    D,
    C,
    B,
    A,
    S,
    Ss,
}

impl Grade {
    /// Matches the label the engine stashes in a RESULT event's `extra`
    /// map under the `"grade"` key after a template match.
    pub fn from_label(label: &str) -> Option<Grade> {
        match label {
            "D" => Some(Grade::D),
            "C" => Some(Grade::C),
            "B" => Some(Grade::B),
            "A" => Some(Grade::A),
            "S" => Some(Grade::S),
            "SS" | "Ss" => Some(Grade::Ss),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::D => "D",
            Grade::C => "C",
            Grade::B => "B",
            Grade::A => "A",
            Grade::S => "S",
            Grade::Ss => "SS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightResult {
    pub mvp_slot: Option<u8>,
    pub grade: Option<Grade>,
    pub ship_stats: Vec<ShipDamageState>,
}

impl Default for FightResult {
    fn default() -> Self {
        FightResult {
            mvp_slot: None,
            grade: None,
            ship_stats: vec![ShipDamageState::Normal; 6],
        }
    }
}

impl PartialOrd for FightResult {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.grade.partial_cmp(&other.grade)
    }
}

/// An append-only log of combat events for one fight run. Exposable as a
/// read-only iterable once the fight ends.
#[derive(Debug, Clone, Default)]
pub struct CombatHistory {
    events: Vec<CombatEvent>,
}

impl CombatHistory {
    pub fn new() -> Self {
        CombatHistory::default()
    }

    pub fn add(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn reset(&mut self) {
        self.events.clear();
    }

    pub fn last_node(&self) -> &str {
        self.events.last().map(|e| e.node.as_str()).unwrap_or("")
    }

    pub fn events(&self) -> impl Iterator<Item = &CombatEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Extracts `FightResult`s from RESULT events, keyed by node name when
    /// every node traversed is alphabetic, else returned as an ordered list.
    pub fn fight_results(&self) -> Result<HashMap<String, FightResult>, Vec<FightResult>> {
        let result_events: Vec<&CombatEvent> = self
            .events
            .iter()
            .filter(|e| e.event_type == Some(EventType::Result))
            .collect();

        let all_alpha = !result_events.is_empty()
            && result_events
                .iter()
                .all(|e| !e.node.is_empty() && e.node.chars().all(|c| c.is_alphabetic()));

        let to_result = |e: &CombatEvent| FightResult {
            mvp_slot: None,
            grade: e.extra.get("grade").and_then(|label| Grade::from_label(label)),
            ship_stats: e.ship_stats.clone().unwrap_or_default(),
        };

        if all_alpha {
            Ok(result_events
                .iter()
                .map(|e| (e.node.clone(), to_result(e)))
                .collect())
        } else {
            Err(result_events.iter().map(|e| to_result(e)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_ordering_is_total() {
        assert!(Grade::S > Grade::A);
        assert!(Grade::Ss > Grade::S);
        assert!(Grade::D < Grade::C);
    }

    #[test]
    fn history_is_append_only_and_tracks_last_node() {
        let mut history = CombatHistory::new();
        assert_eq!(history.last_node(), "");
        history.add(CombatEvent::new(EventType::Proceed, "A"));
        history.add(CombatEvent::new(EventType::Proceed, "B"));
        assert_eq!(history.last_node(), "B");
        assert_eq!(history.len(), 2);
    }
}

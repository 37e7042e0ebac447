use std::collections::HashMap;
use std::time::Duration;

use tracing::{info, warn};

use sortie_device::Device;
use sortie_plan::{
    resolve_successors, Action, CombatMode, CombatPhase, CombatPlan, NodeDecision,
};
use sortie_vision::{PixelSignature, Screen};

use crate::damage::{check_blood, read_ship_stats, ShipDamageState};
use crate::error::{CombatRecognitionTimeout, InvalidDecisionError};
use crate::history::{CombatEvent, CombatHistory, EventType, Grade};
use crate::node_tracker::{MapNodeData, NodeTracker};
use crate::ocr::{EnemyCompositionRecognizer, OcrEngine};
use crate::recognizer::CombatRecognizer;

/// How a fight run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalFlag {
    OperationSuccess,
    DockFull,
    /// SL: the run must be abandoned and the game restarted from scratch.
    Sl,
}

#[derive(Debug, Clone)]
pub struct CombatResult {
    pub flag: TerminalFlag,
    pub history: CombatHistory,
    pub ship_stats: Vec<ShipDamageState>,
    pub node_count: u32,
}

enum StepOutcome {
    Continue,
    Terminal(TerminalFlag),
}

/// Every fixed screen coordinate and detection signature the engine needs,
/// outside of what's already carried on the plan itself. Grouped here
/// rather than scattered across handler methods so one call site can swap
/// the whole coordinate set for a different client resolution/skin.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub speed_up_coord: (f64, f64),
    pub detour_coord: (f64, f64),
    pub detour_visible: PixelSignature,
    pub enter_fight_coord: (f64, f64),
    pub missile_support_coord: (f64, f64),
    pub missile_support_visible: PixelSignature,
    pub retreat_coord: (f64, f64),
    pub formation_coords: HashMap<u8, (f64, f64)>,
    pub night_yes_coord: (f64, f64),
    pub night_no_coord: (f64, f64),
    pub result_tap_coord: (f64, f64),
    pub proceed_forward_coord: (f64, f64),
    pub proceed_retreat_coord: (f64, f64),
    pub flagship_confirm_coord: (f64, f64),
    pub get_ship_advance_coord: (f64, f64),
    pub missile_skip_coord: (f64, f64),
    pub resource_confirm_visible: PixelSignature,
    pub resource_confirm_coord: (f64, f64),
    pub fleet_icon_rule: sortie_vision::ImageRule,
    /// Anchor pixels for the six fleet slots on the result screen, read via
    /// nearest-color classification against `damage_palette`.
    pub damage_anchor_coords: [(f64, f64); 6],
    pub damage_palette: HashMap<String, sortie_vision::Color>,
    pub damage_tolerance: f64,
    /// Grade letter to template rule, tried in order; first match wins.
    pub grade_rules: Vec<(Grade, sortie_vision::ImageRule)>,
}

/// The sequence of decisions a SpotEnemy screen leads to, separated from
/// device I/O so it can be unit tested without a mocked screenshot loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpotEnemyAction {
    FightEnd,
    Detour,
    SetFormation(u8),
    EnterFight,
}

fn decide_spot_enemy(
    node_selected: bool,
    can_detour: bool,
    node: &NodeDecision,
    composition: &HashMap<String, f64>,
    formation_name: Option<&str>,
) -> Result<SpotEnemyAction, InvalidDecisionError> {
    if !node_selected {
        return Ok(SpotEnemyAction::FightEnd);
    }

    let want_detour = can_detour && node.detour;

    let rule_action = match (&node.formation_rules, formation_name) {
        (Some(rules), Some(name)) => {
            let action = sortie_plan::evaluate_formation_rules(rules, name);
            if action == Action::NoAction {
                node.enemy_rules
                    .as_ref()
                    .map(|e| e.evaluate(composition))
                    .unwrap_or(Action::NoAction)
            } else {
                action
            }
        }
        _ => node
            .enemy_rules
            .as_ref()
            .map(|e| e.evaluate(composition))
            .unwrap_or(Action::NoAction),
    };

    match rule_action {
        Action::Retreat => Ok(SpotEnemyAction::FightEnd),
        Action::Detour => {
            if !can_detour {
                return Err(InvalidDecisionError {
                    node: "spot_enemy".to_string(),
                    reason: "rule requested detour but detour is not visible".to_string(),
                });
            }
            Ok(SpotEnemyAction::Detour)
        }
        Action::SetFormation(f) => Ok(SpotEnemyAction::SetFormation(f)),
        Action::NoAction if want_detour => Ok(SpotEnemyAction::Detour),
        Action::NoAction => Ok(SpotEnemyAction::EnterFight),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormationAction {
    Sl,
    UseFormation(u8),
}

fn decide_formation(
    reached_via_detour_failure: bool,
    reached_via_spot_enemy: bool,
    node: &NodeDecision,
    formation_by_rule: Option<u8>,
) -> FormationAction {
    if reached_via_detour_failure && node.sl_when_detour_fails {
        return FormationAction::Sl;
    }
    if reached_via_spot_enemy {
        if let Some(f) = formation_by_rule {
            return FormationAction::UseFormation(f);
        }
        return FormationAction::UseFormation(node.formation);
    }
    if node.sl_when_spot_enemy_fails {
        return FormationAction::Sl;
    }
    FormationAction::UseFormation(node.formation_when_spot_enemy_fails.unwrap_or(node.formation))
}

fn decide_proceed(node: &NodeDecision, ship_stats: &[ShipDamageState]) -> bool {
    node.proceed && check_blood(ship_stats, &node.proceed_stop)
}

/// Runs one combat plan against a single device, end to end. Owns no
/// process-wide state: everything here is per-fight.
pub struct CombatEngine<'a> {
    device: &'a dyn Device,
    recognizer: &'a CombatRecognizer,
    config: &'a EngineConfig,
    ocr: Option<&'a dyn OcrEngine>,
    enemy_recognizer: Option<&'a dyn EnemyCompositionRecognizer>,
    restart_hook: Option<&'a mut dyn FnMut(&dyn Device)>,

    history: CombatHistory,
    node_tracker: Option<NodeTracker>,
    ship_stats: Vec<ShipDamageState>,
    node_count: u32,
    formation_by_rule: Option<u8>,
    last_composition: HashMap<String, f64>,
    last_formation_name: Option<String>,
}

impl<'a> CombatEngine<'a> {
    pub fn new(
        device: &'a dyn Device,
        recognizer: &'a CombatRecognizer,
        config: &'a EngineConfig,
    ) -> Self {
        CombatEngine {
            device,
            recognizer,
            config,
            ocr: None,
            enemy_recognizer: None,
            restart_hook: None,
            history: CombatHistory::new(),
            node_tracker: None,
            ship_stats: vec![ShipDamageState::Normal; 6],
            node_count: 0,
            formation_by_rule: None,
            last_composition: HashMap::new(),
            last_formation_name: None,
        }
    }

    pub fn with_ocr(mut self, ocr: &'a dyn OcrEngine) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_enemy_recognizer(mut self, recognizer: &'a dyn EnemyCompositionRecognizer) -> Self {
        self.enemy_recognizer = Some(recognizer);
        self
    }

    /// Injection point for restarting the game client after an SL. The
    /// engine only calls this hook; it never owns the restart procedure
    /// itself — game launch/restart glue is out of scope for this crate.
    pub fn with_restart_hook(mut self, hook: &'a mut dyn FnMut(&dyn Device)) -> Self {
        self.restart_hook = Some(hook);
        self
    }

    pub fn with_map_data(mut self, map: MapNodeData) -> Self {
        self.node_tracker = Some(NodeTracker::new(map));
        self
    }

    fn screenshot(&self) -> Option<Screen> {
        match self.device.screenshot(Duration::from_secs(5)) {
            Ok(frame) => Some(sortie_pages::frame_to_screen(&frame)),
            Err(err) => {
                warn!(?err, "screenshot failed");
                None
            }
        }
    }

    fn detour_visible(&self, screen: &Screen) -> bool {
        sortie_vision::PixelChecker::check_signature(screen, &self.config.detour_visible, false)
            .matched
    }

    fn resource_confirm_visible(&self, screen: &Screen) -> bool {
        sortie_vision::PixelChecker::check_signature(
            screen,
            &self.config.resource_confirm_visible,
            false,
        )
        .matched
    }

    /// Runs once per poll tick while waiting on a phase: speeds up combat,
    /// refreshes the node tracker, and dismisses any resource-gained popup.
    fn poll_action(&mut self, mode: CombatMode, phase: CombatPhase) {
        match mode {
            CombatMode::Normal => {
                if matches!(phase, CombatPhase::Proceed | CombatPhase::FightCondition) {
                    let _ = self.device.click(self.config.speed_up_coord.0, self.config.speed_up_coord.1);
                }
                if let Some(screen) = self.screenshot() {
                    if let Some(tracker) = self.node_tracker.as_mut() {
                        let icon_pos = sortie_vision::ImageChecker::match_rule(&screen, &self.config.fleet_icon_rule)
                            .center();
                        tracker.update(icon_pos);
                    }
                    if self.resource_confirm_visible(&screen) {
                        let _ = self
                            .device
                            .click(self.config.resource_confirm_coord.0, self.config.resource_confirm_coord.1);
                        std::thread::sleep(Duration::from_millis(250));
                    }
                }
            }
            CombatMode::Battle => {
                if phase == CombatPhase::Proceed {
                    let _ = self.device.click(self.config.speed_up_coord.0, self.config.speed_up_coord.1);
                }
            }
            CombatMode::Exercise => {}
        }
    }

    fn after_match(&mut self, phase: CombatPhase, screen: &Screen) {
        if matches!(
            phase,
            CombatPhase::SpotEnemy | CombatPhase::Formation | CombatPhase::FightCondition
        ) {
            if let Some(tracker) = self.node_tracker.as_mut() {
                let icon_pos = sortie_vision::ImageChecker::match_rule(screen, &self.config.fleet_icon_rule)
                    .center();
                tracker.update(icon_pos);
            }
        }

        if phase == CombatPhase::SpotEnemy {
            if let Some(recognizer) = self.enemy_recognizer {
                let crop = sortie_vision::PixelChecker::crop(screen, 0.0, 0.0, 1.0, 1.0);
                let crops = [
                    crop.clone(),
                    crop.clone(),
                    crop.clone(),
                    crop.clone(),
                    crop.clone(),
                    crop,
                ];
                let tokens = recognizer.recognize_enemy(&crops);
                let mut composition = HashMap::new();
                for token in tokens {
                    *composition.entry(token).or_insert(0.0) += 1.0;
                }
                self.last_composition = composition;
            }
            if let Some(ocr) = self.ocr {
                self.last_formation_name =
                    ocr.recognize_single(screen, None).map(|m| m.text);
            }
        }

        if phase == CombatPhase::Result {
            self.ship_stats = read_ship_stats(
                screen,
                &self.config.damage_anchor_coords,
                &self.config.damage_palette,
                self.config.damage_tolerance,
            );

            let grade = self.config.grade_rules.iter().find_map(|(grade, rule)| {
                sortie_vision::ImageChecker::match_rule(screen, rule)
                    .matched
                    .then_some(*grade)
            });

            let mut event = CombatEvent::new(EventType::Result, self.current_node())
                .with_ship_stats(self.ship_stats.clone());
            if let Some(grade) = grade {
                event.extra.insert("grade".to_string(), grade.label().to_string());
            }
            self.history.add(event);
        }
    }

    fn current_node(&self) -> String {
        self.node_tracker
            .as_ref()
            .map(|t| t.current_node().to_string())
            .unwrap_or_default()
    }

    /// Drives one `wait_for_phase` call plus its `after_match` postlude.
    fn update_state(
        &mut self,
        mode: CombatMode,
        current_phase: CombatPhase,
        last_action: &str,
    ) -> Result<CombatPhase, CombatRecognitionTimeout> {
        let table = sortie_plan::transitions_for_mode(mode);
        let candidates: Vec<CombatPhase> = resolve_successors(&table, current_phase, last_action)
            .map(|targets| targets.into_iter().map(|(p, _)| p).collect())
            .unwrap_or_default();

        // poll_action needs &mut self, which can't be reborrowed inside the
        // recognizer's `&mut dyn FnMut` closure alongside `self.device` — so
        // the polling side effects run once as a pre-step rather than on
        // every iteration of wait_for_phase's inner loop.
        self.poll_action(mode, current_phase);

        let phase = self
            .recognizer
            .wait_for_phase(self.device, &candidates, None)?;

        if let Some(screen) = self.screenshot() {
            self.after_match(phase, &screen);
        }

        Ok(phase)
    }

    fn make_decision(
        &mut self,
        plan: &CombatPlan,
        phase: CombatPhase,
        last_action: &mut String,
    ) -> Result<StepOutcome, InvalidDecisionError> {
        let node = plan.get_node_decision(&self.current_node());

        match phase {
            CombatPhase::SpotEnemy => {
                let screen = self.screenshot();
                let can_detour = screen
                    .as_ref()
                    .map(|s| self.detour_visible(s))
                    .unwrap_or(false);
                let selected = plan.is_selected_node(&self.current_node());

                let action = decide_spot_enemy(
                    selected,
                    can_detour,
                    node,
                    &self.last_composition,
                    self.last_formation_name.as_deref(),
                )?;

                match action {
                    SpotEnemyAction::FightEnd => {
                        let _ = self.device.click(self.config.retreat_coord.0, self.config.retreat_coord.1);
                        *last_action = "retreat".to_string();
                        self.history.add(CombatEvent::new(EventType::SpotEnemy, self.current_node()).with_action("retreat"));
                        Ok(StepOutcome::Terminal(TerminalFlag::OperationSuccess))
                    }
                    SpotEnemyAction::Detour => {
                        let _ = self.device.click(self.config.detour_coord.0, self.config.detour_coord.1);
                        *last_action = "detour".to_string();
                        self.history.add(CombatEvent::new(EventType::Detour, self.current_node()));
                        Ok(StepOutcome::Continue)
                    }
                    SpotEnemyAction::SetFormation(f) => {
                        self.formation_by_rule = Some(f);
                        if node.long_missile_support {
                            self.try_missile_support();
                        }
                        let _ = self.device.click(self.config.enter_fight_coord.0, self.config.enter_fight_coord.1);
                        *last_action = "fight".to_string();
                        self.history.add(CombatEvent::new(EventType::SpotEnemy, self.current_node()).with_action("fight"));
                        Ok(StepOutcome::Continue)
                    }
                    SpotEnemyAction::EnterFight => {
                        if node.long_missile_support {
                            self.try_missile_support();
                        }
                        let _ = self.device.click(self.config.enter_fight_coord.0, self.config.enter_fight_coord.1);
                        *last_action = "fight".to_string();
                        self.history.add(CombatEvent::new(EventType::SpotEnemy, self.current_node()).with_action("fight"));
                        Ok(StepOutcome::Continue)
                    }
                }
            }

            CombatPhase::Formation => {
                let reached_via_detour_failure = last_action.as_str() == "detour";
                let reached_via_spot_enemy = last_action.as_str() == "fight" || reached_via_detour_failure;
                let action = decide_formation(
                    reached_via_detour_failure,
                    reached_via_spot_enemy,
                    node,
                    self.formation_by_rule.take(),
                );
                match action {
                    FormationAction::Sl => Ok(StepOutcome::Terminal(TerminalFlag::Sl)),
                    FormationAction::UseFormation(f) => {
                        if let Some(coord) = self.config.formation_coords.get(&f) {
                            let _ = self.device.click(coord.0, coord.1);
                        }
                        *last_action = f.to_string();
                        self.history.add(CombatEvent::new(EventType::Formation, self.current_node()).with_action(f.to_string()));
                        Ok(StepOutcome::Continue)
                    }
                }
            }

            CombatPhase::NightPrompt => {
                let coord = if node.night {
                    self.config.night_yes_coord
                } else {
                    self.config.night_no_coord
                };
                let _ = self.device.click(coord.0, coord.1);
                *last_action = if node.night { "yes" } else { "no" }.to_string();
                self.history.add(CombatEvent::new(EventType::NightBattle, self.current_node()).with_action(last_action.clone()));
                Ok(StepOutcome::Continue)
            }

            CombatPhase::Result => {
                std::thread::sleep(Duration::from_secs(1));
                let _ = self.device.click(self.config.result_tap_coord.0, self.config.result_tap_coord.1);
                std::thread::sleep(Duration::from_millis(250));
                let _ = self.device.click(self.config.result_tap_coord.0, self.config.result_tap_coord.1);
                Ok(StepOutcome::Continue)
            }

            CombatPhase::Proceed => {
                self.node_count += 1;
                if decide_proceed(node, &self.ship_stats) {
                    let _ = self.device.click(self.config.proceed_forward_coord.0, self.config.proceed_forward_coord.1);
                    *last_action = "yes".to_string();
                    self.history.add(CombatEvent::new(EventType::Proceed, self.current_node()).with_action("yes"));
                    Ok(StepOutcome::Continue)
                } else {
                    let _ = self.device.click(self.config.proceed_retreat_coord.0, self.config.proceed_retreat_coord.1);
                    *last_action = "no".to_string();
                    self.history.add(CombatEvent::new(EventType::Proceed, self.current_node()).with_action("no"));
                    Ok(StepOutcome::Terminal(TerminalFlag::OperationSuccess))
                }
            }

            CombatPhase::FlagshipSevere => {
                let _ = self.device.click(self.config.flagship_confirm_coord.0, self.config.flagship_confirm_coord.1);
                self.history.add(CombatEvent::new(EventType::FlagshipDamage, self.current_node()));
                Ok(StepOutcome::Terminal(TerminalFlag::OperationSuccess))
            }

            CombatPhase::MissileAnim => {
                let _ = self.device.click(self.config.missile_skip_coord.0, self.config.missile_skip_coord.1);
                let _ = self.device.click(self.config.missile_skip_coord.0, self.config.missile_skip_coord.1);
                Ok(StepOutcome::Continue)
            }

            CombatPhase::GetShip => {
                let name = self
                    .screenshot()
                    .and_then(|s| self.ocr.and_then(|o| o.recognize_single(&s, None)))
                    .map(|m| m.text)
                    .unwrap_or_default();
                self.history.add(CombatEvent::new(EventType::GetShip, self.current_node()).with_result(name));
                let _ = self.device.click(self.config.get_ship_advance_coord.0, self.config.get_ship_advance_coord.1);
                Ok(StepOutcome::Continue)
            }

            CombatPhase::FightCondition => {
                self.history.add(CombatEvent::new(EventType::FightCondition, self.current_node()));
                Ok(StepOutcome::Continue)
            }

            CombatPhase::FightPeriod => Ok(StepOutcome::Continue),

            CombatPhase::MapPage | CombatPhase::BattlePage | CombatPhase::ExercisePage => {
                self.history.add(CombatEvent::new(EventType::AutoReturn, self.current_node()));
                Ok(StepOutcome::Terminal(TerminalFlag::OperationSuccess))
            }
        }
    }

    fn try_missile_support(&self) {
        match self.screenshot() {
            Some(screen) => {
                let visible = sortie_vision::PixelChecker::check_signature(
                    &screen,
                    &self.config.missile_support_visible,
                    false,
                )
                .matched;
                if visible {
                    let _ = self
                        .device
                        .click(self.config.missile_support_coord.0, self.config.missile_support_coord.1);
                } else {
                    warn!("long_missile_support requested but missile support button not visible");
                }
            }
            None => warn!("could not screenshot for missile support check"),
        }
    }

    fn try_recovery(&mut self, plan: &CombatPlan) -> bool {
        std::thread::sleep(Duration::from_secs(3));
        let Some(screen) = self.screenshot() else {
            return false;
        };
        self.recognizer
            .identify_current(&screen, &[plan.end_phase()])
            .is_some()
    }

    /// Runs the plan end to end against the owned device, returning once a
    /// terminal decision (or unrecoverable recognition timeout) is reached.
    pub fn fight(&mut self, plan: &CombatPlan, initial_ship_stats: Option<Vec<ShipDamageState>>) -> CombatResult {
        self.history.reset();
        self.node_count = 0;
        self.formation_by_rule = None;
        if let Some(stats) = initial_ship_stats {
            self.ship_stats = stats;
        }

        let mut current_phase = CombatPhase::Proceed;
        let mut last_action = if plan.mode == CombatMode::Normal {
            "yes".to_string()
        } else {
            String::new()
        };

        let flag = loop {
            match self.update_state(plan.mode, current_phase, &last_action) {
                Ok(phase) => current_phase = phase,
                Err(timeout) => {
                    warn!(?timeout, "combat recognition timed out");
                    if self.try_recovery(plan) {
                        current_phase = plan.end_phase();
                    } else {
                        break TerminalFlag::Sl;
                    }
                }
            }

            match self.make_decision(plan, current_phase, &mut last_action) {
                Ok(StepOutcome::Continue) => continue,
                Ok(StepOutcome::Terminal(flag)) => break flag,
                Err(err) => {
                    warn!(?err, "invalid decision, aborting with SL");
                    break TerminalFlag::Sl;
                }
            }
        };

        if flag == TerminalFlag::Sl {
            if let Some(hook) = self.restart_hook.as_deref_mut() {
                info!("SL triggered, invoking restart hook");
                hook(self.device);
            }
        }

        CombatResult {
            flag,
            history: std::mem::replace(&mut self.history, CombatHistory::new()),
            ship_stats: self.ship_stats.clone(),
            node_count: self.node_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortie_plan::{ComparisonOp, Condition, FormationRule, Rule, RuleEngine};

    #[test]
    fn spot_enemy_unselected_node_retreats() {
        let node = NodeDecision::default();
        let result = decide_spot_enemy(false, true, &node, &HashMap::new(), None).unwrap();
        assert_eq!(result, SpotEnemyAction::FightEnd);
    }

    #[test]
    fn spot_enemy_enemy_rule_retreats_on_match() {
        let mut node = NodeDecision::default();
        node.enemy_rules = Some(RuleEngine::new(vec![Rule {
            conditions: vec![
                Condition { field: "BB".to_string(), op: ComparisonOp::Ge, value: 2.0 },
                Condition { field: "CV".to_string(), op: ComparisonOp::Gt, value: 0.0 },
            ],
            action: Action::Retreat,
        }]));
        let mut composition = HashMap::new();
        composition.insert("BB".to_string(), 3.0);
        composition.insert("CV".to_string(), 1.0);

        let result = decide_spot_enemy(true, false, &node, &composition, None).unwrap();
        assert_eq!(result, SpotEnemyAction::FightEnd);
    }

    #[test]
    fn spot_enemy_detour_requested_but_not_visible_errors() {
        let mut node = NodeDecision::default();
        node.enemy_rules = Some(RuleEngine::new(vec![Rule {
            conditions: vec![],
            action: Action::Detour,
        }]));
        let err = decide_spot_enemy(true, false, &node, &HashMap::new(), None).unwrap_err();
        assert!(err.reason.contains("detour"));
    }

    #[test]
    fn spot_enemy_formation_rule_precedes_enemy_rule() {
        let mut node = NodeDecision::default();
        node.formation_rules = Some(vec![FormationRule {
            formation_name: "单纵阵".to_string(),
            action: Action::SetFormation(4),
        }]);
        node.enemy_rules = Some(RuleEngine::new(vec![Rule {
            conditions: vec![],
            action: Action::Retreat,
        }]));
        let result = decide_spot_enemy(true, false, &node, &HashMap::new(), Some("单纵阵")).unwrap();
        assert_eq!(result, SpotEnemyAction::SetFormation(4));
    }

    #[test]
    fn spot_enemy_with_no_rule_hit_and_no_detour_enters_fight() {
        let node = NodeDecision::default();
        let result = decide_spot_enemy(true, false, &node, &HashMap::new(), None).unwrap();
        assert_eq!(result, SpotEnemyAction::EnterFight);
    }

    #[test]
    fn spot_enemy_wants_detour_when_node_requests_it_and_it_is_visible() {
        let mut node = NodeDecision::default();
        node.detour = true;
        let result = decide_spot_enemy(true, true, &node, &HashMap::new(), None).unwrap();
        assert_eq!(result, SpotEnemyAction::Detour);
    }

    #[test]
    fn formation_detour_failure_triggers_sl_when_configured() {
        let mut node = NodeDecision::default();
        node.sl_when_detour_fails = true;
        let result = decide_formation(true, true, &node, None);
        assert_eq!(result, FormationAction::Sl);
    }

    #[test]
    fn formation_uses_stashed_formation_by_rule() {
        let node = NodeDecision::default();
        let result = decide_formation(false, true, &node, Some(4));
        assert_eq!(result, FormationAction::UseFormation(4));
    }

    #[test]
    fn formation_spot_enemy_skipped_falls_back_to_override_or_default() {
        let mut node = NodeDecision::default();
        node.formation_when_spot_enemy_fails = Some(3);
        let result = decide_formation(false, false, &node, None);
        assert_eq!(result, FormationAction::UseFormation(3));
    }

    #[test]
    fn proceed_blocked_when_any_slot_crosses_threshold() {
        let mut node = NodeDecision::default();
        node.proceed = true;
        node.proceed_stop = [2; 6];
        let mut stats = vec![ShipDamageState::Normal; 6];
        stats[3] = ShipDamageState::Severe;
        assert!(!decide_proceed(&node, &stats));
    }

    #[test]
    fn proceed_allowed_when_node_disables_it_is_still_false() {
        let mut node = NodeDecision::default();
        node.proceed = false;
        let stats = vec![ShipDamageState::Normal; 6];
        assert!(!decide_proceed(&node, &stats));
    }
}

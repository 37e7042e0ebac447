use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sortie_device::{DeviceInfo, Frame, MockDevice};
use sortie_engine::{CombatEngine, CombatRecognizer, EngineConfig, Grade, PhaseSignature};
use sortie_plan::{CombatMode, CombatPhase, CombatPlan};
use sortie_vision::{Color, ImageRule, ImageSignature, MatchStrategy, PixelSignature, Roi};

#[derive(Parser)]
#[command(name = "sortie", about = "Naval auto-sortie combat automation core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parses a combat plan YAML file and prints its resolved node decisions.
    Validate {
        plan: PathBuf,
    },
    /// Runs a combat plan against a mock device (no real ADB transport is
    /// implemented — wiring a real device is left to the caller).
    Run {
        #[arg(long)]
        plan: Option<PathBuf>,
    },
}

const DEMO_PLAN_YAML: &str = r#"
name: "demo 1-1"
mode: normal
chapter: 1
map: 1
fleet_id: 1
selected_nodes: ["A"]
node_defaults:
  formation: 2
  proceed: false
node_args:
  A:
    formation: 2
    night: false
"#;

fn load_plan(path: Option<&PathBuf>) -> Result<CombatPlan> {
    let source = match path {
        Some(p) => fs::read_to_string(p).with_context(|| format!("reading plan file {}", p.display()))?,
        None => DEMO_PLAN_YAML.to_string(),
    };
    CombatPlan::from_yaml(&source).context("parsing combat plan")
}

/// A signature that matches any screen unconditionally — used only to drive
/// the demo run deterministically through its phase sequence, in place of a
/// real template/pixel signature per phase.
fn trivial_signature(name: &str) -> PixelSignature {
    PixelSignature::new(name, vec![], MatchStrategy::All)
}

fn demo_recognizer(mode: CombatMode) -> CombatRecognizer {
    let mut recognizer = CombatRecognizer::new();
    let phases: &[CombatPhase] = match mode {
        CombatMode::Normal => &[
            CombatPhase::Proceed,
            CombatPhase::FightCondition,
            CombatPhase::SpotEnemy,
            CombatPhase::Formation,
            CombatPhase::MissileAnim,
            CombatPhase::FightPeriod,
            CombatPhase::NightPrompt,
            CombatPhase::Result,
            CombatPhase::GetShip,
            CombatPhase::FlagshipSevere,
            CombatPhase::MapPage,
        ],
        CombatMode::Battle => &[
            CombatPhase::Proceed,
            CombatPhase::SpotEnemy,
            CombatPhase::Formation,
            CombatPhase::FightPeriod,
            CombatPhase::NightPrompt,
            CombatPhase::Result,
            CombatPhase::BattlePage,
        ],
        CombatMode::Exercise => &[
            CombatPhase::Proceed,
            CombatPhase::SpotEnemy,
            CombatPhase::Formation,
            CombatPhase::FightPeriod,
            CombatPhase::Result,
            CombatPhase::ExercisePage,
        ],
    };
    for phase in phases {
        recognizer.register(PhaseSignature::new(
            *phase,
            ImageSignature {
                name: format!("{phase:?}"),
                rules: vec![],
                strategy: MatchStrategy::All,
                threshold: 0,
            },
            2.0,
        ));
    }
    recognizer
}

fn demo_config() -> EngineConfig {
    let mut formation_coords = std::collections::HashMap::new();
    for f in 1..=5u8 {
        formation_coords.insert(f, (0.1 * f as f64, 0.9));
    }
    EngineConfig {
        speed_up_coord: (0.95, 0.05),
        detour_coord: (0.2, 0.8),
        detour_visible: trivial_signature("detour_visible").with_threshold(0),
        enter_fight_coord: (0.5, 0.9),
        missile_support_coord: (0.3, 0.8),
        missile_support_visible: trivial_signature("missile_support_visible"),
        retreat_coord: (0.1, 0.1),
        formation_coords,
        night_yes_coord: (0.3, 0.6),
        night_no_coord: (0.7, 0.6),
        result_tap_coord: (0.5, 0.5),
        proceed_forward_coord: (0.7, 0.9),
        proceed_retreat_coord: (0.3, 0.9),
        flagship_confirm_coord: (0.5, 0.5),
        get_ship_advance_coord: (0.5, 0.9),
        missile_skip_coord: (0.9, 0.1),
        resource_confirm_visible: PixelSignature::new(
            "resource_confirm",
            vec![sortie_vision::PixelRule::of(0.5, 0.5, Color::new(0, 0, 0))],
            MatchStrategy::All,
        )
        .with_threshold(0),
        resource_confirm_coord: (0.5, 0.5),
        fleet_icon_rule: ImageRule {
            name: "fleet_icon".to_string(),
            templates: vec![],
            roi: Roi::full(),
            confidence: 0.7,
            method: sortie_vision::CorrelationMethod::default(),
        },
        damage_anchor_coords: [
            (0.1, 0.85),
            (0.2, 0.85),
            (0.3, 0.85),
            (0.4, 0.85),
            (0.5, 0.85),
            (0.6, 0.85),
        ],
        damage_palette: std::collections::HashMap::new(),
        damage_tolerance: 20.0,
        grade_rules: vec![
            (
                Grade::Ss,
                ImageRule {
                    name: "grade_ss".to_string(),
                    templates: vec![],
                    roi: Roi::full(),
                    confidence: 0.85,
                    method: sortie_vision::CorrelationMethod::default(),
                },
            ),
            (
                Grade::S,
                ImageRule {
                    name: "grade_s".to_string(),
                    templates: vec![],
                    roi: Roi::full(),
                    confidence: 0.85,
                    method: sortie_vision::CorrelationMethod::default(),
                },
            ),
        ],
    }
}

fn demo_frame() -> Frame {
    Frame {
        width: 4,
        height: 4,
        rgb: vec![0u8; 4 * 4 * 3],
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { plan } => {
            let plan = load_plan(Some(&plan))?;
            info!(name = %plan.name, mode = ?plan.mode, "loaded plan");
            for node in &plan.selected_nodes {
                let decision = plan.get_node_decision(node);
                info!(node, formation = decision.formation, proceed = decision.proceed, "resolved node");
            }
        }
        Commands::Run { plan } => {
            let plan = load_plan(plan.as_ref())?;
            let device = MockDevice::new(DeviceInfo { width: 1280, height: 720 }, vec![demo_frame()]);
            let recognizer = demo_recognizer(plan.mode);
            let config = demo_config();
            let mut engine = CombatEngine::new(&device, &recognizer, &config);
            let result = engine.fight(&plan, None);
            info!(
                flag = ?result.flag,
                node_count = result.node_count,
                events = result.history.len(),
                "fight finished"
            );
        }
    }

    Ok(())
}

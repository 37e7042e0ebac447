pub mod damage;
pub mod engine;
pub mod error;
pub mod history;
pub mod node_tracker;
pub mod ocr;
pub mod recognizer;

pub use damage::{check_blood, ShipDamageState};
pub use engine::{CombatEngine, CombatResult, EngineConfig, TerminalFlag};
pub use error::{CombatRecognitionTimeout, InvalidDecisionError};
pub use history::{CombatEvent, CombatHistory, EventType, FightResult, Grade};
pub use node_tracker::{MapNodeData, NodeInfo, NodeTracker};
pub use ocr::{EnemyCompositionRecognizer, NullEnemyRecognizer, NullOcr, OcrEngine, OcrMatch};
pub use recognizer::{CombatRecognizer, PhaseSignature, POLL_INTERVAL};

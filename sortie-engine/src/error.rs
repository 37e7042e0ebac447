use thiserror::Error;

use sortie_plan::CombatPhase;

#[derive(Debug, Error)]
#[error("recognition timed out waiting for one of {candidates:?} after {elapsed_s:.1}s")]
pub struct CombatRecognitionTimeout {
    pub candidates: Vec<CombatPhase>,
    pub elapsed_s: f64,
}

#[derive(Debug, Error)]
#[error("invalid decision at node {node}: {reason}")]
pub struct InvalidDecisionError {
    pub node: String,
    pub reason: String,
}

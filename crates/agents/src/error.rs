//! Agent error kinds. A tick that fails logs and moves on (§5's cancellation
//! model never aborts the ticker loop itself on a single bad cycle).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("match error: {0}")]
    Match(#[from] matching_engine::MatchError),

    #[error("ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),
}

pub type AgentResult<T> = Result<T, AgentError>;

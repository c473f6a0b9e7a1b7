use cpg_common::{ChainFamily, MalformedAmountError};
use explorer_tools::ExplorerError;
use thiserror::Error;

use crate::{matcher::MatchLookupError, traits::EnqueueError, validator::CausalityViolation};

/// Everything that can end the scan of a monitored address.
///
/// Errors are returned as data from each address worker and collected in the
/// [`CycleReport`](crate::reconciler::CycleReport). Nothing is retried within a cycle; the next cycle simply scans
/// again.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Could not reach the explorer. {0}")]
    Transport(String),
    #[error("The explorer returned a response that could not be understood. {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    MalformedAmount(#[from] MalformedAmountError),
    #[error("{0}")]
    MatchLookup(#[from] MatchLookupError),
    #[error("{0}")]
    CausalityViolation(#[from] CausalityViolation),
    #[error("Could not mark the order as paid. {0}")]
    StateTransition(String),
    #[error("{0}")]
    Enqueue(#[from] EnqueueError),
    #[error("Could not load the monitored addresses. {0}")]
    AddressLookup(String),
    #[error("No chain adapter is configured for {0}")]
    UnsupportedChain(ChainFamily),
}

impl From<ExplorerError> for ReconcileError {
    fn from(e: ExplorerError) -> Self {
        match e {
            ExplorerError::MalformedResponse(s) => Self::MalformedResponse(s),
            e => Self::Transport(e.to_string()),
        }
    }
}

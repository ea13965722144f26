use std::fmt;

/// Errors surfaced by the consensus layer.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsensusError {
    /// A round was started over an empty peer set. This is a
    /// programming error in the caller, not a recoverable condition.
    EmptyCluster,
    /// A message failed cryptographic verification and was dropped.
    InvalidSignature,
    /// A message was structurally invalid (e.g. a commit whose votes do
    /// not reach supermajority).
    InvalidMessage(&'static str),
    /// Leader rotation walked past the validate set without reaching
    /// supermajority; the round is over and upstream must re-seed.
    RoundAbandoned,
}

impl fmt::Display for ConsensusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusError::EmptyCluster => write!(f, "consensus round over an empty cluster"),
            ConsensusError::InvalidSignature => write!(f, "message signature verification failed"),
            ConsensusError::InvalidMessage(msg) => write!(f, "invalid consensus message: {msg}"),
            ConsensusError::RoundAbandoned => {
                write!(f, "round abandoned: rotation left the validate set")
            }
        }
    }
}

impl std::error::Error for ConsensusError {}

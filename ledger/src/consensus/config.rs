/// Consensus tuning parameters.
///
/// Delays are in milliseconds and bounded to `1..=100_000` by the
/// config loader.
#[derive(Clone, Debug)]
pub struct ConsensusConfig {
    /// Round timer: how long to wait for supermajority before rotating
    /// the leader.
    pub vote_delay_ms: u64,
    /// Interval between local block proposals.
    pub proposal_delay_ms: u64,
    /// How long the applier waits for a committed block before giving
    /// up on the round.
    pub load_delay_ms: u64,
    /// Soft limit on the number of transactions per proposal.
    pub max_proposal_size: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            vote_delay_ms: 5_000,
            proposal_delay_ms: 5_000,
            load_delay_ms: 5_000,
            max_proposal_size: 10_000,
        }
    }
}

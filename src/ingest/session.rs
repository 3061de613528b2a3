//! The ingest transactional state machine (C10, spec §4.8): one active
//! session at a time, three phases (`Begin`/`Push`/`Commit`), with `Abort`
//! discarding whatever was staged.

use std::collections::HashSet;

use crate::domain::{Denom, Pool, PoolId, SpreadFactor};
use crate::error::IngestError;
use crate::events::BlockCommitted;

#[derive(Default)]
struct Scratch {
    pools: Vec<Pool>,
    taker_fees: Vec<(Denom, Denom, SpreadFactor)>,
    updated_denoms: HashSet<Denom>,
    updated_pool_ids: HashSet<PoolId>,
}

enum State {
    Idle,
    Active { height: u64, scratch: Scratch },
}

/// A single typed batch, already wire-decoded (prost decoding and
/// per-record parse-failure skipping happens in `ingest::server`, one layer
/// up — this type only ever holds records that parsed successfully).
#[derive(Default)]
pub struct PushBatch {
    pub pools: Vec<Pool>,
    pub taker_fees: Vec<(Denom, Denom, SpreadFactor)>,
    pub updated_denoms: Vec<Denom>,
    pub updated_pool_ids: Vec<PoolId>,
}

pub struct IngestSession {
    state: State,
}

impl IngestSession {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn active_height(&self) -> Option<u64> {
        match &self.state {
            State::Active { height, .. } => Some(*height),
            State::Idle => None,
        }
    }

    /// A new `Begin` before a prior session's `Commit` aborts that prior
    /// session (spec §4.8).
    pub fn begin(&mut self, height: u64) {
        self.state = State::Active { height, scratch: Scratch::default() };
    }

    pub fn push(&mut self, batch: PushBatch) -> Result<(), IngestError> {
        let State::Active { scratch, .. } = &mut self.state else {
            return Err(IngestError::ParseFailed("push with no active session".to_string()));
        };
        scratch.pools.extend(batch.pools);
        scratch.taker_fees.extend(batch.taker_fees);
        scratch.updated_denoms.extend(batch.updated_denoms);
        scratch.updated_pool_ids.extend(batch.updated_pool_ids);
        Ok(())
    }

    /// Applies staged updates and returns the `BlockCommitted` event to
    /// broadcast, or `None` if `height` doesn't match the active session (a
    /// stale commit for an already-superseded session).
    pub fn commit(&mut self, height: u64) -> Result<Option<(Vec<Pool>, Vec<(Denom, Denom, SpreadFactor)>, BlockCommitted)>, IngestError> {
        let previous = std::mem::replace(&mut self.state, State::Idle);
        match previous {
            State::Active { height: active_height, scratch } if active_height == height => {
                let event = BlockCommitted {
                    height,
                    updated_denoms: scratch.updated_denoms.into_iter().collect(),
                    updated_pool_ids: scratch.updated_pool_ids.into_iter().collect(),
                };
                Ok(Some((scratch.pools, scratch.taker_fees, event)))
            }
            State::Active { height: active_height, scratch } => {
                // Not our height: restore state, this commit doesn't apply.
                self.state = State::Active { height: active_height, scratch };
                Ok(None)
            }
            State::Idle => Err(IngestError::ParseFailed("commit with no active session".to_string())),
        }
    }

    pub fn abort(&mut self) {
        self.state = State::Idle;
    }
}

impl Default for IngestSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PoolPayload, PoolType};

    fn pool(id: PoolId) -> Pool {
        Pool {
            id,
            pool_type: PoolType::Transmuter,
            denoms: vec!["A".to_string(), "B".to_string()],
            balances: Default::default(),
            spread_factor: SpreadFactor::ZERO,
            liquidity_cap: 0,
            taker_fee_override: None,
            payload: PoolPayload::Transmuter(crate::domain::TransmuterPayload { reserves: Default::default() }),
        }
    }

    #[test]
    fn full_lifecycle_commits_staged_pools() {
        let mut session = IngestSession::new();
        session.begin(10);
        session
            .push(PushBatch {
                pools: vec![pool(1)],
                taker_fees: vec![],
                updated_denoms: vec!["A".to_string()],
                updated_pool_ids: vec![1],
            })
            .unwrap();
        let (pools, _fees, event) = session.commit(10).unwrap().unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(event.height, 10);
        assert_eq!(event.updated_pool_ids, vec![1]);
    }

    #[test]
    fn push_without_begin_fails() {
        let mut session = IngestSession::new();
        let err = session.push(PushBatch::default()).unwrap_err();
        assert!(matches!(err, IngestError::ParseFailed(_)));
    }

    #[test]
    fn new_begin_discards_earlier_session() {
        let mut session = IngestSession::new();
        session.begin(1);
        session.push(PushBatch { pools: vec![pool(1)], ..Default::default() }).unwrap();
        session.begin(2); // supersedes height-1 session
        assert_eq!(session.active_height(), Some(2));
        let result = session.commit(1).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn abort_discards_scratch() {
        let mut session = IngestSession::new();
        session.begin(1);
        session.push(PushBatch { pools: vec![pool(1)], ..Default::default() }).unwrap();
        session.abort();
        assert!(session.active_height().is_none());
        let err = session.commit(1).unwrap_err();
        assert!(matches!(err, IngestError::ParseFailed(_)));
    }
}

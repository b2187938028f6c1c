// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{AdditiveShare, Error, Result};
use std::{
    mem,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default time to wait for every contributor before giving up.
pub const DEFAULT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug)]
enum CollectorState {
    Collecting {
        remaining: usize,
        sum: Option<AdditiveShare>,
    },
    Finished {
        sum: Option<AdditiveShare>,
    },
}

#[derive(Debug)]
struct Inner {
    state: Mutex<CollectorState>,
    done: watch::Sender<bool>,
}

/// Sums additive shares sent by a known number of contributors.
///
/// Handles are cheap to clone and can be moved into tasks or threads. Contributions may
/// arrive concurrently and in any order; the running sum is updated atomically and the single
/// consumer is released once the last expected contribution lands.
#[derive(Clone, Debug)]
pub struct AdditiveShareAccumulator {
    inner: Arc<Inner>,
}

impl AdditiveShareAccumulator {
    pub fn new(contributors: usize) -> Result<Self> {
        if contributors == 0 {
            return Err(Error::NoContributors);
        }
        let (done, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CollectorState::Collecting {
                    remaining: contributors,
                    sum: None,
                }),
                done,
            }),
        })
    }

    /// Fold one share into the running sum.
    ///
    /// A share whose shape or modulus disagrees with the ones already received is rejected
    /// and does not count towards completion.
    pub fn contribute(&self, share: &AdditiveShare) -> Result<()> {
        let mut state = self.inner.state.lock().map_err(|_| Error::LockPoisoned)?;
        let CollectorState::Collecting { remaining, sum } = &mut *state else {
            warn!("Contribution received after the accumulator completed");
            return Err(Error::AlreadyComplete);
        };

        if let Some(acc) = sum.as_mut() {
            acc.sum_assign(share)?;
        } else {
            *sum = Some(share.clone());
        }
        *remaining -= 1;
        debug!(remaining = *remaining, "Share accumulated");

        if *remaining == 0 {
            let sum = sum.take();
            *state = CollectorState::Finished { sum };
            drop(state);
            info!("All additive shares accumulated");
            self.inner.done.send_replace(true);
        }
        Ok(())
    }

    /// Number of contributions still expected.
    pub fn remaining(&self) -> Result<usize> {
        let state = self.inner.state.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(match &*state {
            CollectorState::Collecting { remaining, .. } => *remaining,
            CollectorState::Finished { .. } => 0,
        })
    }

    pub fn is_complete(&self) -> bool {
        *self.inner.done.borrow()
    }

    /// Wait until every contributor has reported and take the sum.
    ///
    /// The sum can be taken only once.
    pub async fn await_completion(&self) -> Result<AdditiveShare> {
        let mut rx = self.inner.done.subscribe();
        rx.wait_for(|done| *done)
            .await
            .map_err(|_| Error::CollectionClosed)?;
        self.take_sum()
    }

    /// Like [`Self::await_completion`] but gives up after `timeout`.
    pub async fn await_completion_timeout(&self, timeout: Duration) -> Result<AdditiveShare> {
        match tokio::time::timeout(timeout, self.await_completion()).await {
            Ok(res) => res,
            Err(_) => {
                let remaining = self.remaining()?;
                warn!(
                    "Timed out waiting for additive shares, {} contributions missing",
                    remaining
                );
                Err(Error::CollectionTimeout { remaining })
            }
        }
    }

    fn take_sum(&self) -> Result<AdditiveShare> {
        let mut state = self.inner.state.lock().map_err(|_| Error::LockPoisoned)?;
        match &mut *state {
            CollectorState::Finished { sum } => mem::take(sum).ok_or(Error::AlreadyConsumed),
            CollectorState::Collecting { remaining, .. } => Err(Error::CollectionIncomplete {
                remaining: *remaining,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::JoinSet;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_contributions() -> anyhow::Result<()> {
        let acc = AdditiveShareAccumulator::new(16)?;
        let waiter = {
            let acc = acc.clone();
            tokio::spawn(async move { acc.await_completion().await })
        };

        let mut set = JoinSet::new();
        for i in 0..16u64 {
            let acc = acc.clone();
            set.spawn(async move { acc.contribute(&AdditiveShare::new(vec![i, 1, 2], 17)?) });
        }
        while let Some(res) = set.join_next().await {
            res??;
        }

        let sum = waiter.await??;
        // sum(0..16) = 120 = 1 mod 17
        assert_eq!(sum, vec![1, 16, 15]);
        assert!(acc.is_complete());
        Ok(())
    }

    #[tokio::test]
    async fn test_contribution_after_completion_is_rejected() -> anyhow::Result<()> {
        let acc = AdditiveShareAccumulator::new(1)?;
        acc.contribute(&AdditiveShare::new(vec![3, 4], 17)?)?;
        let late = acc.contribute(&AdditiveShare::new(vec![1, 1], 17)?);
        assert!(matches!(late, Err(Error::AlreadyComplete)));
        assert_eq!(acc.await_completion().await?, vec![3, 4]);
        Ok(())
    }

    #[tokio::test]
    async fn test_mismatched_share_does_not_count() -> anyhow::Result<()> {
        let acc = AdditiveShareAccumulator::new(2)?;
        acc.contribute(&AdditiveShare::new(vec![1, 2], 17)?)?;
        let bad = acc.contribute(&AdditiveShare::new(vec![1, 2, 3], 17)?);
        assert!(matches!(bad, Err(Error::LengthMismatch { .. })));
        let bad = acc.contribute(&AdditiveShare::new(vec![1, 2], 19)?);
        assert!(matches!(bad, Err(Error::ModulusMismatch { .. })));
        assert_eq!(acc.remaining()?, 1);
        assert!(!acc.is_complete());
        Ok(())
    }

    #[tokio::test]
    async fn test_sum_is_consumed_once() -> anyhow::Result<()> {
        let acc = AdditiveShareAccumulator::new(1)?;
        acc.contribute(&AdditiveShare::new(vec![7], 17)?)?;
        assert_eq!(acc.await_completion().await?, vec![7]);
        assert!(matches!(
            acc.await_completion().await,
            Err(Error::AlreadyConsumed)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_reports_missing() -> anyhow::Result<()> {
        let acc = AdditiveShareAccumulator::new(3)?;
        acc.contribute(&AdditiveShare::new(vec![7], 17)?)?;
        let res = acc
            .await_completion_timeout(Duration::from_millis(20))
            .await;
        assert!(matches!(res, Err(Error::CollectionTimeout { remaining: 2 })));
        Ok(())
    }

    #[test]
    fn test_take_before_completion_reports_incomplete() -> anyhow::Result<()> {
        let acc = AdditiveShareAccumulator::new(3)?;
        acc.contribute(&AdditiveShare::new(vec![7], 17)?)?;
        assert!(matches!(
            acc.take_sum(),
            Err(Error::CollectionIncomplete { remaining: 2 })
        ));
        // nothing was consumed
        acc.contribute(&AdditiveShare::new(vec![1], 17)?)?;
        acc.contribute(&AdditiveShare::new(vec![1], 17)?)?;
        assert_eq!(acc.take_sum()?, vec![9]);
        Ok(())
    }

    #[test]
    fn test_zero_contributors_rejected() {
        assert!(matches!(
            AdditiveShareAccumulator::new(0),
            Err(Error::NoContributors)
        ));
    }
}

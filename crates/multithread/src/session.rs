// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{MultithreadReport, TaskPool, TaskTimeouts, TrackDuration};
use anyhow::{anyhow, bail, Context, Result};
use e2s::{
    AdditiveShare, AdditiveShareAccumulator, AggregateIter, DecryptionShare, E2sProtocol,
    SharedRng, DEFAULT_COLLECTION_TIMEOUT,
};
use fhe::bfv::{BfvParameters, Ciphertext, SecretKey};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinSet;
use tracing::info;

const GENERATE_SHARES: &str = "generate_shares";
const FINALIZE: &str = "finalize";

/// Result of one simulated conversion.
#[derive(Debug)]
pub struct SessionOutput {
    /// Additive shares indexed by party, the master first.
    pub shares: Vec<AdditiveShare>,
    /// Sum of every additive share, as collected by the accumulator.
    pub reconstructed: AdditiveShare,
    pub report: MultithreadReport,
}

/// Drives one E2S conversion among locally simulated parties.
///
/// Party 0 is the master. Every helper runs as its own job on the task pool and pushes its
/// additive share into a shared accumulator as soon as it is ready; the master runs once
/// every helper's decryption share has been aggregated.
#[derive(Debug, Clone)]
pub struct E2sSession {
    par: Arc<BfvParameters>,
    sigma_smudging: f64,
    pool: TaskPool,
    rng: SharedRng,
    timeout: Duration,
}

impl E2sSession {
    pub fn new(
        par: &Arc<BfvParameters>,
        sigma_smudging: f64,
        pool: TaskPool,
        rng: SharedRng,
    ) -> Self {
        Self {
            par: par.clone(),
            sigma_smudging,
            pool,
            rng,
            timeout: DEFAULT_COLLECTION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convert `ct`, encrypted under the sum of `keys`, into one additive share per key.
    pub async fn run(&self, keys: Vec<SecretKey>, ct: Ciphertext) -> Result<SessionOutput> {
        let parties = keys.len();
        if parties < 2 {
            bail!("E2S needs at least two parties, got {}", parties);
        }
        e2s::validate_ciphertext(&ct)?;

        let keys = Arc::new(keys);
        let ct = Arc::new(ct);
        let accumulator = AdditiveShareAccumulator::new(parties)?;
        let mut report = MultithreadReport::default();

        let mut helpers = JoinSet::new();
        for party_id in 1..parties {
            let seed = self.fork_seed()?;
            let pool = self.pool.clone();
            let par = self.par.clone();
            let sigma = self.sigma_smudging;
            let keys = keys.clone();
            let ct = ct.clone();
            let accumulator = accumulator.clone();

            helpers.spawn(async move {
                let (result, duration) = pool
                    .spawn(
                        format!("{GENERATE_SHARES}({party_id})"),
                        TaskTimeouts::default(),
                        move || {
                            let mut rng = ChaCha20Rng::from_seed(seed);
                            let mut protocol = E2sProtocol::new(&par, sigma)?;
                            protocol.generate_shares(&keys[party_id], &ct, &mut rng)
                        },
                    )
                    .await?;
                let (dec_share, add_share) = result
                    .with_context(|| format!("Helper {} failed to generate shares", party_id))?;
                accumulator.contribute(&add_share)?;
                info!(party_id, "Helper shares generated");
                Ok::<_, anyhow::Error>((party_id, dec_share, add_share, duration))
            });
        }

        let mut shares: Vec<Option<AdditiveShare>> = vec![None; parties];
        let mut dec_shares = Vec::with_capacity(parties - 1);
        while let Some(joined) = helpers.join_next().await {
            let (party_id, dec_share, add_share, duration) = joined??;
            report.track(TrackDuration::new(GENERATE_SHARES, duration));
            dec_shares.push(dec_share);
            shares[party_id] = Some(add_share);
        }

        let aggregated: DecryptionShare = dec_shares.into_iter().aggregate()?;

        let (result, duration) = {
            let par = self.par.clone();
            let sigma = self.sigma_smudging;
            let keys = keys.clone();
            let ct = ct.clone();
            self.pool
                .spawn(FINALIZE.to_string(), TaskTimeouts::default(), move || {
                    let mut protocol = E2sProtocol::new(&par, sigma)?;
                    protocol.finalize(&keys[0], &ct, &aggregated)
                })
                .await?
        };
        report.track(TrackDuration::new(FINALIZE, duration));
        let master_share = result.context("Master failed to finalize")?;
        accumulator.contribute(&master_share)?;
        info!(party_id = 0, "Master share finalized");
        shares[0] = Some(master_share);

        let reconstructed = accumulator.await_completion_timeout(self.timeout).await?;
        let shares = shares
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.ok_or_else(|| anyhow!("Missing additive share for party {}", i)))
            .collect::<Result<Vec<_>>>()?;

        Ok(SessionOutput {
            shares,
            reconstructed,
            report,
        })
    }

    /// Give each job its own generator so that jobs never contend on the shared one.
    fn fork_seed(&self) -> Result<[u8; 32]> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("rng lock poisoned"))?;
        Ok(rng.gen())
    }
}

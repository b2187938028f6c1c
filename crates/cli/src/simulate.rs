// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};
use clap::Args;
use e2s::{AdditiveShare, SharedRng};
use e2s_config::E2sConfig;
use e2s_multithread::{E2sSession, TaskPool, TrustedDealer};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of parties, overrides `num_parties` from the config
    #[arg(short, long)]
    pub parties: Option<usize>,

    /// Seed for a reproducible run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Plaintext values, zero-padded to the ring degree
    #[arg(long, value_delimiter = ',', default_value = "1,2,3,4")]
    pub values: Vec<u64>,
}

#[derive(Serialize)]
struct SimulationOutput<'a> {
    parties: usize,
    plaintext_modulus: u64,
    shares: &'a [AdditiveShare],
    reconstructed: &'a AdditiveShare,
}

pub async fn execute(config: &E2sConfig, args: SimulateArgs) -> Result<()> {
    let parties = args.parties.unwrap_or(config.num_parties);
    if parties < 2 {
        bail!("At least two parties are required, got {}", parties);
    }
    let t = config.plaintext_modulus;
    if let Some(v) = args.values.iter().find(|&&v| v >= t) {
        bail!("Value {} does not fit the plaintext modulus {}", v, t);
    }

    let par = config.bfv_params()?;
    let rng: SharedRng = Arc::new(Mutex::new(match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    }));

    let mut dealer = TrustedDealer::new(&par);
    let keys = dealer.deal(parties, &rng)?;
    let ct = dealer.encrypt(&args.values, &rng)?;

    let pool = TaskPool::new(config.threads, config.max_tasks)?;
    let session = E2sSession::new(&par, config.sigma_smudging, pool, rng)
        .with_timeout(config.collection_timeout());
    let output = session.run(keys, ct).await?;

    info!("Simulation finished\n{}", output.report.to_report());
    println!(
        "{}",
        serde_json::to_string_pretty(&SimulationOutput {
            parties,
            plaintext_modulus: t,
            shares: &output.shares,
            reconstructed: &output.reconstructed,
        })?
    );

    Ok(())
}

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Ideal key split for simulations. A real deployment would obtain the key shares from a
//! distributed key generation; the dealer sees the ideal key and must never be used outside
//! of tests and local runs.

use anyhow::{anyhow, bail, Result};
use e2s::SharedRng;
use fhe::bfv::{BfvParameters, Ciphertext, Encoding, Plaintext, SecretKey};
use fhe_traits::{FheEncoder, FheEncrypter};
use std::sync::Arc;
use tracing::info;

pub struct TrustedDealer {
    par: Arc<BfvParameters>,
    ideal: Option<SecretKey>,
}

impl TrustedDealer {
    pub fn new(par: &Arc<BfvParameters>) -> Self {
        Self {
            par: par.clone(),
            ideal: None,
        }
    }

    /// Sample `parties` key shares. Their coefficient-wise sum becomes the ideal key that
    /// [`Self::encrypt`] encrypts under.
    pub fn deal(&mut self, parties: usize, rng: &SharedRng) -> Result<Vec<SecretKey>> {
        if parties < 2 {
            bail!("E2S needs at least two parties, got {}", parties);
        }
        let keys: Vec<SecretKey> = {
            let mut rng = rng.lock().map_err(|_| anyhow!("rng lock poisoned"))?;
            (0..parties)
                .map(|_| SecretKey::random(&self.par, &mut *rng))
                .collect()
        };
        let ideal: Vec<i64> = (0..self.par.degree())
            .map(|j| keys.iter().map(|k| k.coeffs[j]).sum())
            .collect();
        self.ideal = Some(SecretKey::new(ideal, &self.par));
        info!(parties, "Dealt secret key shares");
        Ok(keys)
    }

    /// Encrypt `values` under the ideal key, zero-padding them to the ring degree.
    pub fn encrypt(&self, values: &[u64], rng: &SharedRng) -> Result<Ciphertext> {
        let Some(ideal) = &self.ideal else {
            bail!("Keys must be dealt before encrypting");
        };
        let degree = self.par.degree();
        if values.len() > degree {
            bail!(
                "{} values do not fit in a ring of degree {}",
                values.len(),
                degree
            );
        }
        let mut padded = vec![0u64; degree];
        padded[..values.len()].copy_from_slice(values);

        let pt = Plaintext::try_encode(&padded, Encoding::poly(), &self.par)?;
        let mut rng = rng.lock().map_err(|_| anyhow!("rng lock poisoned"))?;
        Ok(ideal.try_encrypt(&pt, &mut *rng)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use e2s::build_bfv_params_arc;
    use fhe_traits::{FheDecoder, FheDecrypter};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Mutex;

    #[test]
    fn test_dealt_keys_sum_to_encryption_key() -> Result<()> {
        let rng: SharedRng = Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(9)));
        let par = build_bfv_params_arc(8, 17, &[0xffffee001, 0xffffc4001])?;
        let mut dealer = TrustedDealer::new(&par);
        let keys = dealer.deal(3, &rng)?;
        assert_eq!(keys.len(), 3);

        let ct = dealer.encrypt(&[1, 2, 3], &rng)?;
        let ideal: Vec<i64> = (0..8)
            .map(|j| keys.iter().map(|k| k.coeffs[j]).sum())
            .collect();
        let pt = SecretKey::new(ideal, &par).try_decrypt(&ct)?;
        let values = Vec::<u64>::try_decode(&pt, Encoding::poly())?;
        assert_eq!(values, vec![1, 2, 3, 0, 0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_encrypt_requires_keys() -> Result<()> {
        let rng: SharedRng = Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(9)));
        let par = build_bfv_params_arc(8, 17, &[0xffffee001])?;
        let mut dealer = TrustedDealer::new(&par);
        assert!(dealer.encrypt(&[1], &rng).is_err());
        assert!(dealer.deal(1, &rng).is_err());
        dealer.deal(2, &rng)?;
        assert!(dealer.encrypt(&[0; 9], &rng).is_err());
        Ok(())
    }
}

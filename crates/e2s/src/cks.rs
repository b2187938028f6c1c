// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Collective key switching (CKS) share generation.
//!
//! A party holding `s_i` produces `h_i = (s_i - s'_i) * c1 + e_i` where `s'_i` is its share of
//! the output key and `e_i` is smudging noise. Summing every `h_i` into `c0` switches the
//! ciphertext from the key `sum(s_i)` to the key `sum(s'_i)`. With no output key the
//! ciphertext is switched to the null key, i.e. decrypted.

use crate::{
    noise::SmudgingNoise,
    params::{validate_ciphertext, validate_ciphertext_context},
    Error, Result,
};
use fhe::bfv::{BfvParameters, Ciphertext, SecretKey};
use fhe_math::rq::{traits::TryConvertFrom, Context, Poly, Representation};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;

#[derive(Clone, Debug)]
pub struct KeySwitchShareGenerator {
    par: Arc<BfvParameters>,
    ctx: Arc<Context>,
    noise: SmudgingNoise,
}

impl KeySwitchShareGenerator {
    /// Fails if 6 sigma reaches half of delta, where the noise alone would corrupt the
    /// decryption.
    pub fn new(par: &Arc<BfvParameters>, sigma_smudging: f64) -> Result<Self> {
        let noise = SmudgingNoise::new(sigma_smudging)?;
        let q: f64 = par.moduli().iter().map(|&qi| qi as f64).product();
        let half_delta = q / (2.0 * par.plaintext() as f64);
        if noise.bound() as f64 >= half_delta {
            return Err(Error::InvalidSmudgingSigma(sigma_smudging));
        }
        Ok(Self {
            par: par.clone(),
            ctx: par.ctx_at_level(0)?.clone(),
            noise,
        })
    }

    pub fn sigma_smudging(&self) -> f64 {
        self.noise.sigma()
    }

    /// Write this party's key switching share for `ct` into `out`.
    ///
    /// `sk_output` is the party's share of the target key; `None` targets the null key.
    pub fn generate_share<R: RngCore + CryptoRng>(
        &self,
        sk_input: &SecretKey,
        sk_output: Option<&SecretKey>,
        ct: &Ciphertext,
        out: &mut Poly,
        rng: &mut R,
    ) -> Result<()> {
        validate_ciphertext(ct)?;
        validate_ciphertext_context(ct, &self.ctx)?;

        let mut s = self.key_poly(sk_input)?;
        if let Some(sk_output) = sk_output {
            let s_out = self.key_poly(sk_output)?;
            *s -= &*s_out;
        }

        let e = self.noise.sample_poly(&self.ctx, self.par.degree(), rng)?;

        let mut h = &ct.c[1] * &*s;
        h += &*e;
        *out = h;
        Ok(())
    }

    fn key_poly(&self, sk: &SecretKey) -> Result<Zeroizing<Poly>> {
        let mut s = Zeroizing::new(Poly::try_convert_from(
            sk.coeffs.as_ref(),
            &self.ctx,
            false,
            Representation::PowerBasis,
        )?);
        s.change_representation(Representation::Ntt);
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::build_bfv_params_arc;
    use fhe::bfv::{Encoding, Plaintext};
    use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_switching_to_null_key_decrypts() -> anyhow::Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let params = build_bfv_params_arc(8, 17, &[0xffffee001, 0xffffc4001])?;
        let generator = KeySwitchShareGenerator::new(&params, 3.2)?;

        let shares: Vec<SecretKey> = (0..3)
            .map(|_| SecretKey::random(&params, &mut rng))
            .collect();
        let ideal: Vec<i64> = (0..params.degree())
            .map(|j| shares.iter().map(|s| s.coeffs[j]).sum())
            .collect();
        let ideal = SecretKey::new(ideal, &params);

        let values = vec![3u64, 1, 4, 1, 5, 9, 2, 6];
        let pt = Plaintext::try_encode(&values, Encoding::poly(), &params)?;
        let ct: Ciphertext = ideal.try_encrypt(&pt, &mut rng)?;

        // Switching every share to the null key leaves c0 + sum(h_i) ~ delta * m, which
        // decrypts correctly under the all-zero key.
        let mut c0 = ct.c[0].clone();
        for sk in &shares {
            let mut h = Poly::zero(params.ctx_at_level(0)?, Representation::Ntt);
            generator.generate_share(sk, None, &ct, &mut h, &mut rng)?;
            c0 += &h;
        }
        let switched = Ciphertext::new(vec![c0, ct.c[1].clone()], &params)?;
        let null_key = SecretKey::new(vec![0; params.degree()], &params);
        let decrypted = null_key.try_decrypt(&switched)?;
        assert_eq!(Vec::<u64>::try_decode(&decrypted, Encoding::poly())?, values);
        Ok(())
    }

    #[test]
    fn test_sigma_bounded_by_delta() -> anyhow::Result<()> {
        // q ~ 2^36 and t = 17, so delta / 2 ~ 2^31
        let params = build_bfv_params_arc(8, 17, &[0xffffee001])?;
        assert!(KeySwitchShareGenerator::new(&params, 3.2).is_ok());
        assert!(matches!(
            KeySwitchShareGenerator::new(&params, 1e9),
            Err(Error::InvalidSmudgingSigma(_))
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_foreign_ciphertext() -> anyhow::Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let params = build_bfv_params_arc(8, 17, &[0xffffee001, 0xffffc4001])?;
        let other = build_bfv_params_arc(8, 17, &[0xffffee001])?;
        let generator = KeySwitchShareGenerator::new(&params, 3.2)?;

        let sk = SecretKey::random(&other, &mut rng);
        let pt = Plaintext::try_encode(&[1u64], Encoding::poly(), &other)?;
        let ct: Ciphertext = sk.try_encrypt(&pt, &mut rng)?;

        let own_sk = SecretKey::random(&params, &mut rng);
        let mut h = Poly::zero(params.ctx_at_level(0)?, Representation::Ntt);
        let res = generator.generate_share(&own_sk, None, &ct, &mut h, &mut rng);
        assert!(matches!(res, Err(Error::ParametersMismatch)));
        Ok(())
    }
}

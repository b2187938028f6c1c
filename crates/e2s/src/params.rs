// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Error, Result};
use fhe::bfv::{BfvParameters, BfvParametersBuilder, Ciphertext, SecretKey};
use fhe_math::rq::{Context, Poly, Representation};
use fhe_traits::FheDecrypter;
use std::sync::Arc;

/// Build BFV parameters, surfacing inconsistencies as errors instead of panicking.
pub fn build_bfv_params_arc(
    degree: usize,
    plaintext_modulus: u64,
    moduli: &[u64],
) -> Result<Arc<BfvParameters>> {
    if plaintext_modulus < 2 {
        return Err(Error::InvalidPlaintextModulus(plaintext_modulus));
    }
    if moduli.is_empty() {
        return Err(Error::Parameters("at least one ciphertext modulus is required".into()));
    }

    Ok(BfvParametersBuilder::new()
        .set_degree(degree)
        .set_plaintext_modulus(plaintext_modulus)
        .set_moduli(moduli)
        .build_arc()?)
}

pub(crate) fn validate_sigma(sigma: f64) -> Result<f64> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Error::InvalidSmudgingSigma(sigma));
    }
    Ok(sigma)
}

/// E2S works on fresh-shaped ciphertexts: two polynomials at the top level.
pub fn validate_ciphertext(ct: &Ciphertext) -> Result<()> {
    if ct.c.len() != 2 || ct.level != 0 {
        return Err(Error::UnsupportedCiphertext {
            polys: ct.c.len(),
            level: ct.level,
        });
    }
    Ok(())
}

/// Every polynomial of `ct` must live in `ctx`.
pub fn validate_ciphertext_context(ct: &Ciphertext, ctx: &Arc<Context>) -> Result<()> {
    if ct.c.iter().any(|c| c.ctx() != ctx) {
        return Err(Error::ParametersMismatch);
    }
    Ok(())
}

/// Rejects ciphertexts and secret keys built for other BFV parameters.
///
/// The backend does not expose the parameters a ciphertext or key carries. Its decryptor
/// compares them, so a decryption with a null key (or of a zero ciphertext) is the test.
pub(crate) struct ParameterCheck {
    ctx: Arc<Context>,
    null_key: SecretKey,
    zero_ct: Ciphertext,
}

impl ParameterCheck {
    pub(crate) fn new(par: &Arc<BfvParameters>) -> Result<Self> {
        let ctx = par.ctx_at_level(0)?.clone();
        let zero_ct = Ciphertext::new(
            vec![
                Poly::zero(&ctx, Representation::Ntt),
                Poly::zero(&ctx, Representation::Ntt),
            ],
            par,
        )?;
        Ok(Self {
            null_key: SecretKey::new(vec![0; par.degree()], par),
            zero_ct,
            ctx,
        })
    }

    pub(crate) fn ciphertext(&self, ct: &Ciphertext) -> Result<()> {
        validate_ciphertext(ct)?;
        validate_ciphertext_context(ct, &self.ctx)?;
        self.null_key
            .try_decrypt(ct)
            .map(drop)
            .map_err(|_| Error::ParametersMismatch)
    }

    pub(crate) fn secret_key(&self, sk: &SecretKey) -> Result<()> {
        sk.try_decrypt(&self.zero_ct)
            .map(drop)
            .map_err(|_| Error::ParametersMismatch)
    }
}

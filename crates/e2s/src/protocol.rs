// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Encryption-to-shares (E2S).
//!
//! Parties `P_2, ..., P_N` are helpers: they behave like in collective key switching towards
//! the null key, except that each samples a mask `M_i` from Z_t^n, keeps it as its additive
//! share and subtracts `delta * M_i` from the decryption share it discloses.
//!
//! Party `P_1` is the master: it sums the helpers' decryption shares into `c0` and runs an
//! ordinary BFV decryption with its own key share. What comes out is `m - sum(M_i)`, its
//! additive share. The master never discloses a decryption share.

use crate::{
    cks::KeySwitchShareGenerator,
    encoder::DeltaEncoder,
    params::{validate_sigma, ParameterCheck},
    AdditiveShare, DecryptionShare, Error, Result,
};
use fhe::bfv::{BfvParameters, Ciphertext, SecretKey};
use fhe_traits::FheDecrypter;
use rand::{
    distributions::{Distribution, Uniform},
    CryptoRng, RngCore,
};
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Holds the configuration and scratch space shared by both protocol roles.
///
/// Every operation borrows the engine mutably: one engine serves one party at a time, and
/// concurrent parties each need their own instance.
pub struct E2sProtocol {
    par: Arc<BfvParameters>,
    cks: KeySwitchShareGenerator,
    encoder: DeltaEncoder,
    mask_dist: Uniform<u64>,
    check: ParameterCheck,
    zero_dec_share: DecryptionShare,
    zero_add_share: AdditiveShare,
    /// (c0 + sum(h_i), c1) for the master's decryption
    cipher: Ciphertext,
}

impl E2sProtocol {
    pub fn new(par: &Arc<BfvParameters>, sigma_smudging: f64) -> Result<Self> {
        validate_sigma(sigma_smudging)?;
        let cks = KeySwitchShareGenerator::new(par, sigma_smudging)?;
        let encoder = DeltaEncoder::new(par)?;
        Ok(Self {
            par: par.clone(),
            cks,
            encoder,
            mask_dist: Uniform::new(0, par.plaintext()),
            check: ParameterCheck::new(par)?,
            zero_dec_share: DecryptionShare::zero(par)?,
            zero_add_share: AdditiveShare::zero(par.degree(), par.plaintext())?,
            cipher: Ciphertext::zero(par),
        })
    }

    pub fn par(&self) -> &Arc<BfvParameters> {
        &self.par
    }

    pub fn sigma_smudging(&self) -> f64 {
        self.cks.sigma_smudging()
    }

    pub fn allocate_decryption_share(&self) -> DecryptionShare {
        self.zero_dec_share.clone()
    }

    pub fn allocate_additive_share(&self) -> AdditiveShare {
        self.zero_add_share.clone()
    }

    pub fn allocate_shares(&self) -> (DecryptionShare, AdditiveShare) {
        (
            self.allocate_decryption_share(),
            self.allocate_additive_share(),
        )
    }

    /// Helper role: produce the decryption share to disclose and the additive share to keep.
    pub fn generate_shares<R: RngCore + CryptoRng>(
        &mut self,
        sk: &SecretKey,
        ct: &Ciphertext,
        rng: &mut R,
    ) -> Result<(DecryptionShare, AdditiveShare)> {
        let (mut dec_share, mut add_share) = self.allocate_shares();
        self.generate_shares_into(sk, ct, &mut dec_share, &mut add_share, rng)?;
        Ok((dec_share, add_share))
    }

    /// Helper role, writing into caller-allocated shares.
    pub fn generate_shares_into<R: RngCore + CryptoRng>(
        &mut self,
        sk: &SecretKey,
        ct: &Ciphertext,
        dec_share_out: &mut DecryptionShare,
        add_share_out: &mut AdditiveShare,
        rng: &mut R,
    ) -> Result<()> {
        self.check.ciphertext(ct)?;
        self.check.secret_key(sk)?;
        self.check_outputs(dec_share_out, add_share_out)?;

        // h_i = s_i * c1 + e_i
        self.cks
            .generate_share(sk, None, ct, &mut dec_share_out.poly, rng)?;

        // M_i is returned as-is
        let mask: Zeroizing<Vec<u64>> = Zeroizing::new(
            (0..self.par.degree())
                .map(|_| self.mask_dist.sample(rng))
                .collect(),
        );
        add_share_out.set_coefficients(&mask)?;

        // h_i - delta * M_i
        let scaled_mask = self.encoder.encode(add_share_out.coefficients())?;
        dec_share_out.poly -= &*scaled_mask;

        debug!(degree = self.par.degree(), "E2S helper shares generated");
        Ok(())
    }

    /// Master role: derive the master's additive share from the aggregate of every helper's
    /// decryption share.
    pub fn finalize(
        &mut self,
        sk: &SecretKey,
        ct: &Ciphertext,
        aggregated: &DecryptionShare,
    ) -> Result<AdditiveShare> {
        let mut add_share = self.allocate_additive_share();
        self.finalize_into(sk, ct, aggregated, &mut add_share)?;
        Ok(add_share)
    }

    /// Master role, writing into a caller-allocated share.
    pub fn finalize_into(
        &mut self,
        sk: &SecretKey,
        ct: &Ciphertext,
        aggregated: &DecryptionShare,
        add_share_out: &mut AdditiveShare,
    ) -> Result<()> {
        self.check.ciphertext(ct)?;
        self.check.secret_key(sk)?;
        if aggregated.par != self.par {
            return Err(Error::ParametersMismatch);
        }
        self.check_additive(add_share_out)?;

        // ct[0] += sum(h_i)
        self.cipher.c.clone_from(&ct.c);
        self.cipher.level = ct.level;
        self.cipher.c[0] += &aggregated.poly;

        let pt = sk.try_decrypt(&self.cipher)?;
        let coeffs = Zeroizing::new(self.encoder.decode(&pt)?);
        add_share_out.set_coefficients(&coeffs)?;

        info!(degree = self.par.degree(), "E2S master share finalized");
        Ok(())
    }

    fn check_outputs(&self, dec_share: &DecryptionShare, add_share: &AdditiveShare) -> Result<()> {
        if dec_share.par != self.par {
            return Err(Error::ParametersMismatch);
        }
        self.check_additive(add_share)
    }

    fn check_additive(&self, add_share: &AdditiveShare) -> Result<()> {
        if add_share.len() != self.par.degree() {
            return Err(Error::LengthMismatch {
                expected: self.par.degree(),
                actual: add_share.len(),
            });
        }
        if add_share.modulus() != self.par.plaintext() {
            return Err(Error::ModulusMismatch {
                expected: self.par.plaintext(),
                actual: add_share.modulus(),
            });
        }
        Ok(())
    }
}

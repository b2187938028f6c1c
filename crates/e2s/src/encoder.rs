// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Moves integer vectors between Z_t^n and the ciphertext ring R_q.

use crate::{Error, Result};
use fhe::bfv::{BfvParameters, Encoding, Plaintext};
use fhe_math::rq::{traits::TryConvertFrom, Context, Poly, Representation};
use fhe_traits::FheDecoder;
use ndarray::Array2;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Scales plaintext vectors by delta = floor(q / t) into the ciphertext ring and decodes
/// decrypted plaintexts back into Z_t^n.
#[derive(Clone, Debug)]
pub struct DeltaEncoder {
    par: Arc<BfvParameters>,
    ctx: Arc<Context>,
    /// delta reduced modulo each ciphertext modulus
    delta_rns: Vec<u64>,
}

impl DeltaEncoder {
    pub fn new(par: &Arc<BfvParameters>) -> Result<Self> {
        let ctx = par.ctx_at_level(0)?.clone();
        let moduli = par.moduli();
        let q = moduli
            .iter()
            .fold(BigUint::one(), |acc, &qi| acc * BigUint::from(qi));
        let delta = q / BigUint::from(par.plaintext());

        let delta_rns = moduli
            .iter()
            .map(|&qi| {
                (&delta % BigUint::from(qi)).to_u64().ok_or_else(|| {
                    Error::Parameters(format!("delta does not reduce below modulus {qi}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            par: par.clone(),
            ctx,
            delta_rns,
        })
    }

    pub fn delta_rns(&self) -> &[u64] {
        &self.delta_rns
    }

    /// Encode `values` (one per ring coefficient) as `delta * values` in NTT representation.
    pub fn encode(&self, values: &[u64]) -> Result<Zeroizing<Poly>> {
        let degree = self.par.degree();
        if values.len() != degree {
            return Err(Error::LengthMismatch {
                expected: degree,
                actual: values.len(),
            });
        }

        let t = self.par.plaintext();
        let moduli = self.par.moduli();
        let scaled = Array2::from_shape_fn((moduli.len(), degree), |(i, j)| {
            let qi = moduli[i] as u128;
            ((values[j] % t) as u128 * self.delta_rns[i] as u128 % qi) as u64
        });

        let mut poly = Zeroizing::new(Poly::try_convert_from(
            scaled,
            &self.ctx,
            false,
            Representation::PowerBasis,
        )?);
        poly.change_representation(Representation::Ntt);
        Ok(poly)
    }

    /// Decode a poly-encoded plaintext into its coefficients in Z_t^n.
    pub fn decode(&self, pt: &Plaintext) -> Result<Vec<u64>> {
        Ok(Vec::<u64>::try_decode(pt, Encoding::poly())?)
    }
}

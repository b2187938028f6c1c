// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One party's additive share of a plaintext: a vector in Z_t^n.
///
/// The shares of all parties add up, coefficient-wise modulo `t`, to the clear vector (not to
/// its ring encoding). The length is fixed at construction and never changes.
///
/// Deserialized shares go through [`AdditiveShare::new`], and `Debug` never prints the
/// coefficients.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAdditiveShare")]
pub struct AdditiveShare {
    coeffs: Vec<u64>,
    modulus: u64,
}

#[derive(Deserialize)]
struct RawAdditiveShare {
    coeffs: Vec<u64>,
    modulus: u64,
}

impl TryFrom<RawAdditiveShare> for AdditiveShare {
    type Error = Error;

    fn try_from(mut raw: RawAdditiveShare) -> Result<Self> {
        AdditiveShare::new(std::mem::take(&mut raw.coeffs), raw.modulus)
    }
}

impl Drop for RawAdditiveShare {
    fn drop(&mut self) {
        self.coeffs.zeroize();
    }
}

impl AdditiveShare {
    /// Create a share from raw coefficients, reducing them modulo `plaintext_modulus`.
    pub fn new(coeffs: Vec<u64>, plaintext_modulus: u64) -> Result<Self> {
        if plaintext_modulus < 2 {
            return Err(Error::InvalidPlaintextModulus(plaintext_modulus));
        }
        let mut share = Self {
            coeffs,
            modulus: plaintext_modulus,
        };
        share.coeffs.iter_mut().for_each(|c| *c %= plaintext_modulus);
        Ok(share)
    }

    /// A zero share of `len` coefficients.
    pub fn zero(len: usize, plaintext_modulus: u64) -> Result<Self> {
        Self::new(vec![0; len], plaintext_modulus)
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Read-only view of the coefficients.
    pub fn coefficients(&self) -> &[u64] {
        &self.coeffs
    }

    /// Owned copy of the coefficients.
    pub fn to_vec(&self) -> Vec<u64> {
        self.coeffs.clone()
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Overwrite every coefficient. Nothing is written unless the lengths match.
    pub fn set_coefficients(&mut self, coeffs: &[u64]) -> Result<()> {
        self.check_len(coeffs.len())?;
        let t = self.modulus;
        self.coeffs
            .iter_mut()
            .zip(coeffs)
            .for_each(|(dst, src)| *dst = src % t);
        Ok(())
    }

    /// Coefficient-wise sum modulo `t`.
    pub fn sum(&self, other: &AdditiveShare) -> Result<AdditiveShare> {
        let mut out = self.clone();
        out.sum_assign(other)?;
        Ok(out)
    }

    /// In-place coefficient-wise sum modulo `t`. Both operands are validated before any
    /// coefficient is written.
    pub fn sum_assign(&mut self, other: &AdditiveShare) -> Result<()> {
        self.check_compatible(other)?;
        let t = self.modulus as u128;
        self.coeffs
            .iter_mut()
            .zip(&other.coeffs)
            .for_each(|(a, b)| *a = ((*a as u128 + *b as u128) % t) as u64);
        Ok(())
    }

    pub(crate) fn check_compatible(&self, other: &AdditiveShare) -> Result<()> {
        self.check_len(other.len())?;
        if self.modulus != other.modulus {
            return Err(Error::ModulusMismatch {
                expected: self.modulus,
                actual: other.modulus,
            });
        }
        Ok(())
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if self.coeffs.len() != len {
            return Err(Error::LengthMismatch {
                expected: self.coeffs.len(),
                actual: len,
            });
        }
        Ok(())
    }
}

impl PartialEq<[u64]> for AdditiveShare {
    fn eq(&self, other: &[u64]) -> bool {
        self.coeffs.as_slice() == other
    }
}

impl PartialEq<Vec<u64>> for AdditiveShare {
    fn eq(&self, other: &Vec<u64>) -> bool {
        self.coeffs == *other
    }
}

impl fmt::Debug for AdditiveShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdditiveShare")
            .field("len", &self.coeffs.len())
            .field("modulus", &self.modulus)
            .finish_non_exhaustive()
    }
}

impl Zeroize for AdditiveShare {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

impl Drop for AdditiveShare {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for AdditiveShare {}

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Smudging noise used to hide a party's key share inside its decryption share.

use crate::{params::validate_sigma, Error, Result};
use fhe_math::rq::{traits::TryConvertFrom, Context, Poly, Representation};
use rand::{CryptoRng, RngCore};
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use zeroize::{Zeroize, Zeroizing};

/// Samples are truncated at this many standard deviations.
const TAIL_CUT: f64 = 6.0;

/// Largest tail bound whose samples are exact integers in an `f64` and fit an `i64`.
const MAX_BOUND: f64 = (1u64 << 52) as f64;

/// Rounded Gaussian sampler with standard deviation sigma, truncated at 6 sigma.
#[derive(Clone, Debug)]
pub struct SmudgingNoise {
    sigma: f64,
    bound: f64,
    dist: Normal<f64>,
}

impl SmudgingNoise {
    pub fn new(sigma: f64) -> Result<Self> {
        let sigma = validate_sigma(sigma)?;
        let bound = (TAIL_CUT * sigma).ceil();
        if bound > MAX_BOUND {
            return Err(Error::InvalidSmudgingSigma(sigma));
        }
        let dist = Normal::new(0.0, sigma).map_err(|_| Error::InvalidSmudgingSigma(sigma))?;
        Ok(Self { sigma, bound, dist })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Largest absolute value a sample can take.
    pub fn bound(&self) -> i64 {
        self.bound as i64
    }

    /// Sample `size` signed coefficients.
    pub fn sample_vec<R: RngCore + CryptoRng>(&self, size: usize, rng: &mut R) -> Vec<i64> {
        (0..size)
            .map(|_| loop {
                let x = self.dist.sample(rng).round();
                if x.abs() <= self.bound {
                    break x as i64;
                }
            })
            .collect()
    }

    /// Sample a noise polynomial of `degree` coefficients over `ctx`, returned in NTT
    /// representation.
    pub fn sample_poly<R: RngCore + CryptoRng>(
        &self,
        ctx: &Arc<Context>,
        degree: usize,
        rng: &mut R,
    ) -> Result<Zeroizing<Poly>> {
        let mut coeffs = self.sample_vec(degree, rng);
        let poly = Poly::try_convert_from(
            coeffs.as_slice(),
            ctx,
            false,
            Representation::PowerBasis,
        );
        coeffs.zeroize();
        let mut poly = Zeroizing::new(poly?);
        poly.change_representation(Representation::Ntt);
        Ok(poly)
    }
}

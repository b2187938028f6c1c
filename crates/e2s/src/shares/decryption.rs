// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Error, Result};
use fhe::bfv::BfvParameters;
use fhe_math::rq::{Poly, Representation};
use std::{fmt, sync::Arc};

/// A helper's blinded partial decryption, `s_i * c1 + e_i - delta * M_i`, as an element of
/// R_q in NTT representation.
///
/// Only meaningful until it is folded into the aggregate handed to the master.
#[derive(Clone, PartialEq)]
pub struct DecryptionShare {
    pub(crate) par: Arc<BfvParameters>,
    pub(crate) poly: Poly,
}

impl DecryptionShare {
    /// A zero share over the top-level context of `par`.
    pub fn zero(par: &Arc<BfvParameters>) -> Result<Self> {
        let ctx = par.ctx_at_level(0)?;
        Ok(Self {
            par: par.clone(),
            poly: Poly::zero(ctx, Representation::Ntt),
        })
    }

    pub fn par(&self) -> &Arc<BfvParameters> {
        &self.par
    }

    pub fn poly(&self) -> &Poly {
        &self.poly
    }

    /// Ring addition of two shares.
    pub fn aggregate(&self, other: &DecryptionShare) -> Result<DecryptionShare> {
        let mut out = self.clone();
        out.aggregate_assign(other)?;
        Ok(out)
    }

    /// Ring addition written back into `self`.
    pub fn aggregate_assign(&mut self, other: &DecryptionShare) -> Result<()> {
        if self.par != other.par {
            return Err(Error::ParametersMismatch);
        }
        self.poly += &other.poly;
        Ok(())
    }
}

impl fmt::Debug for DecryptionShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionShare")
            .field("degree", &self.par.degree())
            .field("moduli", &self.par.moduli())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::build_bfv_params_arc;
    use fhe_math::rq::traits::TryConvertFrom;

    #[test]
    fn test_debug_hides_polynomial() -> anyhow::Result<()> {
        let par = build_bfv_params_arc(8, 17, &[0xffffee001])?;
        let coeffs: Vec<u64> = (0..8).map(|i| 987_650 + i).collect();
        let poly = Poly::try_convert_from(
            coeffs.as_slice(),
            par.ctx_at_level(0)?,
            false,
            Representation::PowerBasis,
        )?;
        let share = DecryptionShare { par, poly };
        let printed = format!("{:?}", share);
        assert!(printed.starts_with("DecryptionShare"));
        assert!(!printed.contains("98765"));
        Ok(())
    }
}

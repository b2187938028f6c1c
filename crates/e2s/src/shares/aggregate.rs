// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use super::{AdditiveShare, DecryptionShare};
use crate::{Error, Result};

/// Types that can be assembled by folding together shares in any order.
pub trait Aggregate<S>: Sized {
    /// Aggregate the shares of an iterator. Fails on an empty iterator.
    fn from_shares<T>(iter: T) -> Result<Self>
    where
        T: IntoIterator<Item = S>;
}

/// Iterator extension to call `.aggregate()` directly on a sequence of shares.
pub trait AggregateIter<S>: Iterator<Item = S> + Sized {
    fn aggregate<A: Aggregate<S>>(self) -> Result<A> {
        A::from_shares(self)
    }
}

impl<S, I: Iterator<Item = S>> AggregateIter<S> for I {}

impl Aggregate<DecryptionShare> for DecryptionShare {
    fn from_shares<T>(iter: T) -> Result<Self>
    where
        T: IntoIterator<Item = DecryptionShare>,
    {
        let mut shares = iter.into_iter();
        let mut agg = shares.next().ok_or(Error::NoShares)?;
        for share in shares {
            agg.aggregate_assign(&share)?;
        }
        Ok(agg)
    }
}

impl Aggregate<AdditiveShare> for AdditiveShare {
    fn from_shares<T>(iter: T) -> Result<Self>
    where
        T: IntoIterator<Item = AdditiveShare>,
    {
        let mut shares = iter.into_iter();
        let mut agg = shares.next().ok_or(Error::NoShares)?;
        for share in shares {
            agg.sum_assign(&share)?;
        }
        Ok(agg)
    }
}

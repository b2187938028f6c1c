// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod additive;
mod aggregate;
mod decryption;

pub use additive::*;
pub use aggregate::*;
pub use decryption::*;

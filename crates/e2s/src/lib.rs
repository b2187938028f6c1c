// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Encryption-to-shares for multiparty BFV.
//!
//! Converts a ciphertext encrypted under a key shared additively among N parties into N
//! additive secret shares of its plaintext, without ever decrypting it in the clear.

mod accumulator;
mod cks;
mod encoder;
mod errors;
mod noise;
mod params;
mod protocol;
mod shares;

pub use accumulator::*;
pub use cks::*;
pub use encoder::*;
pub use errors::*;
pub use noise::*;
pub use params::{build_bfv_params_arc, validate_ciphertext, validate_ciphertext_context};
pub use protocol::*;
pub use shares::*;

use rand_chacha::ChaCha20Rng;
use std::sync::{Arc, Mutex};

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

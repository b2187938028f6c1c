// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Indicates that an error from the underlying fhe library was encountered.
    #[error("{0}")]
    Fhe(#[from] fhe::Error),

    /// Indicates that an error from the underlying fhe-math library was encountered.
    #[error("{0}")]
    Math(#[from] fhe_math::Error),

    /// Inconsistent parameters that were not caught by the backend.
    #[error("Invalid parameters: {0}")]
    Parameters(String),

    /// The smudging standard deviation must be a finite positive number, small enough for the
    /// noise to stay below half of delta.
    #[error("Invalid smudging standard deviation: {0}")]
    InvalidSmudgingSigma(f64),

    /// Additive shares live in Z_t with t >= 2.
    #[error("Invalid plaintext modulus: {0}")]
    InvalidPlaintextModulus(u64),

    /// Two shares, or a share and a vector, do not have the same number of coefficients.
    #[error("Length mismatch: expected {expected} coefficients, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Two additive shares were reduced modulo different plaintext moduli.
    #[error("Modulus mismatch: expected {expected}, got {actual}")]
    ModulusMismatch { expected: u64, actual: u64 },

    /// A ciphertext, secret key or decryption share was built for different BFV parameters.
    #[error("BFV parameters do not match")]
    ParametersMismatch,

    /// The protocol only accepts degree-1 ciphertexts at level 0.
    #[error("Unsupported ciphertext: {polys} polynomials at level {level}")]
    UnsupportedCiphertext { polys: usize, level: usize },

    /// Aggregation was requested over an empty set of shares.
    #[error("No shares to aggregate")]
    NoShares,

    /// An accumulator needs at least one contributor.
    #[error("An accumulator requires at least one contributor")]
    NoContributors,

    /// A contribution arrived after every expected contribution was folded in.
    #[error("Accumulator has already collected every expected share")]
    AlreadyComplete,

    /// The completed sum was already handed out to a waiter.
    #[error("Accumulated share has already been consumed")]
    AlreadyConsumed,

    /// The collection did not complete in time.
    #[error("Timed out waiting for {remaining} outstanding shares")]
    CollectionTimeout { remaining: usize },

    /// The completion signal fired while contributions were still missing.
    #[error("Collection ended with {remaining} outstanding shares")]
    CollectionIncomplete { remaining: usize },

    /// The completion channel closed before every contribution arrived.
    #[error("Accumulator completion channel closed")]
    CollectionClosed,

    /// The accumulator lock was poisoned by a panicking contributor.
    #[error("Accumulator lock poisoned")]
    LockPoisoned,
}

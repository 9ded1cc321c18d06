// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

///////////////
// Constants //
// ========= //
///////////////

/// See caption for Table 2 at bottom of page 69 in <https://eprint.iacr.org/2021/060.pdf>
/// ELL = 1 * SecParam
/// EPSILON = 2 * SecParam
pub(crate) const ELL: usize = 256;
pub(crate) const EPSILON: usize = 2 * 256;

/// Bit length of each Paillier prime factor. The resulting modulus is
/// `2 * PRIME_BITS` long. 1024-bit factors are the recommended production
/// setting; 512 keeps the pre-generated test pool tractable.
pub(crate) const PRIME_BITS: usize = 512;

/// Fixed serialization width, in bytes, of a natural reduced modulo an RSA
/// modulus of `2 * PRIME_BITS` bits. Used for transcript contributions.
pub(crate) const BYTES_INT_MOD_N: usize = 2 * PRIME_BITS / 8;

/// Output length of the transcript hash, in bytes.
pub(crate) const DIGEST_LENGTH_BYTES: usize = 32;

/// Number of iterations of the Paillier-Blum modulus proof. Each iteration
/// contributes one bit of soundness against a cheating prover.
pub(crate) const MOD_PROOF_ITERATIONS: usize = 80;

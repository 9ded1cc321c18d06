// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Pedersen commitment parameters over an RSA-style modulus.
//!
//! A parameter set `(N, s, t)` serves as auxiliary input to the
//! zero-knowledge range proofs: commitments `s^x t^y mod N` hide the signed
//! secrets `x, y` while the verification relation `s^a t^b = S * T^e` lets a
//! verifier check affine openings without learning them.

use crate::{
    arith::{fill_bytes_be, is_in_unit_group, mod_exp_signed},
    errors::{InternalError, Result},
    hash::DomainWriter,
    parameters::BYTES_INT_MOD_N,
};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Pedersen commitment parameters `(N, s, t)`.
///
/// Validated at construction and immutable afterwards; a value of this type
/// always satisfies `s, t` in the unit group modulo `N` and `s != t`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameters {
    /// The RSA modulus `N`.
    n: BigNumber,
    /// Pedersen parameter `s`.
    s: BigNumber,
    /// Pedersen parameter `t`.
    t: BigNumber,
}

/// Check a candidate parameter triple, and return an error if any of the
/// following is true:
/// - `n`, `s`, or `t` is missing.
/// - `s`, `t` are not in `[1, n-1]`.
/// - `s`, `t` are not coprime to `n`.
/// - `s = t`.
pub fn validate_parameters(
    n: Option<&BigNumber>,
    s: Option<&BigNumber>,
    t: Option<&BigNumber>,
) -> Result<()> {
    let (n, s, t) = match (n, s, t) {
        (Some(n), Some(s), Some(t)) => (n, s, t),
        _ => return Err(InternalError::NilFields),
    };
    // s, t in the unit group mod n
    if !is_in_unit_group(s, n) || !is_in_unit_group(t, n) {
        return Err(InternalError::NotInUnitGroup);
    }
    if s == t {
        return Err(InternalError::SEqualsT);
    }
    Ok(())
}

impl Parameters {
    /// Construct a validated parameter set.
    pub fn new(n: BigNumber, s: BigNumber, t: BigNumber) -> Result<Self> {
        validate_parameters(Some(&n), Some(&s), Some(&t))?;
        Ok(Self { n, s, t })
    }

    /// The modulus `N`.
    pub fn modulus(&self) -> &BigNumber {
        &self.n
    }

    /// The `s` parameter.
    pub fn s(&self) -> &BigNumber {
        &self.s
    }

    /// The `t` parameter.
    pub fn t(&self) -> &BigNumber {
        &self.t
    }

    /// Compute the commitment `s^x * t^y (mod N)`.
    ///
    /// `x` and `y` are signed secret integers; the commitment hides their
    /// values and can be shared.
    pub fn commit(&self, x: &BigNumber, y: &BigNumber) -> Result<BigNumber> {
        let sx = mod_exp_signed(&self.s, x, &self.n)?;
        let ty = mod_exp_signed(&self.t, y, &self.n)?;
        Ok(sx.modmul(&ty, &self.n))
    }

    /// Returns true iff `s^a * t^b = S * T^e (mod N)`.
    ///
    /// Rejects values of `S` or `T` outside the unit group modulo `N`; never
    /// panics on malformed input.
    pub fn verify(
        &self,
        a: &BigNumber,
        b: &BigNumber,
        e: &BigNumber,
        cap_s: &BigNumber,
        cap_t: &BigNumber,
    ) -> bool {
        if !is_in_unit_group(cap_s, &self.n) || !is_in_unit_group(cap_t, &self.n) {
            error!("Pedersen verification on values outside the unit group");
            return false;
        }

        let lhs = match self.commit(a, b) {
            Ok(commitment) => commitment,
            Err(_) => return false,
        };
        let te = match mod_exp_signed(cap_t, e, &self.n) {
            Ok(te) => te,
            Err(_) => return false,
        };
        let rhs = te.modmul(cap_s, &self.n);
        lhs == rhs
    }

    /// Encode as `u16_le(len N) || N || u16_le(len s) || s || u16_le(len t) || t`.
    pub fn marshal_binary(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for field in [&self.n, &self.s, &self.t] {
            let bytes = field.to_bytes();
            let len = u16::try_from(bytes.len()).map_err(|_| InternalError::Serialization)?;
            buf.extend(len.to_le_bytes());
            buf.extend(bytes);
        }
        Ok(buf)
    }

    /// Decode the [`Parameters::marshal_binary`] encoding, re-validating the
    /// triple.
    pub fn unmarshal_binary(data: &[u8]) -> Result<Self> {
        let mut fields = Vec::with_capacity(3);
        let mut rest = data;
        for _ in 0..3 {
            if rest.len() < 2 {
                return Err(InternalError::Serialization);
            }
            let (len_bytes, tail) = rest.split_at(2);
            let len = usize::from(u16::from_le_bytes([len_bytes[0], len_bytes[1]]));
            if tail.len() < len {
                return Err(InternalError::Serialization);
            }
            let (field, tail) = tail.split_at(len);
            fields.push(match field.is_empty() {
                // A zero-length field marks a missing value.
                true => None,
                false => Some(BigNumber::from_slice(field)),
            });
            rest = tail;
        }
        if !rest.is_empty() {
            return Err(InternalError::Serialization);
        }

        validate_parameters(fields[0].as_ref(), fields[1].as_ref(), fields[2].as_ref())?;
        match (fields[0].take(), fields[1].take(), fields[2].take()) {
            (Some(n), Some(s), Some(t)) => Ok(Self { n, s, t }),
            _ => Err(InternalError::NilFields),
        }
    }
}

impl DomainWriter for Parameters {
    fn domain(&self) -> &'static str {
        "Pedersen Parameters"
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        // write N, s, t in fixed width
        for field in [&self.n, &self.s, &self.t] {
            out.extend(fill_bytes_be(field, BYTES_INT_MOD_N)?);
        }
        Ok(())
    }
}

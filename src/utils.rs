// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The curve-point wrapper and conversions between the integer and scalar
//! worlds of the protocol.

use crate::{
    arith::{fill_bytes_be, reduce},
    errors::{InternalError, Result},
};
use generic_array::GenericArray;
use k256::{
    elliptic_curve::{
        bigint::Encoding, group::ff::PrimeField, group::GroupEncoding, AffinePoint, Curve,
    },
    Secp256k1,
};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub(crate) const CRYPTOGRAPHIC_RETRY_MAX: usize = 500usize;

/// Wrapper around k256::ProjectivePoint so that we can define our own
/// serialization/deserialization for it
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct CurvePoint(pub k256::ProjectivePoint);

impl CurvePoint {
    pub(crate) const GENERATOR: Self = CurvePoint(k256::ProjectivePoint::GENERATOR);
    /// The identity point, used to initialize aggregation of curve shares
    pub const IDENTITY: Self = CurvePoint(k256::ProjectivePoint::IDENTITY);

    /// Returns true if this is the identity point.
    pub fn is_identity(&self) -> bool {
        self.0 == k256::ProjectivePoint::IDENTITY
    }

    /// Compressed SEC1 encoding of the point.
    pub(crate) fn to_bytes(self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

impl Default for CurvePoint {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl crate::hash::DomainWriter for CurvePoint {
    fn domain(&self) -> &'static str {
        "Curve Point"
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend(self.to_bytes());
        Ok(())
    }
}

impl From<k256::ProjectivePoint> for CurvePoint {
    fn from(p: k256::ProjectivePoint) -> Self {
        Self(p)
    }
}

impl Serialize for CurvePoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let afp = AffinePoint::<Secp256k1>::from(self.0);
        afp.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CurvePoint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let p = AffinePoint::<Secp256k1>::deserialize(deserializer)?;
        Ok(Self(p.into()))
    }
}

/// The order of the secp256k1 scalar field, as an integer.
pub(crate) fn curve_order() -> BigNumber {
    BigNumber::from_slice(k256::Secp256k1::ORDER.to_be_bytes())
}

/// Map a signed integer into the secp256k1 scalar field.
///
/// The magnitude is reduced modulo the group order and re-encoded through the
/// field's fixed-width representation; a negative input lands on the negated
/// scalar, so `bn_to_scalar(-x) = -bn_to_scalar(x)`.
pub(crate) fn bn_to_scalar(x: &BigNumber) -> Result<k256::Scalar> {
    let negative = x < &BigNumber::zero();
    let magnitude = if negative { -x.clone() } else { x.clone() };

    let reduced = reduce(&magnitude, &curve_order());
    let bytes = fill_bytes_be(&reduced, 32)?;
    let scalar: k256::Scalar =
        Option::from(k256::Scalar::from_repr(GenericArray::clone_from_slice(&bytes)))
            .ok_or(InternalError::CouldNotConvertToScalar)?;

    match negative {
        true => Ok(scalar.negate()),
        false => Ok(scalar),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use super::testing::init_testing;

    #[test]
    fn scalar_conversion_round_trips_through_scalar_bytes() {
        use k256::elliptic_curve::Field;
        let mut rng = init_testing();

        for _ in 0..20 {
            let scalar = k256::Scalar::random(&mut rng);
            let as_int = BigNumber::from_slice(scalar.to_bytes());
            assert_eq!(bn_to_scalar(&as_int).unwrap(), scalar);
        }
    }

    #[test]
    fn scalar_conversion_reduces_and_negates() {
        // q + 1 reduces to 1.
        let above_order = curve_order() + 1;
        assert_eq!(bn_to_scalar(&above_order).unwrap(), k256::Scalar::ONE);

        // Negation commutes with the conversion.
        let mut rng = init_testing();
        let x = sample::plusminus(&mut rng, &(BigNumber::one() << 256));
        let x_scalar = bn_to_scalar(&x).unwrap();
        let neg_scalar = bn_to_scalar(&-x).unwrap();
        assert_eq!(x_scalar + neg_scalar, k256::Scalar::ZERO);
    }
}

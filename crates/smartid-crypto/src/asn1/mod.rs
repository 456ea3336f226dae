//! DER codec for the fixed set of structures the verifier touches.
//!
//! Every schema is a static `der` derive. [`decode`] and [`encode`] map the
//! codec's errors into the crate taxonomy.

mod extensions;
mod ocsp;

pub use extensions::*;
pub use ocsp::*;

use der::asn1::{Any, AnyRef, BitString, ObjectIdentifier};
use der::{Decode, DecodeOwned, Encode, Sequence};
use smartid_core::{Result, SmartIdError};

/// Decodes DER bytes into `T`; trailing bytes are rejected
pub fn decode<T: DecodeOwned>(bytes: &[u8]) -> Result<T> {
    T::from_der(bytes).map_err(|e| SmartIdError::Asn1Decoding(e.to_string()))
}

/// Encodes `value` as DER
pub fn encode<T: Encode>(value: &T) -> Result<Vec<u8>> {
    value
        .to_der()
        .map_err(|e| SmartIdError::Asn1Encoding(e.to_string()))
}

/// ```text
/// AlgorithmIdentifier ::= SEQUENCE {
///     algorithm   OBJECT IDENTIFIER,
///     parameters  ANY DEFINED BY algorithm OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct AlgorithmIdentifier {
    pub algorithm: ObjectIdentifier,
    pub parameters: Option<Any>,
}

impl AlgorithmIdentifier {
    /// Identifier with an explicit NULL parameter, as RSA and SHA-1 expect
    pub fn with_null_parameters(algorithm: ObjectIdentifier) -> Self {
        Self {
            algorithm,
            parameters: Some(Any::from(AnyRef::NULL)),
        }
    }

    /// Parameter decoded as an OID, e.g. the named curve of an EC key
    pub fn parameters_oid(&self) -> Option<ObjectIdentifier> {
        self.parameters
            .as_ref()
            .and_then(|any| any.to_der().ok())
            .and_then(|der| ObjectIdentifier::from_der(&der).ok())
    }
}

/// ```text
/// SubjectPublicKeyInfo ::= SEQUENCE {
///     algorithm         AlgorithmIdentifier,
///     subjectPublicKey  BIT STRING }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SubjectPublicKeyInfo {
    pub algorithm: AlgorithmIdentifier,
    pub subject_public_key: BitString,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn null_parameters_encode_like_openssl() {
        let alg = AlgorithmIdentifier::with_null_parameters(oid::SHA1);
        let der = encode(&alg).unwrap();
        assert_eq!(
            der,
            [0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00]
        );
        let back: AlgorithmIdentifier = decode(&der).unwrap();
        assert_eq!(back, alg);
    }

    #[test]
    fn decode_rejects_garbage_and_trailing_bytes() {
        let err = decode::<AlgorithmIdentifier>(&[0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, SmartIdError::Asn1Decoding(_)));

        let mut der = encode(&AlgorithmIdentifier::with_null_parameters(oid::SHA1)).unwrap();
        der.push(0x00);
        assert!(decode::<AlgorithmIdentifier>(&der).is_err());
    }

    #[test]
    fn parameters_oid_reads_named_curve() {
        let alg = AlgorithmIdentifier {
            algorithm: oid::EC_PUBLIC_KEY,
            parameters: Some(Any::from_der(&oid::SECP256R1.to_der().unwrap()).unwrap()),
        };
        assert_eq!(alg.parameters_oid(), Some(oid::SECP256R1));
    }
}

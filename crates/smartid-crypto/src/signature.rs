//! RSA and ECDSA signature verification.
//!
//! Session signatures are RSA (PKCS#1 v1.5 or PSS with parameters taken from
//! the response). OCSP responses may be signed with RSA or ECDSA.

use base64::{engine::general_purpose::STANDARD, Engine};
use der::oid::AssociatedOid;
use md5::Md5;
use ring::signature::{self as ring_sig, UnparsedPublicKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, Pss, RsaPublicKey};
use sha1::Sha1;
use sha2::digest::{Digest, DynDigest};
use sha2::{Sha224, Sha256, Sha384, Sha512};
use smartid_core::{
    FlowType, HashAlgorithm, InteractionType, Result, SignatureFailure, SignatureParameters,
    SignatureProtocol, SmartIdError,
};
use tracing::{debug, warn};

use crate::asn1::{self, SubjectPublicKeyInfo};
use crate::{hash, oid};

const ACSP_TAG: &str = "smart-id";
const MGF1: &str = "id-mgf1";

/// Inputs of the ACSP v2 canonical payload, in wire order.
#[derive(Debug, Clone, Copy)]
pub struct AcspV2Payload<'a> {
    pub signature_protocol: SignatureProtocol,
    pub server_random: &'a str,
    /// The rpChallenge the session was started with
    pub rp_challenge: &'a [u8],
    pub user_challenge: &'a str,
    pub relying_party_name: &'a str,
    /// Base64 interactions blob as sent
    pub interactions: &'a str,
    pub interaction_type_used: Option<InteractionType>,
    /// Empty when the session had no initial callback URL
    pub initial_callback_url: &'a str,
    pub flow_type: FlowType,
}

impl AcspV2Payload<'_> {
    /// Pipe-joined payload; the empty sixth field is part of the format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let rp_name = STANDARD.encode(self.relying_party_name);
        let interactions_hash = STANDARD.encode(hash::sha256(self.interactions.as_bytes()));
        let interaction_type = self.interaction_type_used.map_or("", InteractionType::as_str);

        let fields: [&[u8]; 11] = [
            ACSP_TAG.as_bytes(),
            self.signature_protocol.as_str().as_bytes(),
            self.server_random.as_bytes(),
            self.rp_challenge,
            self.user_challenge.as_bytes(),
            rp_name.as_bytes(),
            b"",
            interactions_hash.as_bytes(),
            interaction_type.as_bytes(),
            self.initial_callback_url.as_bytes(),
            self.flow_type.as_str().as_bytes(),
        ];
        fields.join(&b'|')
    }
}

/// Verifies session signatures with the end-user certificate key.
///
/// RSASSA-PSS is only accepted with MGF1 over the same digest as the
/// message hash; any other mask generation hash is reported as
/// [`SignatureFailure::UnsupportedAlgorithm`].
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: RsaPublicKey,
}

impl SignatureVerifier {
    /// Loads the RSA key from a DER `SubjectPublicKeyInfo`.
    pub fn from_spki_der(spki: &[u8]) -> Result<Self> {
        let key = rsa_public_key(spki)
            .map_err(|e| SmartIdError::Signature(SignatureFailure::InvalidPublicKey(e.to_string())))?;
        Ok(Self { key })
    }

    /// Decodes the base64 signature value and verifies it over `payload`.
    pub fn verify(&self, params: &SignatureParameters, payload: &[u8]) -> Result<()> {
        let signature = STANDARD.decode(params.value.as_bytes()).map_err(|_| {
            warn!(signature = %params.value, "invalid base64 in signature value");
            SmartIdError::Signature(SignatureFailure::MalformedBase64)
        })?;
        self.verify_bytes(params, &signature, payload)
    }

    /// Verifies raw signature bytes over `payload`.
    pub fn verify_bytes(
        &self,
        params: &SignatureParameters,
        signature: &[u8],
        payload: &[u8],
    ) -> Result<()> {
        let valid = if params.algorithm.is_pss() {
            self.verify_pss(params, signature, payload)?
        } else {
            let digest = match params.algorithm.pkcs1_digest_name() {
                "sha256" => RsaDigest::Sha256,
                "sha384" => RsaDigest::Sha384,
                "sha512" => RsaDigest::Sha512,
                other => return Err(unsupported(other)),
            };
            verify_pkcs1v15(&self.key, digest, payload, signature)
        };

        if valid {
            debug!(algorithm = %params.algorithm, "signature verified");
            Ok(())
        } else {
            warn!(algorithm = %params.algorithm, "signature does not match payload");
            Err(SmartIdError::Signature(SignatureFailure::Mismatch))
        }
    }

    fn verify_pss(&self, params: &SignatureParameters, signature: &[u8], payload: &[u8]) -> Result<bool> {
        if !params.mask_gen_algorithm.eq_ignore_ascii_case(MGF1) {
            return Err(unsupported(&params.mask_gen_algorithm));
        }
        // MGF1 always runs with the signature digest here.
        if params.mask_gen_hash_algorithm != params.hash_algorithm {
            return Err(unsupported(&format!(
                "MGF1 with {} under {}",
                params.mask_gen_hash_algorithm, params.hash_algorithm
            )));
        }
        let salt = params.salt_length;
        Ok(match params.hash_algorithm {
            HashAlgorithm::Sha256 => pss::<Sha256>(&self.key, salt, payload, signature),
            HashAlgorithm::Sha384 => pss::<Sha384>(&self.key, salt, payload, signature),
            HashAlgorithm::Sha512 => pss::<Sha512>(&self.key, salt, payload, signature),
            other => return Err(unsupported(other.as_str())),
        })
    }
}

fn unsupported(what: &str) -> SmartIdError {
    SmartIdError::Signature(SignatureFailure::UnsupportedAlgorithm(what.to_string()))
}

fn pss<D>(key: &RsaPublicKey, salt_len: usize, message: &[u8], signature: &[u8]) -> bool
where
    D: 'static + Digest + DynDigest + Send + Sync,
{
    let hashed = <D as Digest>::digest(message);
    key.verify(Pss::new_with_salt::<D>(salt_len), &hashed, signature)
        .is_ok()
}

/// Digests usable with PKCS#1 v1.5 RSA signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsaDigest {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// Digests usable with ECDSA signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcdsaDigest {
    Sha256,
    Sha384,
}

/// Parses an RSA public key from a DER `SubjectPublicKeyInfo`.
pub fn rsa_public_key(spki: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(spki)
        .map_err(|e| SmartIdError::Certificate(format!("not an RSA public key: {e}")))
}

fn pkcs1<D: Digest + AssociatedOid>(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let hashed = D::digest(message);
    key.verify(Pkcs1v15Sign::new::<D>(), &hashed, signature)
        .is_ok()
}

/// RSASSA-PKCS1-v1_5 verification of `signature` over `message`.
pub fn verify_pkcs1v15(
    key: &RsaPublicKey,
    digest: RsaDigest,
    message: &[u8],
    signature: &[u8],
) -> bool {
    match digest {
        RsaDigest::Md5 => pkcs1::<Md5>(key, message, signature),
        RsaDigest::Sha1 => pkcs1::<Sha1>(key, message, signature),
        RsaDigest::Sha224 => pkcs1::<Sha224>(key, message, signature),
        RsaDigest::Sha256 => pkcs1::<Sha256>(key, message, signature),
        RsaDigest::Sha384 => pkcs1::<Sha384>(key, message, signature),
        RsaDigest::Sha512 => pkcs1::<Sha512>(key, message, signature),
    }
}

/// ECDSA (ASN.1 signature encoding) over P-256 or P-384.
pub fn verify_ecdsa(
    spki: &[u8],
    digest: EcdsaDigest,
    message: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let info: SubjectPublicKeyInfo = asn1::decode(spki)?;
    if info.algorithm.algorithm != oid::EC_PUBLIC_KEY {
        return Err(SmartIdError::Certificate(format!(
            "expected an EC public key, found {}",
            info.algorithm.algorithm
        )));
    }
    let curve = info.algorithm.parameters_oid();
    let algorithm: &'static ring_sig::EcdsaVerificationAlgorithm = match (curve, digest) {
        (Some(c), EcdsaDigest::Sha256) if c == oid::SECP256R1 => &ring_sig::ECDSA_P256_SHA256_ASN1,
        (Some(c), EcdsaDigest::Sha384) if c == oid::SECP256R1 => &ring_sig::ECDSA_P256_SHA384_ASN1,
        (Some(c), EcdsaDigest::Sha256) if c == oid::SECP384R1 => &ring_sig::ECDSA_P384_SHA256_ASN1,
        (Some(c), EcdsaDigest::Sha384) if c == oid::SECP384R1 => &ring_sig::ECDSA_P384_SHA384_ASN1,
        (curve, _) => {
            return Err(SmartIdError::Certificate(format!(
                "unsupported EC curve {curve:?}"
            )))
        }
    };
    let point = info.subject_public_key.raw_bytes();
    Ok(UnparsedPublicKey::new(algorithm, point)
        .verify(message, signature)
        .is_ok())
}

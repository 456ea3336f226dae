use der::asn1::{GeneralizedTime, ObjectIdentifier, Uint};
use der::Encode;
use smartid_core::{Result, SmartIdError};
use smartid_crypto::asn1::{self, BasicOcspResponse, OcspResponseStatus, SingleResponse};
use smartid_crypto::oid;
use smartid_crypto::signature::{rsa_public_key, verify_ecdsa, verify_pkcs1v15, EcdsaDigest, RsaDigest};
use tracing::{debug, warn};

/// Decoded basic OCSP response.
#[derive(Debug, Clone)]
pub struct OcspResponse {
    basic: BasicOcspResponse,
    tbs_der: Vec<u8>,
}

impl OcspResponse {
    /// Accepts only `successful` responses carrying `id-pkix-ocsp-basic`.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let outer: asn1::OcspResponse = asn1::decode(bytes)?;
        if outer.response_status != OcspResponseStatus::Successful {
            return Err(SmartIdError::Ocsp(format!(
                "OCSP response status is \"{}\"",
                outer.response_status.as_str()
            )));
        }
        let response_bytes = outer
            .response_bytes
            .ok_or_else(|| SmartIdError::Ocsp("OCSP response has no responseBytes".into()))?;
        if response_bytes.response_type != oid::OCSP_BASIC_RESPONSE {
            return Err(SmartIdError::Ocsp(format!(
                "Response type {} not supported",
                response_bytes.response_type
            )));
        }

        let basic: BasicOcspResponse = asn1::decode(response_bytes.response.as_bytes())?;
        let tbs_der = asn1::encode(&basic.tbs_response_data)?;
        Ok(Self { basic, tbs_der })
    }

    pub const fn basic(&self) -> &BasicOcspResponse {
        &self.basic
    }

    pub fn produced_at(&self) -> GeneralizedTime {
        self.basic.tbs_response_data.produced_at
    }

    /// The single response about `serial`.
    pub fn single_response(&self, serial: &Uint) -> Result<&SingleResponse> {
        self.basic
            .tbs_response_data
            .responses
            .iter()
            .find(|single| &single.cert_id.serial_number == serial)
            .ok_or_else(|| {
                SmartIdError::Ocsp("OCSP response does not cover the requested certificate".into())
            })
    }

    /// First certificate of `certs`, as DER.
    pub fn responder_certificate(&self) -> Result<Vec<u8>> {
        let cert = self
            .basic
            .certs
            .as_ref()
            .and_then(|certs| certs.first())
            .ok_or_else(|| {
                SmartIdError::Ocsp("OCSP response does not contain a responder certificate".into())
            })?;
        cert.to_der()
            .map_err(|e| SmartIdError::Asn1Encoding(e.to_string()))
    }

    /// DER of `tbsResponseData`, the signed part.
    pub fn signed_data(&self) -> &[u8] {
        &self.tbs_der
    }

    pub fn signature(&self) -> &[u8] {
        self.basic.signature.raw_bytes()
    }

    pub const fn signature_algorithm(&self) -> &ObjectIdentifier {
        &self.basic.signature_algorithm.algorithm
    }

    /// Verifies the response signature with the responder's public key.
    pub fn verify_signature(&self, responder_spki: &[u8]) -> Result<()> {
        let algorithm = *self.signature_algorithm();
        let rsa_digest = match algorithm {
            a if a == oid::MD5_WITH_RSA => Some(RsaDigest::Md5),
            a if a == oid::SHA1_WITH_RSA => Some(RsaDigest::Sha1),
            a if a == oid::SHA224_WITH_RSA => Some(RsaDigest::Sha224),
            a if a == oid::SHA256_WITH_RSA => Some(RsaDigest::Sha256),
            a if a == oid::SHA384_WITH_RSA => Some(RsaDigest::Sha384),
            a if a == oid::SHA512_WITH_RSA => Some(RsaDigest::Sha512),
            _ => None,
        };

        let valid = if let Some(digest) = rsa_digest {
            let key = rsa_public_key(responder_spki).map_err(|e| {
                warn!(error = %e, "unable to extract OCSP responder public key");
                SmartIdError::OcspSignature
            })?;
            verify_pkcs1v15(&key, digest, self.signed_data(), self.signature())
        } else {
            let digest = match algorithm {
                a if a == oid::ECDSA_WITH_SHA256 => EcdsaDigest::Sha256,
                a if a == oid::ECDSA_WITH_SHA384 => EcdsaDigest::Sha384,
                other => {
                    return Err(SmartIdError::Ocsp(format!(
                        "Unsupported signature algorithm: {other}"
                    )))
                }
            };
            verify_ecdsa(responder_spki, digest, self.signed_data(), self.signature()).map_err(
                |e| {
                    warn!(error = %e, "unable to use OCSP responder EC key");
                    SmartIdError::OcspSignature
                },
            )?
        };

        if valid {
            debug!(algorithm = %algorithm, "OCSP response signature verified");
            Ok(())
        } else {
            warn!(algorithm = %algorithm, "OCSP response signature verification failed");
            Err(SmartIdError::OcspSignature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::asn1::{Any, BitString, OctetString};
    use der::Decode;
    use smartid_crypto::asn1::{OcspResponse as RawResponse, ResponseBytes};

    fn wrap(status: OcspResponseStatus, response_type: ObjectIdentifier, inner: &[u8]) -> Vec<u8> {
        asn1::encode(&RawResponse {
            response_status: status,
            response_bytes: Some(ResponseBytes {
                response_type,
                response: OctetString::new(inner.to_vec()).unwrap(),
            }),
        })
        .unwrap()
    }

    #[test]
    fn non_successful_status_is_reported() {
        let der = asn1::encode(&RawResponse {
            response_status: OcspResponseStatus::TryLater,
            response_bytes: None,
        })
        .unwrap();
        let err = OcspResponse::from_der(&der).unwrap_err();
        assert!(matches!(err, SmartIdError::Ocsp(ref msg) if msg.contains("tryLater")));
    }

    #[test]
    fn foreign_response_type_is_rejected() {
        let der = wrap(OcspResponseStatus::Successful, oid::SHA1, &[0x05, 0x00]);
        let err = OcspResponse::from_der(&der).unwrap_err();
        assert!(matches!(err, SmartIdError::Ocsp(ref msg) if msg.contains("not supported")));
    }

    #[test]
    fn garbage_is_a_decoding_error() {
        assert!(matches!(
            OcspResponse::from_der(b"not der"),
            Err(SmartIdError::Asn1Decoding(_))
        ));
        let der = wrap(OcspResponseStatus::Successful, oid::OCSP_BASIC_RESPONSE, &[0x30, 0x00]);
        assert!(matches!(
            OcspResponse::from_der(&der),
            Err(SmartIdError::Asn1Decoding(_))
        ));
    }

    #[test]
    fn unknown_signature_algorithm_is_ocsp_error() {
        use smartid_crypto::asn1::{AlgorithmIdentifier, ResponderId, ResponseData, Version};

        let basic = BasicOcspResponse {
            tbs_response_data: ResponseData {
                version: Version::V1,
                responder_id: ResponderId::ByKey(OctetString::new(vec![1; 20]).unwrap()),
                produced_at: GeneralizedTime::from_unix_duration(std::time::Duration::from_secs(
                    1_700_000_000,
                ))
                .unwrap(),
                responses: Vec::new(),
                response_extensions: None,
            },
            signature_algorithm: AlgorithmIdentifier::with_null_parameters(oid::SHA1),
            signature: BitString::from_bytes(&[0; 8]).unwrap(),
            certs: Some(vec![Any::from_der(&[0x05, 0x00]).unwrap()]),
        };
        let der = wrap(
            OcspResponseStatus::Successful,
            oid::OCSP_BASIC_RESPONSE,
            &asn1::encode(&basic).unwrap(),
        );
        let response = OcspResponse::from_der(&der).unwrap();
        assert_eq!(response.responder_certificate().unwrap(), vec![0x05, 0x00]);
        assert!(response.single_response(&Uint::new(&[1]).unwrap()).is_err());
        assert!(matches!(
            response.verify_signature(&[]),
            Err(SmartIdError::Ocsp(_))
        ));
    }
}

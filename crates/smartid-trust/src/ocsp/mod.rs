//! OCSP revocation checking for Smart-ID end-user certificates.
//!
//! ```text
//! certificate -> AIA OCSP URL + issuer from the trust store
//!             -> build_request() -> OcspTransport::send()
//!             -> OcspResponse::from_der() -> validate_response()
//! ```

mod request;
mod response;

pub use request::{build_request, normalize_serial, serial_to_uint, OcspRequestData};
pub use response::OcspResponse;

use chrono::{DateTime, Utc};
use der::asn1::{GeneralizedTime, Uint};
use smartid_core::{Certificate, Result, SmartIdError};
use smartid_crypto::asn1::CertStatus;
use tracing::{debug, warn};

use crate::bundle::TrustStore;
use crate::certificate::{common_name, ocsp_url, parse_certificate};

/// Accepted distance between the responder clock and ours, in seconds
pub const ALLOWED_TIME_SKEW_SECS: i64 = 300;

/// Delivers a DER OCSP request to a responder and returns the raw reply.
pub trait OcspTransport {
    fn send(&self, url: &str, request_der: &[u8]) -> Result<Vec<u8>>;
}

/// Checks certificate revocation status with the responder named in the
/// certificate.
pub struct RevocationValidator<'a> {
    store: &'a TrustStore,
    transport: &'a dyn OcspTransport,
}

impl<'a> RevocationValidator<'a> {
    pub const fn new(store: &'a TrustStore, transport: &'a dyn OcspTransport) -> Self {
        Self { store, transport }
    }

    pub fn validate_certificate_revocation(&self, certificate: &Certificate) -> Result<()> {
        self.validate_certificate_revocation_at(certificate, Utc::now())
    }

    pub fn validate_certificate_revocation_at(
        &self,
        certificate: &Certificate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let cert = parse_certificate(certificate.der())?;
        let cn = common_name(&cert);

        let url = ocsp_url(&cert)
            .ok_or_else(|| SmartIdError::Ocsp("Certificate does not contain OCSP URL.".into()))?;
        let issuer_der = self.store.find_issuer(&cert).ok_or_else(|| {
            warn!(subject = %cn, "issuer certificate not found in trust store");
            SmartIdError::CertificateChain
        })?;
        let issuer = parse_certificate(issuer_der)?;

        let request = build_request(&cert, &issuer)?;
        debug!(subject = %cn, url = %url, "sending OCSP request");
        let body = self.transport.send(&url, &request.der)?;
        let response = OcspResponse::from_der(&body)?;

        self.validate_response(&response, &request.serial, now)?;
        debug!(subject = %cn, "certificate revocation check passed");
        Ok(())
    }

    /// Status, responder certificate, signature and freshness, in that order.
    pub fn validate_response(
        &self,
        response: &OcspResponse,
        serial: &Uint,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let single = response.single_response(serial)?;
        if !matches!(single.cert_status, CertStatus::Good(_)) {
            warn!(status = single.cert_status.as_str(), "certificate is not in good standing");
            return Err(SmartIdError::OcspCertificateRevocation {
                status: single.cert_status.as_str().to_owned(),
            });
        }

        let responder_der = response.responder_certificate()?;
        let responder = parse_certificate(&responder_der)?;
        self.store.validate_chain_at(&responder_der, now)?;

        let ocsp_signing = matches!(
            responder.extended_key_usage(),
            Ok(Some(eku)) if eku.value.ocsp_signing
        );
        if !ocsp_signing {
            warn!(responder = %common_name(&responder), "responder lacks OCSP signing usage");
            return Err(SmartIdError::OcspKeyUsage);
        }

        response.verify_signature(responder.public_key().raw)?;

        validate_response_time(single.this_update, single.next_update, now)
    }
}

fn unix_seconds(time: GeneralizedTime) -> i64 {
    i64::try_from(time.to_unix_duration().as_secs()).unwrap_or(i64::MAX)
}

/// `thisUpdate` within the skew of `now`, and `now` not past `nextUpdate`
/// plus the skew.
pub fn validate_response_time(
    this_update: GeneralizedTime,
    next_update: Option<GeneralizedTime>,
    now: DateTime<Utc>,
) -> Result<()> {
    let now = now.timestamp();
    let this_update = unix_seconds(this_update);
    if (now - this_update).abs() > ALLOWED_TIME_SKEW_SECS {
        warn!(this_update, now, "OCSP thisUpdate outside the allowed skew");
        return Err(SmartIdError::OcspResponseTime);
    }
    if let Some(next_update) = next_update.map(unix_seconds) {
        if now > next_update.saturating_add(ALLOWED_TIME_SKEW_SECS) {
            warn!(next_update, now, "OCSP response is past nextUpdate");
            return Err(SmartIdError::OcspResponseTime);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, SystemTime};

    use der::asn1::{Any, BitString, Null, OctetString};
    use der::Decode;
    use rsa::pkcs8::DecodePrivateKey;
    use rsa::{Pkcs1v15Sign, RsaPrivateKey};
    use sha2::{Digest, Sha256};
    use smartid_core::CertificateLevel;
    use smartid_crypto::asn1::{
        self, AlgorithmIdentifier, BasicOcspResponse, CertId, OcspRequest, OcspResponseStatus,
        ResponderId, ResponseBytes, ResponseData, RevokedInfo, SingleResponse, Version,
    };
    use smartid_crypto::oid;
    use smartid_crypto::pem::parse_certificates;

    const ROOT: &[u8] = include_bytes!("../../../../testdata/root.pem");
    const INTERMEDIATE: &[u8] = include_bytes!("../../../../testdata/intermediate.pem");
    const AUTH_NEW: &[u8] = include_bytes!("../../../../testdata/auth-new.pem");
    const AUTH_NO_AIA: &[u8] = include_bytes!("../../../../testdata/auth-no-aia.pem");
    const UNTRUSTED: &[u8] = include_bytes!("../../../../testdata/untrusted-auth.pem");
    const RESPONDER: &[u8] = include_bytes!("../../../../testdata/ocsp-responder.pem");
    const RESPONDER_NO_EKU: &[u8] = include_bytes!("../../../../testdata/ocsp-responder-no-eku.pem");
    const RESPONDER_KEY: &str = include_str!("../../../../testdata/responder-key.pem");

    fn der(pem: &[u8]) -> Vec<u8> {
        parse_certificates(pem).unwrap().remove(0)
    }

    fn store() -> TrustStore {
        TrustStore::new(vec![der(ROOT)], vec![der(INTERMEDIATE)])
    }

    fn time(at: SystemTime) -> GeneralizedTime {
        GeneralizedTime::from_system_time(at).unwrap()
    }

    /// Test responder that answers every request with a freshly signed
    /// response for the requested serial.
    struct Responder {
        status: CertStatus,
        certificate: &'static [u8],
        this_update: SystemTime,
        next_update: Option<SystemTime>,
        other_serial: bool,
        tamper: bool,
        seen: Mutex<Vec<String>>,
    }

    impl Responder {
        fn good() -> Self {
            Self {
                status: CertStatus::Good(Null),
                certificate: RESPONDER,
                this_update: SystemTime::now(),
                next_update: Some(SystemTime::now() + Duration::from_secs(3600)),
                other_serial: false,
                tamper: false,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn respond(&self, cert_id: CertId) -> Vec<u8> {
            let mut cert_id = cert_id;
            if self.other_serial {
                cert_id.serial_number = Uint::new(&[0x42]).unwrap();
            }
            let data = ResponseData {
                version: Version::V1,
                responder_id: ResponderId::ByKey(OctetString::new(vec![0x5a; 20]).unwrap()),
                produced_at: time(SystemTime::now()),
                responses: vec![SingleResponse {
                    cert_id,
                    cert_status: self.status.clone(),
                    this_update: time(self.this_update),
                    next_update: self.next_update.map(time),
                    single_extensions: None,
                }],
                response_extensions: None,
            };

            let key = RsaPrivateKey::from_pkcs8_pem(RESPONDER_KEY).unwrap();
            let tbs = asn1::encode(&data).unwrap();
            let mut signature = key
                .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(&tbs))
                .unwrap();
            if self.tamper {
                signature[0] ^= 0xff;
            }

            let basic = BasicOcspResponse {
                tbs_response_data: data,
                signature_algorithm: AlgorithmIdentifier::with_null_parameters(
                    oid::SHA256_WITH_RSA,
                ),
                signature: BitString::from_bytes(&signature).unwrap(),
                certs: Some(vec![Any::from_der(&der(self.certificate)).unwrap()]),
            };
            asn1::encode(&asn1::OcspResponse {
                response_status: OcspResponseStatus::Successful,
                response_bytes: Some(ResponseBytes {
                    response_type: oid::OCSP_BASIC_RESPONSE,
                    response: OctetString::new(asn1::encode(&basic).unwrap()).unwrap(),
                }),
            })
            .unwrap()
        }
    }

    impl OcspTransport for Responder {
        fn send(&self, url: &str, request_der: &[u8]) -> Result<Vec<u8>> {
            self.seen.lock().unwrap().push(url.to_owned());
            let request: OcspRequest = asn1::decode(request_der)?;
            let cert_id = request.tbs_request.request_list[0].req_cert.clone();
            Ok(self.respond(cert_id))
        }
    }

    fn check(responder: &Responder, pem: &[u8]) -> Result<()> {
        let store = store();
        let validator = RevocationValidator::new(&store, responder);
        let cert = Certificate::from_der(&der(pem), CertificateLevel::Qualified).unwrap();
        validator.validate_certificate_revocation(&cert)
    }

    #[test]
    fn good_status_passes() {
        let responder = Responder::good();
        check(&responder, AUTH_NEW).unwrap();
        assert_eq!(
            responder.seen.lock().unwrap().as_slice(),
            ["http://ocsp.test.invalid/"]
        );
    }

    #[test]
    fn revoked_status_fails_even_when_response_is_valid() {
        let responder = Responder {
            status: CertStatus::Revoked(RevokedInfo {
                revocation_time: time(SystemTime::now() - Duration::from_secs(86_400)),
                revocation_reason: None,
            }),
            ..Responder::good()
        };
        let err = check(&responder, AUTH_NEW).unwrap_err();
        assert!(
            matches!(err, SmartIdError::OcspCertificateRevocation { ref status } if status == "revoked")
        );
        assert_eq!(err.to_string(), "OCSP certificate status is not good.");
    }

    #[test]
    fn unknown_status_fails() {
        let responder = Responder {
            status: CertStatus::Unknown(Null),
            ..Responder::good()
        };
        assert!(matches!(
            check(&responder, AUTH_NEW),
            Err(SmartIdError::OcspCertificateRevocation { ref status }) if status == "unknown"
        ));
    }

    #[test]
    fn responder_without_ocsp_signing_fails() {
        let responder = Responder {
            certificate: RESPONDER_NO_EKU,
            ..Responder::good()
        };
        assert!(matches!(
            check(&responder, AUTH_NEW),
            Err(SmartIdError::OcspKeyUsage)
        ));
    }

    #[test]
    fn untrusted_responder_fails_chain_validation() {
        let responder = Responder {
            certificate: UNTRUSTED,
            ..Responder::good()
        };
        assert!(matches!(
            check(&responder, AUTH_NEW),
            Err(SmartIdError::CertificateChain)
        ));
    }

    #[test]
    fn tampered_signature_fails() {
        let responder = Responder {
            tamper: true,
            ..Responder::good()
        };
        assert!(matches!(
            check(&responder, AUTH_NEW),
            Err(SmartIdError::OcspSignature)
        ));
    }

    #[test]
    fn stale_this_update_fails() {
        let responder = Responder {
            this_update: SystemTime::now() - Duration::from_secs(301 + 5),
            ..Responder::good()
        };
        assert!(matches!(
            check(&responder, AUTH_NEW),
            Err(SmartIdError::OcspResponseTime)
        ));
    }

    #[test]
    fn response_for_another_serial_fails() {
        let responder = Responder {
            other_serial: true,
            ..Responder::good()
        };
        assert!(matches!(
            check(&responder, AUTH_NEW),
            Err(SmartIdError::Ocsp(_))
        ));
    }

    #[test]
    fn missing_ocsp_url_fails_before_sending() {
        let responder = Responder::good();
        let err = check(&responder, AUTH_NO_AIA).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OCSP error: Certificate does not contain OCSP URL."
        );
        assert!(responder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_issuer_fails() {
        let responder = Responder::good();
        assert!(matches!(
            check(&responder, UNTRUSTED),
            Err(SmartIdError::CertificateChain)
        ));
        assert!(responder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn time_window_edges() {
        let now = Utc::now();
        let at = |offset: i64| {
            let secs = u64::try_from(now.timestamp() + offset).unwrap();
            GeneralizedTime::from_unix_duration(Duration::from_secs(secs)).unwrap()
        };
        validate_response_time(at(-300), None, now).unwrap();
        validate_response_time(at(300), Some(at(1000)), now).unwrap();
        validate_response_time(at(0), Some(at(-300)), now).unwrap();
        assert!(validate_response_time(at(-301), None, now).is_err());
        assert!(validate_response_time(at(301), None, now).is_err());
        assert!(validate_response_time(at(0), Some(at(-301)), now).is_err());
    }
}

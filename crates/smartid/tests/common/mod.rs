#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use base64::{engine::general_purpose::STANDARD, Engine};
use der::asn1::{Any, BitString, GeneralizedTime, Null, OctetString};
use der::Decode;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use smartid::{OcspTransport, RelyingParty, Result, SmartIdConfig, TrustConfig};
use smartid_crypto::asn1::{
    self, AlgorithmIdentifier, BasicOcspResponse, CertStatus, OcspRequest, OcspResponseStatus,
    ResponderId, ResponseBytes, ResponseData, RevokedInfo, SingleResponse, Version,
};
use smartid_crypto::oid;
use smartid_crypto::pem::parse_certificates;
use tempfile::TempDir;

pub const ROOT: &[u8] = include_bytes!("../../../../testdata/root.pem");
pub const INTERMEDIATE: &[u8] = include_bytes!("../../../../testdata/intermediate.pem");
pub const AUTH_NEW: &[u8] = include_bytes!("../../../../testdata/auth-new.pem");
pub const SIGN_QUALIFIED: &[u8] = include_bytes!("../../../../testdata/sign-qualified.pem");
pub const UNTRUSTED: &[u8] = include_bytes!("../../../../testdata/untrusted-auth.pem");
pub const RESPONDER: &[u8] = include_bytes!("../../../../testdata/ocsp-responder.pem");
const USER_KEY: &str = include_str!("../../../../testdata/user-key.pem");
const RESPONDER_KEY: &str = include_str!("../../../../testdata/responder-key.pem");

pub const RP_UUID: &str = "00000000-0000-4000-8000-000000000000";
pub const RP_NAME: &str = "DEMO";
pub const SESSION_SECRET: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
pub const SESSION_SECRET_DIGEST: &str = "PrG9Q5lH63YpmOVmzMLgmceREYsvQFecxPfaK1Bht_k";
pub const USER_CHALLENGE_VERIFIER: &str = "verifier-123";
pub const USER_CHALLENGE: &str = "Ds3NpaREu9I2EYq6l0l3ZkFyv_Gt5O4EpGD6cZlY0Kg";

pub fn der(pem: &[u8]) -> Vec<u8> {
    parse_certificates(pem).unwrap().remove(0)
}

pub fn cert_value(pem: &[u8]) -> String {
    STANDARD.encode(der(pem))
}

/// Trust folder holding the test root and intermediate, plus a cache dir.
pub struct TrustFixture {
    _dir: TempDir,
    pub certificates: PathBuf,
    pub cache: PathBuf,
}

impl TrustFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let certificates = dir.path().join("trusted");
        std::fs::create_dir(&certificates).unwrap();
        std::fs::write(certificates.join("root.pem"), ROOT).unwrap();
        std::fs::write(certificates.join("intermediate.pem"), INTERMEDIATE).unwrap();
        let cache = dir.path().join("cache");
        Self {
            _dir: dir,
            certificates,
            cache,
        }
    }

    pub fn config(&self) -> SmartIdConfig {
        SmartIdConfig::new(
            RP_UUID,
            RP_NAME,
            TrustConfig::mixed(&self.certificates).with_cache_dir(&self.cache),
        )
        .unwrap()
    }

    pub fn relying_party(&self) -> RelyingParty {
        RelyingParty::new(self.config()).unwrap()
    }

    pub fn bundle_dirs(&self) -> Vec<PathBuf> {
        list_dirs(&self.cache)
    }
}

pub fn list_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

/// PKCS#1 v1.5 SHA-256 signature by the test user key, base64.
pub fn sign_as_user(payload: &[u8]) -> String {
    let key = RsaPrivateKey::from_pkcs8_pem(USER_KEY).unwrap();
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(payload))
        .unwrap();
    STANDARD.encode(signature)
}

fn signature_parameters() -> Value {
    json!({
        "hashAlgorithm": "SHA-256",
        "maskGenAlgorithm": {"algorithm": "id-mgf1", "parameters": {"hashAlgorithm": "SHA-256"}},
        "saltLength": 32,
        "trailerField": "0xbc"
    })
}

/// OK authentication session body.
pub fn auth_session_json(cert_pem: &[u8], signature: &str, server_random: &str) -> String {
    json!({
        "state": "COMPLETE",
        "result": {"endResult": "OK", "documentNumber": "PNOEE-30303039914-MOCK-Q"},
        "signatureProtocol": "ACSP_V2",
        "signature": {
            "value": signature,
            "serverRandom": server_random,
            "userChallenge": USER_CHALLENGE,
            "flowType": "Web2App",
            "signatureAlgorithm": "sha256WithRSAEncryption",
            "signatureAlgorithmParameters": signature_parameters()
        },
        "cert": {"value": cert_value(cert_pem), "certificateLevel": "QUALIFIED"},
        "interactionTypeUsed": "displayTextAndPIN",
        "deviceIpAddress": "198.51.100.7"
    })
    .to_string()
}

/// OK signing session body.
pub fn signing_session_json(cert_pem: &[u8], signature: &str) -> String {
    json!({
        "state": "COMPLETE",
        "result": {"endResult": "OK", "documentNumber": "PNOEE-30303039914-MOCK-Q"},
        "signatureProtocol": "RAW_DIGEST_SIGNATURE",
        "signature": {
            "value": signature,
            "flowType": "QR",
            "signatureAlgorithm": "sha256WithRSAEncryption",
            "signatureAlgorithmParameters": signature_parameters()
        },
        "cert": {"value": cert_value(cert_pem), "certificateLevel": "QUALIFIED"}
    })
    .to_string()
}

fn time(at: SystemTime) -> GeneralizedTime {
    GeneralizedTime::from_system_time(at).unwrap()
}

/// OCSP responder stand-in that signs a fresh answer for whatever serial is
/// asked about.
pub struct FakeResponder {
    revoked: bool,
    requests: Mutex<Vec<String>>,
}

impl FakeResponder {
    pub fn good() -> Self {
        Self {
            revoked: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn revoked() -> Self {
        Self {
            revoked: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl OcspTransport for FakeResponder {
    fn send(&self, url: &str, request_der: &[u8]) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_owned());
        let request: OcspRequest = asn1::decode(request_der)?;
        let cert_id = request.tbs_request.request_list[0].req_cert.clone();
        let now = SystemTime::now();

        let cert_status = if self.revoked {
            CertStatus::Revoked(RevokedInfo {
                revocation_time: time(now - Duration::from_secs(3600)),
                revocation_reason: None,
            })
        } else {
            CertStatus::Good(Null)
        };
        let data = ResponseData {
            version: Version::V1,
            responder_id: ResponderId::ByKey(OctetString::new(vec![0x5a; 20]).unwrap()),
            produced_at: time(now),
            responses: vec![SingleResponse {
                cert_id,
                cert_status,
                this_update: time(now),
                next_update: Some(time(now + Duration::from_secs(3600))),
                single_extensions: None,
            }],
            response_extensions: None,
        };

        let key = RsaPrivateKey::from_pkcs8_pem(RESPONDER_KEY).unwrap();
        let tbs = asn1::encode(&data)?;
        let signature = key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(&tbs))
            .unwrap();
        let basic = BasicOcspResponse {
            tbs_response_data: data,
            signature_algorithm: AlgorithmIdentifier::with_null_parameters(oid::SHA256_WITH_RSA),
            signature: BitString::from_bytes(&signature).unwrap(),
            certs: Some(vec![Any::from_der(&der(RESPONDER)).unwrap()]),
        };
        asn1::encode(&asn1::OcspResponse {
            response_status: OcspResponseStatus::Successful,
            response_bytes: Some(ResponseBytes {
                response_type: oid::OCSP_BASIC_RESPONSE,
                response: OctetString::new(asn1::encode(&basic)?).unwrap(),
            }),
        })
    }
}

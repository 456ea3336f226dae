//! Trust bundles built from folders of CA certificates.
//!
//! A folder (or a CA/intermediate folder pair) is classified into a root
//! bundle `ca.pem` and an intermediate bundle `int.pem`, cached under
//! `<cache_dir>/<content hash>/`. Bundles are assembled in a staging
//! directory and renamed into place, so readers never see a partial bundle.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use smartid_core::{Result, SmartIdError};
use smartid_crypto::hash::{sha256_file, sha256_hex};
use smartid_crypto::pem::{der_to_pem, parse_certificates};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::certificate::{is_ca, parse_certificate};

pub const CA_BUNDLE_FILENAME: &str = "ca.pem";
pub const INT_BUNDLE_FILENAME: &str = "int.pem";

const CACHE_DIR_NAME: &str = "smart-id-cert-bundles";
const STAGING_PREFIX: &str = ".staging-";
/// Staging directories older than this were left by an interrupted build.
const STALE_STAGING_AGE: Duration = Duration::from_secs(3600);

/// `<system temp>/smart-id-cert-bundles`
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join(CACHE_DIR_NAME)
}

/// Where trusted certificates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateSource {
    /// One folder; roots are told apart from intermediates automatically
    Mixed(PathBuf),
    /// Roots and intermediates in their own folders
    Separated { ca: PathBuf, intermediate: PathBuf },
}

impl CertificateSource {
    fn folders(&self) -> Vec<&Path> {
        match self {
            Self::Mixed(folder) => vec![folder],
            Self::Separated { ca, intermediate } => vec![ca, intermediate],
        }
    }
}

/// Regular files directly inside `dir`, sorted by name.
fn folder_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| SmartIdError::io(dir, e.into()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Content hash over every file in `folders`.
///
/// Per-file SHA-256 digests are sorted before hashing, so the result does
/// not depend on file names, order or modification times.
pub fn compute_folder_hash(folders: &[&Path]) -> Result<String> {
    let mut digests = Vec::new();
    for folder in folders {
        for file in folder_files(folder)? {
            digests.push(sha256_file(&file)?);
        }
    }
    digests.sort();
    let hash = sha256_hex(digests.concat().as_bytes());
    debug!(hash = %hash, "computed certificate folder hash");
    Ok(hash)
}

/// Builds (or reuses) the cached bundles for a certificate source.
#[derive(Debug, Clone)]
pub struct TrustBundleBuilder {
    source: CertificateSource,
    cache_dir: PathBuf,
}

impl TrustBundleBuilder {
    pub fn new(source: CertificateSource) -> Self {
        Self {
            source,
            cache_dir: default_cache_dir(),
        }
    }

    pub fn mixed(folder: impl Into<PathBuf>) -> Self {
        Self::new(CertificateSource::Mixed(folder.into()))
    }

    pub fn separated(ca: impl Into<PathBuf>, intermediate: impl Into<PathBuf>) -> Self {
        Self::new(CertificateSource::Separated {
            ca: ca.into(),
            intermediate: intermediate.into(),
        })
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub const fn source(&self) -> &CertificateSource {
        &self.source
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the trust store for the current folder contents, building the
    /// bundles only when no cache entry exists for their hash.
    pub fn build(&self) -> Result<TrustStore> {
        for folder in self.source.folders() {
            if !folder.is_dir() {
                return Err(SmartIdError::Config(format!(
                    "Certificate folder not found: {}",
                    folder.display()
                )));
            }
        }

        let hash = compute_folder_hash(&self.source.folders())?;
        fs::create_dir_all(&self.cache_dir).map_err(|e| SmartIdError::io(&self.cache_dir, e))?;
        let target = self.cache_dir.join(&hash);

        if is_complete_bundle(&target) {
            debug!(hash = %hash, "using cached certificate bundles");
        } else {
            let (roots, intermediates) = self.classify()?;
            self.publish(&target, &roots, &intermediates)?;
            info!(
                hash = %hash,
                roots = roots.len(),
                intermediates = intermediates.len(),
                "built certificate bundles"
            );
        }

        self.prune(&hash);
        TrustStore::load(&target)
    }

    fn classify(&self) -> Result<(Vec<Vec<u8>>, Vec<Vec<u8>>)> {
        match &self.source {
            CertificateSource::Mixed(folder) => {
                let mut roots = Vec::new();
                let mut intermediates = Vec::new();
                for (path, der) in read_ca_folder(folder)? {
                    if is_self_signed(&der)? {
                        debug!(path = %path.display(), "classified as root");
                        roots.push(der);
                    } else {
                        debug!(path = %path.display(), "classified as intermediate");
                        intermediates.push(der);
                    }
                }
                Ok((roots, intermediates))
            }
            CertificateSource::Separated { ca, intermediate } => {
                let roots: Vec<Vec<u8>> = read_ca_folder(ca)?.into_iter().map(|(_, der)| der).collect();
                let mut intermediates = Vec::new();
                for (path, der) in read_ca_folder(intermediate)? {
                    if roots.contains(&der) {
                        return Err(SmartIdError::TrustStore(format!(
                            "{} is present in both the CA and intermediate folders.",
                            path.display()
                        )));
                    }
                    intermediates.push(der);
                }
                Ok((roots, intermediates))
            }
        }
    }

    /// Writes both bundles into a staging directory and renames it to `target`.
    fn publish(&self, target: &Path, roots: &[Vec<u8>], intermediates: &[Vec<u8>]) -> Result<()> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.cache_dir)
            .map_err(|e| SmartIdError::io(&self.cache_dir, e))?;

        write_bundle(&staging.path().join(CA_BUNDLE_FILENAME), roots)?;
        write_bundle(&staging.path().join(INT_BUNDLE_FILENAME), intermediates)?;

        match fs::rename(staging.path(), target) {
            Ok(()) => Ok(()),
            // Another process published the same content first.
            Err(_) if is_complete_bundle(target) => {
                debug!(target = %target.display(), "bundle published concurrently");
                Ok(())
            }
            Err(e) => Err(SmartIdError::io(target, e)),
        }
    }

    /// Removes bundle directories of other hashes and abandoned staging
    /// directories. Anything else in the cache dir is left alone.
    fn prune(&self, current_hash: &str) {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == current_hash || !path.is_dir() {
                continue;
            }
            let removable = if is_bundle_hash(&name) {
                true
            } else if name.starts_with(STAGING_PREFIX) {
                is_older_than(&path, STALE_STAGING_AGE)
            } else {
                false
            };
            if !removable {
                continue;
            }
            match fs::remove_dir_all(&path) {
                Ok(()) => debug!(dir = %name, "removed stale certificate bundle"),
                Err(e) => warn!(dir = %name, error = %e, "failed to remove stale certificate bundle"),
            }
        }
    }
}

/// Bundle directories are named by the lowercase hex SHA-256 folder hash.
fn is_bundle_hash(name: &str) -> bool {
    name.len() == 64 && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_older_than(path: &Path, age: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|elapsed| elapsed > age)
}

fn is_complete_bundle(dir: &Path) -> bool {
    dir.join(CA_BUNDLE_FILENAME).is_file() && dir.join(INT_BUNDLE_FILENAME).is_file()
}

/// Every certificate in every file of `folder`; each must be a CA.
fn read_ca_folder(folder: &Path) -> Result<Vec<(PathBuf, Vec<u8>)>> {
    let mut certs = Vec::new();
    for path in folder_files(folder)? {
        let data = fs::read(&path).map_err(|e| SmartIdError::io(&path, e))?;
        let ders = parse_certificates(&data).unwrap_or_default();
        if ders.is_empty() {
            return Err(SmartIdError::TrustStore(format!(
                "{} is not a valid PEM certificate.",
                path.display()
            )));
        }
        for der in ders {
            let cert = parse_certificate(&der).map_err(|_| {
                SmartIdError::TrustStore(format!("{} is not a valid PEM certificate.", path.display()))
            })?;
            if !is_ca(&cert) {
                return Err(SmartIdError::TrustStore(format!(
                    "{} is not a certificate authority.",
                    path.display()
                )));
            }
            certs.push((path.clone(), der));
        }
    }
    Ok(certs)
}

/// Subject equals issuer and the certificate verifies with its own key.
fn is_self_signed(der: &[u8]) -> Result<bool> {
    let cert = parse_certificate(der)?;
    let self_issued = cert.subject().as_raw() == cert.issuer().as_raw();
    Ok(self_issued && cert.verify_signature(None).is_ok())
}

fn write_bundle(path: &Path, certs: &[Vec<u8>]) -> Result<()> {
    let pem: String = certs.iter().map(|der| der_to_pem(der)).collect();
    fs::write(path, pem).map_err(|e| SmartIdError::io(path, e))
}

fn read_bundle(path: &Path) -> Result<Vec<Vec<u8>>> {
    let data = fs::read(path).map_err(|e| SmartIdError::io(path, e))?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    parse_certificates(&data)
}

/// Trusted roots and intermediates, as DER.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    bundle_dir: Option<PathBuf>,
    roots: Vec<Vec<u8>>,
    intermediates: Vec<Vec<u8>>,
}

impl TrustStore {
    /// In-memory store, not backed by bundle files.
    pub fn new(roots: Vec<Vec<u8>>, intermediates: Vec<Vec<u8>>) -> Self {
        Self {
            bundle_dir: None,
            roots,
            intermediates,
        }
    }

    /// Opens an existing `<hash>` bundle directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let roots = read_bundle(&dir.join(CA_BUNDLE_FILENAME))?;
        let intermediates = read_bundle(&dir.join(INT_BUNDLE_FILENAME))?;
        debug!(
            dir = %dir.display(),
            roots = roots.len(),
            intermediates = intermediates.len(),
            "loaded trust store"
        );
        Ok(Self {
            bundle_dir: Some(dir.to_path_buf()),
            roots,
            intermediates,
        })
    }

    pub fn bundle_dir(&self) -> Option<&Path> {
        self.bundle_dir.as_deref()
    }

    pub fn ca_bundle_path(&self) -> Option<PathBuf> {
        self.bundle_dir.as_ref().map(|dir| dir.join(CA_BUNDLE_FILENAME))
    }

    pub fn int_bundle_path(&self) -> Option<PathBuf> {
        self.bundle_dir.as_ref().map(|dir| dir.join(INT_BUNDLE_FILENAME))
    }

    pub fn roots(&self) -> &[Vec<u8>] {
        &self.roots
    }

    pub fn intermediates(&self) -> &[Vec<u8>] {
        &self.intermediates
    }
}

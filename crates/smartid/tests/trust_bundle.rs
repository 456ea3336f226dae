mod common;

use common::*;
use smartid::{compute_folder_hash, RelyingParty, SmartIdConfig, TrustConfig};

#[test]
fn second_setup_reuses_the_cached_bundle() {
    let fixture = TrustFixture::new();

    let first = fixture.relying_party();
    let ca_bundle = first.trust_store().ca_bundle_path().unwrap();
    let bytes = std::fs::read(&ca_bundle).unwrap();
    let modified = std::fs::metadata(&ca_bundle).unwrap().modified().unwrap();

    let second = fixture.relying_party();
    assert_eq!(fixture.bundle_dirs().len(), 1);
    assert_eq!(second.trust_store().bundle_dir(), first.trust_store().bundle_dir());
    assert_eq!(std::fs::read(&ca_bundle).unwrap(), bytes);
    assert_eq!(
        std::fs::metadata(&ca_bundle).unwrap().modified().unwrap(),
        modified
    );
    assert_eq!(second.trust_store().roots(), [der(ROOT)]);
    assert_eq!(second.trust_store().intermediates(), [der(INTERMEDIATE)]);
}

#[test]
fn changed_folder_gets_a_new_bundle() {
    let fixture = TrustFixture::new();
    let before = fixture.relying_party();

    std::fs::remove_file(fixture.certificates.join("intermediate.pem")).unwrap();
    let after = fixture.relying_party();

    let hash = compute_folder_hash(&[fixture.certificates.as_path()]).unwrap();
    assert_eq!(fixture.bundle_dirs(), [fixture.cache.join(hash)]);
    assert_ne!(before.trust_store().bundle_dir(), after.trust_store().bundle_dir());
    assert!(after.trust_store().intermediates().is_empty());
}

#[test]
fn separated_folders_from_toml() {
    let fixture = TrustFixture::new();
    let dir = tempfile::tempdir().unwrap();
    let ca = dir.path().join("ca");
    let int = dir.path().join("int");
    std::fs::create_dir(&ca).unwrap();
    std::fs::create_dir(&int).unwrap();
    std::fs::write(ca.join("root.pem"), ROOT).unwrap();
    std::fs::write(int.join("intermediate.pem"), INTERMEDIATE).unwrap();

    let toml = format!(
        r#"
relying_party_uuid = "{RP_UUID}"
relying_party_name = "{RP_NAME}"

[trust]
ca_path = "{}"
int_path = "{}"
cache_dir = "{}"
"#,
        ca.display(),
        int.display(),
        fixture.cache.display()
    );
    let rp = RelyingParty::new(SmartIdConfig::from_toml(&toml).unwrap()).unwrap();
    assert_eq!(rp.trust_store().roots(), [der(ROOT)]);
    assert_eq!(rp.trust_store().intermediates(), [der(INTERMEDIATE)]);
}

#[test]
fn certificate_in_the_wrong_folder_fails_setup() {
    let dir = tempfile::tempdir().unwrap();
    let ca = dir.path().join("ca");
    let int = dir.path().join("int");
    std::fs::create_dir(&ca).unwrap();
    std::fs::create_dir(&int).unwrap();
    std::fs::write(ca.join("leaf.pem"), AUTH_NEW).unwrap();
    std::fs::write(int.join("intermediate.pem"), INTERMEDIATE).unwrap();

    let config = SmartIdConfig::new(
        RP_UUID,
        RP_NAME,
        TrustConfig::separated(&ca, &int).with_cache_dir(dir.path().join("cache")),
    )
    .unwrap();
    assert!(RelyingParty::new(config).is_err());
}

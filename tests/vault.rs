//! Vault reader tests through the public library API.

mod support;
use support::*;

use std::collections::BTreeMap;

use esec::core::keyring::Keyring;
use esec::core::types::Sources;
use esec::error::{Error, KeyError, VaultError};
use esec::{decrypt_from_vault, Format, KeyPair, Secrets, Vault};
use serde_json::json;

fn sources(pairs: &[(&str, &str)]) -> Sources {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_each_environment_uses_its_own_key() {
    let t = Test::new();
    let dev = KeyPair::generate();
    let prod = KeyPair::generate();
    t.write(".env.dev", &format!("ESEC_PUBLIC_KEY={}\nAPI_KEY=dev-key\n", dev.public));
    t.write(".env.prod", &format!("ESEC_PUBLIC_KEY={}\nAPI_KEY=prod-key\n", prod.public));

    let vault = Vault::open(t.dir.path());
    assert_eq!(vault.encrypt("dev", Format::Env).unwrap(), 1);
    assert_eq!(vault.encrypt("prod", Format::Env).unwrap(), 1);

    let keys = sources(&[
        ("ESEC_PRIVATE_KEY_DEV", dev.private.to_hex().as_str()),
        ("ESEC_PRIVATE_KEY_PROD", prod.private.to_hex().as_str()),
    ]);

    let dev_secrets = decrypt_from_vault(&vault, "dev", Format::Env, &keys).unwrap();
    let prod_secrets = decrypt_from_vault(&vault, "prod", Format::Env, &keys).unwrap();
    assert_eq!(dev_secrets.get("API_KEY"), Some("dev-key"));
    assert_eq!(prod_secrets.get("API_KEY"), Some("prod-key"));
}

#[test]
fn test_lowercase_suffix_maps_to_uppercase_variable() {
    let t = Test::new();
    let pair = KeyPair::generate();
    t.write(".env.staging", &format!("ESEC_PUBLIC_KEY={}\nTOKEN=abc\n", pair.public));

    let vault = Vault::open(t.dir.path());
    vault.encrypt("staging", Format::Env).unwrap();

    let keys = sources(&[("ESEC_PRIVATE_KEY_STAGING", pair.private.to_hex().as_str())]);
    let secrets = vault.decrypt("staging", Format::Env, &keys).unwrap();
    assert_eq!(secrets.get("TOKEN"), Some("abc"));
}

#[test]
fn test_ambiguous_keys_fail_before_opening_anything() {
    let t = Test::new();
    let pair = KeyPair::generate();
    t.write(".env.dev", &format!("ESEC_PUBLIC_KEY={}\nA=1\n", pair.public));
    let vault = Vault::open(t.dir.path());
    vault.encrypt("dev", Format::Env).unwrap();

    let hex = pair.private.to_hex();
    let keys = sources(&[("ESEC_PRIVATE_KEY", hex.as_str()), ("ESEC_PRIVATE_KEY_DEV", hex.as_str())]);

    match vault.decrypt("dev", Format::Env, &keys) {
        Err(Error::Key(KeyError::AmbiguousKeys(names))) => {
            assert_eq!(names, vec!["ESEC_PRIVATE_KEY", "ESEC_PRIVATE_KEY_DEV"]);
        }
        other => panic!("expected AmbiguousKeys, got {other:?}"),
    }
}

#[test]
fn test_ambiguity_is_not_resolved_by_keyring() {
    let t = Test::new();
    let pair = KeyPair::generate();
    t.write(".env", &format!("ESEC_PUBLIC_KEY={}\nA=1\n", pair.public));
    let vault = Vault::open(t.dir.path());
    vault.encrypt("", Format::Env).unwrap();
    vault.keyring().store("ESEC_PRIVATE_KEY", &pair.private).unwrap();

    let other = KeyPair::generate().private.to_hex();
    let keys = sources(&[("ESEC_PRIVATE_KEY", other.as_str()), ("ESEC_PRIVATE_KEYS", other.as_str())]);

    assert!(matches!(
        vault.decrypt("", Format::Env, &keys),
        Err(Error::Key(KeyError::AmbiguousKeys(_)))
    ));
}

#[test]
fn test_keyring_serves_when_environment_is_empty() {
    let t = Test::new();
    let pair = KeyPair::generate();
    t.write(".ejson", &format!(r#"{{"_ESEC_PUBLIC_KEY": "{}", "token": "t0k"}}"#, pair.public));

    let vault = Vault::open(t.dir.path());
    vault.encrypt("", Format::Json).unwrap();
    Keyring::in_dir(t.dir.path())
        .store("ESEC_PRIVATE_KEY", &pair.private)
        .unwrap();

    let secrets = vault.decrypt("", Format::Json, &Sources::new()).unwrap();
    assert_eq!(secrets.get("token"), Some("t0k"));
}

#[test]
fn test_no_key_reports_keyring_path() {
    let t = Test::new();
    let pair = KeyPair::generate();
    t.write(".env", &format!("ESEC_PUBLIC_KEY={}\nA=1\n", pair.public));

    let vault = Vault::open(t.dir.path());
    match vault.decrypt("", Format::Env, &Sources::new()) {
        Err(Error::Key(KeyError::NoKeyFound { checked, keyring })) => {
            assert_eq!(checked, vec!["ESEC_PRIVATE_KEY", "ESEC_PRIVATE_KEYS"]);
            assert_eq!(keyring, Some(t.path(".esec-keyring")));
        }
        other => panic!("expected NoKeyFound, got {other:?}"),
    }
}

#[test]
fn test_json_blob_keeps_structure() {
    let t = Test::new();
    let pair = KeyPair::generate();
    let doc = json!({
        "_ESEC_PUBLIC_KEY": pair.public.to_hex(),
        "_comment": "left alone",
        "database": { "password": "hunter2", "port": 5432 },
        "tokens": ["a", "b"],
    });
    t.write(".ejson", &doc.to_string());

    let vault = Vault::open(t.dir.path());
    assert_eq!(vault.encrypt("", Format::Json).unwrap(), 3);

    let on_disk: serde_json::Value = serde_json::from_str(&t.read(".ejson")).unwrap();
    assert_eq!(on_disk["_comment"], "left alone");
    assert_eq!(on_disk["database"]["port"], 5432);
    assert!(on_disk["database"]["password"]
        .as_str()
        .unwrap()
        .starts_with("ESEC[1:"));

    let keys = sources(&[("ESEC_PRIVATE_KEY", pair.private.to_hex().as_str())]);
    let secrets = vault.decrypt("", Format::Json, &keys).unwrap();
    assert_eq!(secrets, Secrets::Nested(doc));
}

#[test]
fn test_toml_blob_round_trips() {
    let t = Test::new();
    let pair = KeyPair::generate();
    t.write(
        ".etoml",
        &format!(
            "_ESEC_PUBLIC_KEY = \"{}\"\n\n[smtp]\nuser = \"mailer\"\npassword = \"s3cret\"\n",
            pair.public
        ),
    );

    let vault = Vault::open(t.dir.path());
    assert_eq!(vault.encrypt("", Format::Toml).unwrap(), 2);
    assert!(!t.read(".etoml").contains("s3cret"));

    let keys = sources(&[("ESEC_PRIVATE_KEYS", pair.private.to_hex().as_str())]);
    let secrets = vault.decrypt("", Format::Toml, &keys).unwrap();
    let rendered = secrets.render(Format::Toml).unwrap();
    assert!(rendered.contains("password = \"s3cret\""));
}

#[test]
fn test_flat_decrypt_matches_plaintext() {
    let t = Test::new();
    let pair = KeyPair::generate();
    t.write(".env", &env_blob(&pair.public.to_hex()));

    let vault = Vault::open(t.dir.path());
    assert_eq!(vault.encrypt("", Format::Env).unwrap(), STANDARD_SECRETS.len());

    let keys = sources(&[("ESEC_PRIVATE_KEY", pair.private.to_hex().as_str())]);
    let Secrets::Flat(map) = vault.decrypt("", Format::Env, &keys).unwrap() else {
        panic!("env blobs decrypt to flat secrets");
    };

    let expected: BTreeMap<String, String> = STANDARD_SECRETS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .chain([("ESEC_PUBLIC_KEY".to_string(), pair.public.to_hex())])
        .collect();
    assert_eq!(map, expected);
}

#[test]
fn test_missing_entry_for_environment() {
    let t = Test::new();
    let vault = Vault::open(t.dir.path());

    match vault.decrypt("qa", Format::Env, &Sources::new()) {
        Err(Error::Vault(VaultError::EntryNotFound(path))) => assert_eq!(path, t.path(".env.qa")),
        other => panic!("expected EntryNotFound, got {other:?}"),
    }
}

#[test]
fn test_top_level_array_is_rejected() {
    let t = Test::new();
    t.write(".ejson", "[1, 2, 3]");
    let pair = KeyPair::generate();
    let keys = sources(&[("ESEC_PRIVATE_KEY", pair.private.to_hex().as_str())]);

    let vault = Vault::open(t.dir.path());
    assert!(matches!(
        vault.decrypt("", Format::Json, &keys),
        Err(Error::Vault(VaultError::Parse { .. }))
    ));
}

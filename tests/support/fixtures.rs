//! Test fixtures and constants.

/// Project used by distribution tests.
pub const PROJECT: &str = "acme/api";

/// Token granted admin on `PROJECT`.
pub const ADMIN_TOKEN: &str = "tok-admin";

/// Token granted read on `PROJECT`.
pub const READER_TOKEN: &str = "tok-reader";

/// Token with no grants.
pub const OUTSIDER_TOKEN: &str = "tok-outsider";

/// The literal envelope for version 1, sender 32 x 0x01, nonce 24 x 0x02,
/// ciphertext [3, 3, 3].
pub const LITERAL_ENVELOPE: &str =
    "ESEC[1:AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=:AgICAgICAgICAgICAgICAgICAgICAgIC:AwMD]";

/// Standard test secrets used across multiple tests.
pub const STANDARD_SECRETS: &[(&str, &str)] = &[
    ("DATABASE_URL", "postgres://localhost/mydb"),
    ("API_KEY", "sk-test-12345"),
    ("JWT_SECRET", "super-secret-jwt-token"),
];

/// `.esec.toml` with grants for the standard tokens and a SQLite store.
pub fn config_with_grants() -> String {
    format!(
        r#"[store]
backend = "sqlite"
path = "esec.db"

[[grants]]
token = "{ADMIN_TOKEN}"
project = "{PROJECT}"
role = "admin"

[[grants]]
token = "{READER_TOKEN}"
project = "{PROJECT}"
role = "read"
"#
    )
}

/// Env blob for `public_key` holding `STANDARD_SECRETS` in plaintext.
pub fn env_blob(public_key: &str) -> String {
    let mut out = format!("ESEC_PUBLIC_KEY={public_key}\n");
    for (k, v) in STANDARD_SECRETS {
        out.push_str(&format!("{k}={v}\n"));
    }
    out
}

//! Process settings loaded via OrthoConfig (CLI flags over `ENROLLMENT_*`
//! environment variables).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use rand::RngCore;
use serde::Deserialize;
use tracing::warn;
use url::Url;
use zeroize::Zeroizing;

use enrollment::domain::Email;
use enrollment::domain::auth::MIN_SECRET_LEN;
use enrollment::outbound::payments::DEFAULT_STRIPE_API_BASE;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_SECRET_FILE: &str = "/var/run/secrets/token_secret";

/// A setting is present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address {value}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    /// `payment_api_base` is not a URL.
    #[error("invalid payment API base {value}: {source}")]
    PaymentApiBase {
        value: String,
        source: url::ParseError,
    },
    /// `bootstrap_admin` is not an email address.
    #[error("invalid bootstrap admin email {value}")]
    BootstrapAdmin { value: String },
    /// A secret file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadSecret {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A secret file holds only whitespace.
    #[error("{} is empty", path.display())]
    EmptySecret { path: PathBuf },
}

/// Settings for the enrollment server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ENROLLMENT")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// File holding the session token signing secret.
    pub token_secret_file: Option<PathBuf>,
    /// Generate a throwaway signing secret when the file is unreadable.
    /// Always allowed in debug builds.
    #[ortho_config(default = false)]
    pub allow_ephemeral_secret: bool,
    /// PostgreSQL URL. Without it the server runs on in-memory stores.
    pub database_url: Option<String>,
    /// File holding the payment provider secret key. Without it payment
    /// intents come from the offline fixture gateway.
    pub payment_secret_key_file: Option<PathBuf>,
    /// Payment provider API base URL.
    pub payment_api_base: Option<String>,
    /// Email granted the admin role at startup.
    pub bootstrap_admin: Option<String>,
    /// JSON class catalog seeded into the in-memory stores. Ignored when a
    /// database is configured.
    pub catalog_file: Option<PathBuf>,
}

impl AppSettings {
    /// Listen address, `0.0.0.0:8080` by default.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Signing secret location, defaulting to the mounted secret.
    pub fn token_secret_file(&self) -> &Path {
        self.token_secret_file
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_TOKEN_SECRET_FILE))
    }

    /// Provider API base, Stripe's by default.
    pub fn payment_api_base(&self) -> Result<Url, SettingsError> {
        let value = self
            .payment_api_base
            .as_deref()
            .unwrap_or(DEFAULT_STRIPE_API_BASE);
        Url::parse(value).map_err(|source| SettingsError::PaymentApiBase {
            value: value.to_owned(),
            source,
        })
    }

    /// Admin email, if set and non-blank.
    pub fn bootstrap_admin(&self) -> Result<Option<Email>, SettingsError> {
        self.bootstrap_admin
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                Email::new(raw).map_err(|_| SettingsError::BootstrapAdmin {
                    value: raw.to_owned(),
                })
            })
            .transpose()
    }

    /// Read the token signing secret, or generate an ephemeral one when the
    /// file is unreadable and that is allowed.
    pub fn load_token_secret(&self) -> Result<Zeroizing<Vec<u8>>, SettingsError> {
        let path = self.token_secret_file();
        match read_secret(path) {
            Ok(secret) => Ok(Zeroizing::new(secret.as_bytes().to_vec())),
            Err(err) if cfg!(debug_assertions) || self.allow_ephemeral_secret => {
                warn!(
                    error = %err,
                    "using an ephemeral token secret; tokens will not survive a restart"
                );
                let mut secret = Zeroizing::new(vec![0_u8; MIN_SECRET_LEN * 2]);
                rand::thread_rng().fill_bytes(&mut secret);
                Ok(secret)
            }
            Err(err) => Err(err),
        }
    }

    /// Read the payment provider key, if one is configured.
    pub fn load_payment_secret_key(&self) -> Result<Option<Zeroizing<String>>, SettingsError> {
        self.payment_secret_key_file
            .as_deref()
            .map(read_secret)
            .transpose()
    }
}

fn read_secret(path: &Path) -> Result<Zeroizing<String>, SettingsError> {
    let raw = std::fs::read_to_string(path)
        .map(Zeroizing::new)
        .map_err(|source| SettingsError::ReadSecret {
            path: path.to_path_buf(),
            source,
        })?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SettingsError::EmptySecret {
            path: path.to_path_buf(),
        });
    }
    Ok(Zeroizing::new(trimmed.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::io::Write;

    use env_lock::lock_env;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    const VARS: [&str; 8] = [
        "ENROLLMENT_BIND_ADDR",
        "ENROLLMENT_TOKEN_SECRET_FILE",
        "ENROLLMENT_ALLOW_EPHEMERAL_SECRET",
        "ENROLLMENT_DATABASE_URL",
        "ENROLLMENT_PAYMENT_SECRET_KEY_FILE",
        "ENROLLMENT_PAYMENT_API_BASE",
        "ENROLLMENT_BOOTSTRAP_ADMIN",
        "ENROLLMENT_CATALOG_FILE",
    ];

    fn load() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("enrollment")]).expect("config should load")
    }

    /// Every `ENROLLMENT_*` variable, unset unless overridden.
    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn secret_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write secret");
        file
    }

    fn path_of(file: &NamedTempFile) -> String {
        file.path().display().to_string()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));
        let settings = load();
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("socket addr")
        );
        assert_eq!(
            settings.token_secret_file(),
            Path::new(DEFAULT_TOKEN_SECRET_FILE)
        );
        assert!(!settings.allow_ephemeral_secret);
        assert!(settings.database_url.is_none());
        assert!(settings.catalog_file.is_none());
        assert_eq!(
            settings.payment_api_base().expect("default url").as_str(),
            "https://api.stripe.com/"
        );
        assert_eq!(settings.bootstrap_admin().expect("no admin"), None);
        assert!(settings.load_payment_secret_key().expect("no key").is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("ENROLLMENT_BIND_ADDR", "127.0.0.1:9000"),
            ("ENROLLMENT_DATABASE_URL", "postgres://db/app"),
            ("ENROLLMENT_BOOTSTRAP_ADMIN", "root@example.com"),
            ("ENROLLMENT_ALLOW_EPHEMERAL_SECRET", "true"),
            ("ENROLLMENT_CATALOG_FILE", "/etc/enrollment/catalog.json"),
        ]));
        let settings = load();
        assert_eq!(settings.bind_addr().expect("parses").port(), 9000);
        assert_eq!(
            settings.catalog_file.as_deref(),
            Some(Path::new("/etc/enrollment/catalog.json"))
        );
        assert_eq!(settings.database_url.as_deref(), Some("postgres://db/app"));
        assert!(settings.allow_ephemeral_secret);
        assert_eq!(
            settings.bootstrap_admin().expect("valid admin"),
            Some(Email::new("root@example.com").expect("email"))
        );
    }

    #[rstest]
    fn malformed_bind_addr_is_reported() {
        let _guard = lock_env(env_with(&[("ENROLLMENT_BIND_ADDR", "not an address")]));
        let err = load().bind_addr().expect_err("bad address");
        assert!(matches!(err, SettingsError::BindAddr { .. }));
    }

    #[rstest]
    fn malformed_bootstrap_admin_is_reported() {
        let _guard = lock_env(env_with(&[("ENROLLMENT_BOOTSTRAP_ADMIN", "nobody")]));
        let err = load().bootstrap_admin().expect_err("bad email");
        assert!(matches!(err, SettingsError::BootstrapAdmin { .. }));
    }

    #[rstest]
    fn secrets_are_read_trimmed() {
        let token = secret_file("0123456789abcdef0123456789abcdef\n");
        let payment = secret_file("sk_test_123\n");
        let (token_path, payment_path) = (path_of(&token), path_of(&payment));
        let _guard = lock_env(env_with(&[
            ("ENROLLMENT_TOKEN_SECRET_FILE", &token_path),
            ("ENROLLMENT_PAYMENT_SECRET_KEY_FILE", &payment_path),
        ]));
        let settings = load();
        let secret = settings.load_token_secret().expect("secret loads");
        assert_eq!(secret.as_slice(), b"0123456789abcdef0123456789abcdef");
        let key = settings
            .load_payment_secret_key()
            .expect("key loads")
            .expect("key configured");
        assert_eq!(key.as_str(), "sk_test_123");
    }

    #[rstest]
    fn empty_payment_key_is_an_error() {
        let payment = secret_file("  \n");
        let payment_path = path_of(&payment);
        let _guard = lock_env(env_with(&[(
            "ENROLLMENT_PAYMENT_SECRET_KEY_FILE",
            &payment_path,
        )]));
        let err = load().load_payment_secret_key().expect_err("empty key");
        assert!(matches!(err, SettingsError::EmptySecret { .. }));
    }

    #[rstest]
    fn unreadable_secret_falls_back_when_allowed() {
        let _guard = lock_env(env_with(&[
            ("ENROLLMENT_TOKEN_SECRET_FILE", "/nonexistent/token_secret"),
            ("ENROLLMENT_ALLOW_EPHEMERAL_SECRET", "true"),
        ]));
        let secret = load().load_token_secret().expect("ephemeral secret");
        assert_eq!(secret.len(), MIN_SECRET_LEN * 2);
    }
}

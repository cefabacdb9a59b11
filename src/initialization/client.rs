//! HTTP client initialization.
//!
//! Session clients never follow redirects themselves: the executor walks the
//! chain so each hop can be recorded. Cookies are kept in the session's jar
//! rather than handed to the client for the same reason.

use std::path::Path;

use reqwest::{Certificate, ClientBuilder};

use crate::error_handling::InitializationError;
use crate::sessions::TlsVerify;

/// Builds a client for a session with the given certificate policy.
///
/// # Errors
///
/// Returns an `InitializationError` if the CA bundle cannot be read or
/// parsed, or the TLS backend rejects the configuration.
pub fn init_session_client(verify: &TlsVerify) -> Result<reqwest::Client, InitializationError> {
    let mut builder = ClientBuilder::new().redirect(reqwest::redirect::Policy::none());

    match verify {
        TlsVerify::Enabled(true) => {}
        TlsVerify::Enabled(false) => {
            log::warn!("TLS certificate verification disabled for this request");
            builder = builder.danger_accept_invalid_certs(true);
        }
        TlsVerify::CaBundle(path) => {
            for certificate in load_ca_bundle(path)? {
                builder = builder.add_root_certificate(certificate);
            }
        }
    }

    Ok(builder.build()?)
}

/// Reads every PEM certificate in `path`.
fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>, InitializationError> {
    let pem = std::fs::read(path).map_err(|source| InitializationError::CaBundleReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let certificates = Certificate::from_pem_bundle(&pem).map_err(|source| {
        InitializationError::CaBundleParseError {
            path: path.to_path_buf(),
            source,
        }
    })?;
    log::debug!(
        "Loaded {} CA certificate(s) from {}",
        certificates.len(),
        path.display()
    );
    Ok(certificates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_and_insecure_clients_build() {
        assert!(init_session_client(&TlsVerify::default()).is_ok());
        assert!(init_session_client(&TlsVerify::Enabled(false)).is_ok());
    }

    #[test]
    fn test_missing_ca_bundle_is_a_read_error() {
        let verify = TlsVerify::CaBundle(PathBuf::from("/nonexistent/loco-http/ca.pem"));
        let err = init_session_client(&verify).unwrap_err();
        assert!(matches!(err, InitializationError::CaBundleReadError { .. }));
        assert!(err.to_string().contains("/nonexistent/loco-http/ca.pem"));
    }
}

//! TLS settings for [`BlockingTransport::connect_tls`].
//!
//! A [`TlsConfig`] describes which server certificates to trust and which
//! protocol versions to offer. It is turned into a rustls `ClientConfig` at
//! connect time, always with the `ring` crypto provider.
//!
//! ```ignore
//! use courier::tls::{Certificate, TlsConfig, TlsVersion};
//!
//! let tls = TlsConfig::new()
//!     .add_root_certificate(Certificate::from_pem_file("ca.crt")?)
//!     .min_version(TlsVersion::Tls1_3);
//! ```
//!
//! [`BlockingTransport::connect_tls`]: crate::transport::BlockingTransport::connect_tls

use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error::{NetworkError, Result};

/// Lowest protocol version offered in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsVersion {
    /// Offer TLS 1.2 and TLS 1.3.
    #[default]
    Tls1_2,
    /// Offer TLS 1.3 only.
    Tls1_3,
}

impl TlsVersion {
    pub(crate) fn to_rustls_versions(self) -> Vec<&'static rustls::SupportedProtocolVersion> {
        match self {
            Self::Tls1_2 => vec![&rustls::version::TLS13, &rustls::version::TLS12],
            Self::Tls1_3 => vec![&rustls::version::TLS13],
        }
    }
}

/// One or more DER certificates to trust as roots.
#[derive(Clone)]
pub struct Certificate {
    chain: Vec<CertificateDer<'static>>,
}

impl Certificate {
    /// Parse every `CERTIFICATE` block in PEM text.
    pub fn from_pem(pem: impl AsRef<[u8]>) -> Result<Self> {
        let mut reader = pem.as_ref();
        let chain = rustls_pemfile::certs(&mut reader)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| NetworkError::Tls(format!("malformed PEM: {e}")))?;

        if chain.is_empty() {
            return Err(NetworkError::Tls("PEM data holds no certificates".to_string()));
        }
        Ok(Self { chain })
    }

    /// Read and parse a PEM file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path)
            .map_err(|e| NetworkError::Tls(format!("cannot read '{}': {e}", path.display())))?;
        Self::from_pem(pem)
    }

    /// Wrap a single DER certificate. The encoding is checked when the
    /// certificate is added to a trust store.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self {
            chain: vec![CertificateDer::from(der.into())],
        }
    }

    pub(crate) fn der_certs(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("certs", &self.chain.len())
            .finish()
    }
}

/// Client-side TLS settings.
///
/// By default the bundled Mozilla roots from `webpki-roots` are trusted,
/// TLS 1.2 and 1.3 are offered and certificates are verified.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Extra roots trusted alongside (or instead of) the bundled ones.
    pub root_certificates: Vec<Certificate>,
    /// Trust only `root_certificates`.
    pub use_only_custom_roots: bool,
    /// Lowest version offered.
    pub min_version: TlsVersion,
    /// Skip chain and hostname validation. Handshake signatures are still
    /// checked. Test servers only.
    pub danger_accept_invalid_certs: bool,
}

impl TlsConfig {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust an additional root.
    pub fn add_root_certificate(mut self, cert: Certificate) -> Self {
        self.root_certificates.push(cert);
        self
    }

    /// Drop the bundled roots.
    pub fn use_only_custom_roots(mut self) -> Self {
        self.use_only_custom_roots = true;
        self
    }

    /// Set the lowest offered version.
    pub fn min_version(mut self, version: TlsVersion) -> Self {
        self.min_version = version;
        self
    }

    /// Accept any server certificate.
    ///
    /// The connection is then open to man-in-the-middle attacks.
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.danger_accept_invalid_certs = true;
        self
    }

    /// Produce the rustls client configuration for a handshake.
    pub fn build_rustls_config(&self) -> Result<Arc<ClientConfig>> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(&self.min_version.to_rustls_versions())
            .map_err(|e| NetworkError::Tls(format!("unsupported protocol versions: {e}")))?;

        let config = if self.danger_accept_invalid_certs {
            tracing::warn!(target: "courier::tls", "Server certificate validation is disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate::new(&provider)))
                .with_no_client_auth()
        } else {
            builder
                .with_root_certificates(self.root_store()?)
                .with_no_client_auth()
        };
        Ok(Arc::new(config))
    }

    fn root_store(&self) -> Result<RootCertStore> {
        let mut store = RootCertStore::empty();
        if !self.use_only_custom_roots {
            store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        let custom = self.root_certificates.iter().flat_map(Certificate::der_certs);
        for der in custom {
            store
                .add(der.clone())
                .map_err(|e| NetworkError::Tls(format!("rejected root certificate: {e}")))?;
        }

        if store.is_empty() {
            return Err(NetworkError::Tls(
                "trust store is empty: add a root certificate or keep the bundled roots"
                    .to_string(),
            ));
        }
        tracing::debug!(target: "courier::tls", "Trust store holds {} roots", store.len());
        Ok(store)
    }
}

/// Accepts any certificate chain but still verifies handshake signatures
/// with the provider's algorithms.
#[derive(Debug)]
struct AcceptAnyCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl AcceptAnyCertificate {
    fn new(provider: &CryptoProvider) -> Self {
        Self {
            algorithms: provider.signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_sets() {
        assert_eq!(TlsVersion::default(), TlsVersion::Tls1_2);
        assert_eq!(TlsVersion::Tls1_2.to_rustls_versions().len(), 2);
        assert_eq!(TlsVersion::Tls1_3.to_rustls_versions().len(), 1);
    }

    #[test]
    fn test_certificate_from_der() {
        let cert = Certificate::from_der(vec![0x30, 0x03, 0x02, 0x01, 0x00]);
        assert_eq!(cert.der_certs().len(), 1);
    }

    #[test]
    fn test_pem_without_certificates_is_rejected() {
        assert!(matches!(
            Certificate::from_pem("not a certificate"),
            Err(NetworkError::Tls(_))
        ));
    }

    #[test]
    fn test_missing_pem_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Certificate::from_pem_file(dir.path().join("absent.pem")).unwrap_err();
        assert!(err.to_string().contains("absent.pem"));
    }

    #[test]
    fn test_bundled_roots_build() {
        assert!(TlsConfig::new().build_rustls_config().is_ok());
        assert!(
            TlsConfig::new()
                .min_version(TlsVersion::Tls1_3)
                .build_rustls_config()
                .is_ok()
        );
    }

    #[test]
    fn test_empty_trust_store_is_rejected() {
        let result = TlsConfig::new().use_only_custom_roots().build_rustls_config();
        assert!(matches!(result, Err(NetworkError::Tls(_))));
    }

    #[test]
    fn test_accept_invalid_certs_needs_no_roots() {
        let config = TlsConfig::new()
            .use_only_custom_roots()
            .danger_accept_invalid_certs();
        assert!(config.build_rustls_config().is_ok());
    }
}

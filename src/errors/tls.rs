use thiserror::Error;

/// TLS-specific error variants surfaced while turning configured PEM material
/// into a listener-ready server configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    /// The certificate PEM contents were invalid or unreadable.
    #[error("Configured certificate is not a valid PEM: {source}")]
    InvalidCertificatePem {
        #[source]
        source: anyhow::Error,
    },

    /// No certificates were found in the supplied PEM bytes.
    #[error("Configured certificate does not contain any certificates")]
    EmptyCertificateChain,

    /// The private key PEM contents were invalid or unsupported.
    #[error("Configured private key is not a supported PEM private key: {source}")]
    InvalidPrivateKey {
        #[source]
        source: anyhow::Error,
    },

    /// The TLS protocol configuration was rejected by rustls.
    #[error("Invalid TLS protocol configuration: {source}")]
    InvalidProtocolConfig {
        #[source]
        source: anyhow::Error,
    },

    /// The supplied certificate and key do not form a usable pair.
    #[error("Certificate and private key do not match: {source}")]
    CertificateKeyMismatch {
        #[source]
        source: anyhow::Error,
    },
}

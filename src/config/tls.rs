//! TLS acceptor construction from configured PEM material.

use std::sync::Arc;

use anyhow::anyhow;
use rustls::pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

use crate::config::HttpsConfig;
use crate::errors::TlsError;

/// Decode the configured certificate chain and private key and build a
/// listener-ready [`TlsAcceptor`].
pub fn build_tls_acceptor(https: &HttpsConfig) -> Result<TlsAcceptor, TlsError> {
    let cert_chain: Vec<CertificateDer<'static>> =
        CertificateDer::pem_slice_iter(https.cert.as_bytes())
            .map(|result| {
                result.map_err(|err| TlsError::InvalidCertificatePem { source: anyhow!(err) })
            })
            .collect::<Result<_, _>>()?;

    if cert_chain.is_empty() {
        return Err(TlsError::EmptyCertificateChain);
    }

    let private_key = PrivateKeyDer::from_pem_slice(https.key.as_bytes())
        .map_err(|err| TlsError::InvalidPrivateKey { source: anyhow!(err) })?;

    let provider = rustls::crypto::ring::default_provider();
    let builder = rustls::ServerConfig::builder_with_provider(provider.into())
        .with_safe_default_protocol_versions()
        .map_err(|err| TlsError::InvalidProtocolConfig { source: anyhow!(err) })?;

    let server_config = builder
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)
        .map_err(|err| TlsError::CertificateKeyMismatch { source: anyhow!(err) })?;

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

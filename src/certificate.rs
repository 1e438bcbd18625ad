//! TLS certificate extraction.
//!
//! Performs a TLS handshake that accepts any certificate, then reads the
//! peer's leaf certificate. No chain or hostname validation is done: the
//! point is to describe whatever the server presents.

use crate::error::{ProbeError, ProbeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_native_tls::TlsConnector;
use x509_parser::der_parser::oid::Oid;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Metadata of a leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_names: Vec<String>,
    pub is_expired: bool,
    /// Lowercase hex SHA-256 of the DER bytes.
    #[serde(rename = "fingerprint")]
    pub fingerprint_sha256: String,
    /// RSA modulus length or EC curve size; 0 for other key types.
    pub public_key_bits: usize,
    pub signature_algorithm: String,
}

/// Builds `CertificateInfo` from a TLS session or raw DER.
pub struct CertificateInspector;

impl CertificateInspector {
    /// Inspect the leaf certificate of an established session.
    pub fn inspect_session<S>(stream: &tokio_native_tls::TlsStream<S>) -> ProbeResult<CertificateInfo>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let cert = stream
            .get_ref()
            .peer_certificate()
            .map_err(|e| ProbeError::Tls(e.to_string()))?
            .ok_or_else(|| ProbeError::Certificate("peer sent no certificate".to_string()))?;

        let der = cert.to_der().map_err(|e| ProbeError::Certificate(e.to_string()))?;
        Self::inspect_der(&der, Utc::now())
    }

    /// Inspect DER-encoded certificate bytes, judging expiry against `now`.
    pub fn inspect_der(der: &[u8], now: DateTime<Utc>) -> ProbeResult<CertificateInfo> {
        let (_, cert) =
            X509Certificate::from_der(der).map_err(|e| ProbeError::Certificate(e.to_string()))?;

        let validity = cert.validity();
        let valid_from = to_datetime(validity.not_before)?;
        let valid_to = to_datetime(validity.not_after)?;

        let dns_names = match cert.subject_alternative_name() {
            Ok(Some(san)) => san
                .value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some(dns.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(CertificateInfo {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            valid_from,
            valid_to,
            dns_names,
            is_expired: now > valid_to,
            fingerprint_sha256: fingerprint(der),
            public_key_bits: public_key_bits(cert.public_key()),
            signature_algorithm: signature_algorithm_name(
                &cert.signature_algorithm.algorithm.to_id_string(),
            ),
        })
    }
}

/// Connect to `addr`, complete a TLS handshake and inspect the certificate.
///
/// Both the connect and the handshake share `deadline`. The connection is
/// dropped before returning.
pub async fn grab_certificate(
    addr: SocketAddr,
    server_name: &str,
    deadline: Duration,
) -> ProbeResult<CertificateInfo> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| ProbeError::Tls(e.to_string()))?;
    let connector = TlsConnector::from(connector);

    let handshake = async {
        let stream = TcpStream::connect(addr).await.map_err(ProbeError::from_connect)?;
        connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ProbeError::Tls(e.to_string()))
    };

    let tls_stream = timeout(deadline, handshake)
        .await
        .map_err(|_| ProbeError::Timeout)??;

    CertificateInspector::inspect_session(&tls_stream)
}

/// SHA-256 of `der`, lowercase hex, no separators.
pub fn fingerprint(der: &[u8]) -> String {
    hex::encode(Sha256::digest(der))
}

fn to_datetime(time: ASN1Time) -> ProbeResult<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| ProbeError::Certificate(format!("timestamp out of range: {}", time)))
}

fn public_key_bits(spki: &SubjectPublicKeyInfo<'_>) -> usize {
    match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => rsa.key_size(),
        Ok(PublicKey::EC(point)) => spki
            .algorithm
            .parameters
            .as_ref()
            .and_then(|params| Oid::try_from(params.clone()).ok())
            .and_then(|curve| curve_bits(&curve.to_id_string()))
            .unwrap_or_else(|| point.key_size()),
        _ => 0,
    }
}

fn curve_bits(oid: &str) -> Option<usize> {
    match oid {
        "1.2.840.10045.3.1.7" => Some(256),
        "1.3.132.0.34" => Some(384),
        "1.3.132.0.35" => Some(521),
        "1.3.132.0.10" => Some(256),
        "1.2.840.10045.3.1.1" => Some(192),
        "1.3.132.0.33" => Some(224),
        _ => None,
    }
}

fn signature_algorithm_name(oid: &str) -> String {
    let name = match oid {
        "1.2.840.113549.1.1.4" => "MD5-RSA",
        "1.2.840.113549.1.1.5" => "SHA1-RSA",
        "1.2.840.113549.1.1.11" => "SHA256-RSA",
        "1.2.840.113549.1.1.12" => "SHA384-RSA",
        "1.2.840.113549.1.1.13" => "SHA512-RSA",
        "1.2.840.113549.1.1.10" => "RSASSA-PSS",
        "1.2.840.10045.4.1" => "ECDSA-SHA1",
        "1.2.840.10045.4.3.2" => "ECDSA-SHA256",
        "1.2.840.10045.4.3.3" => "ECDSA-SHA384",
        "1.2.840.10045.4.3.4" => "ECDSA-SHA512",
        "1.3.101.112" => "Ed25519",
        other => return other.to_string(),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_DER: &[u8] = include_bytes!("../tests/fixtures/rsa2048.der");
    const EC_DER: &[u8] = include_bytes!("../tests/fixtures/ec256.der");
    const EXPIRED_DER: &[u8] = include_bytes!("../tests/fixtures/expired.der");

    #[test]
    fn test_rsa_certificate() {
        let info = CertificateInspector::inspect_der(RSA_DER, Utc::now()).unwrap();
        assert_eq!(info.public_key_bits, 2048);
        assert!(info.subject.contains("CN=localhost"));
        assert!(info.subject.contains("O=Gatescan Test"));
        assert_eq!(info.subject, info.issuer);
        assert_eq!(info.dns_names, vec!["localhost", "gatescan.test"]);
        assert_eq!(info.signature_algorithm, "SHA256-RSA");
        assert!(!info.is_expired);
    }

    #[test]
    fn test_fingerprint_is_stable_lowercase_hex() {
        let first = CertificateInspector::inspect_der(RSA_DER, Utc::now()).unwrap();
        let second = CertificateInspector::inspect_der(RSA_DER, Utc::now()).unwrap();
        assert_eq!(first.fingerprint_sha256, second.fingerprint_sha256);
        assert_eq!(
            first.fingerprint_sha256,
            "aa27b7f6879f49b43d259d41fc11f101bc24cd9a3e2aa3e8fcdbe6e26f54e1f0"
        );
    }

    #[test]
    fn test_ec_certificate() {
        let info = CertificateInspector::inspect_der(EC_DER, Utc::now()).unwrap();
        assert_eq!(info.public_key_bits, 256);
        assert_eq!(info.signature_algorithm, "ECDSA-SHA256");
        assert!(info.dns_names.is_empty());
    }

    #[test]
    fn test_expired_certificate() {
        let info = CertificateInspector::inspect_der(EXPIRED_DER, Utc::now()).unwrap();
        assert!(info.is_expired);
        assert_eq!(info.valid_to.to_rfc3339(), "2021-01-01T00:00:00+00:00");

        let before_expiry = DateTime::from_timestamp(1_590_000_000, 0).unwrap();
        let info = CertificateInspector::inspect_der(EXPIRED_DER, before_expiry).unwrap();
        assert!(!info.is_expired);
    }

    #[test]
    fn test_garbage_is_certificate_error() {
        let result = CertificateInspector::inspect_der(b"not a certificate", Utc::now());
        assert!(matches!(result, Err(ProbeError::Certificate(_))));
    }

    #[test]
    fn test_unknown_signature_oid_falls_back() {
        assert_eq!(signature_algorithm_name("1.2.3.4"), "1.2.3.4");
    }
}

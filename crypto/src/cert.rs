//! X.509 identity extraction.

use x509_parser::certificate::X509Certificate;
use x509_parser::parse_x509_certificate;
use x509_parser::pem::parse_x509_pem;

use crate::CryptoError;

/// Subject common name of a PEM or DER certificate.
pub fn common_name(cert: &[u8]) -> Result<String, CryptoError> {
    if cert.trim_ascii_start().starts_with(b"-----BEGIN") {
        let (_, pem) = parse_x509_pem(cert).map_err(|e| CryptoError::Certificate(e.to_string()))?;
        let x509 = pem
            .parse_x509()
            .map_err(|e| CryptoError::Certificate(e.to_string()))?;
        subject_cn(&x509)
    } else {
        let (_, x509) = parse_x509_certificate(cert)
            .map_err(|e| CryptoError::Certificate(e.to_string()))?;
        subject_cn(&x509)
    }
}

fn subject_cn(cert: &X509Certificate<'_>) -> Result<String, CryptoError> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
        .ok_or_else(|| CryptoError::Certificate("subject has no common name".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{Certificate, CertificateParams, DistinguishedName, DnType};

    fn cert_with_cn(cn: &str) -> Certificate {
        let mut params = CertificateParams::new(vec!["node1.org1".to_string()]);
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::OrganizationName, "org1");
        params.distinguished_name.push(DnType::CommonName, cn);
        Certificate::from_params(params).unwrap()
    }

    #[test]
    fn common_name_from_pem() {
        let cert = cert_with_cn("admin1.sign.org1");
        let pem = cert.serialize_pem().unwrap();
        assert_eq!(common_name(pem.as_bytes()).unwrap(), "admin1.sign.org1");
    }

    #[test]
    fn common_name_from_der() {
        let cert = cert_with_cn("client1.tls.org2");
        let der = cert.serialize_der().unwrap();
        assert_eq!(common_name(&der).unwrap(), "client1.tls.org2");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(common_name(b"not a certificate").is_err());
        assert!(common_name(b"-----BEGIN CERTIFICATE-----\nzz\n-----END CERTIFICATE-----\n").is_err());
    }
}

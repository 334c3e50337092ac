//! PKCS#7/CMS parsing utilities.
//!
//! This module provides functions for parsing the PKCS#7 "certs-only"
//! SignedData bundles the CA hands out for its certificate chain.
//!
//! Certificates are returned in the order they are stored in the bundle.
//! Decoding the `certificates` field as a DER `SET OF` would re-sort the
//! entries, so that field is walked element by element instead.

use base64::prelude::*;
use cms::content_info::ContentInfo;
use der::asn1::Any;
use der::pem::LineEnding;
use der::{Decode, Encode, EncodePem, Reader, SliceReader, Tag, TagNumber, Tagged};
use x509_cert::Certificate;

use crate::error::{CertsrvError, Result};

/// OID for SignedData: 1.2.840.113549.1.7.2
const SIGNED_DATA_OID: &str = "1.2.840.113549.1.7.2";

/// `certificates [0] IMPLICIT CertificateSet` inside SignedData.
const CERTIFICATES_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

/// First octet of a DER SEQUENCE.
const DER_SEQUENCE: u8 = 0x30;

/// Parse a PKCS#7 certs-only bundle.
///
/// The bundle may be raw DER, bare base64, or base64 wrapped in PEM armor
/// (certsrv labels its base64 PKCS#7 as `CERTIFICATE`).
pub fn parse_certs_only(body: &[u8]) -> Result<Vec<Certificate>> {
    let der_bytes = decode_bundle(body)?;

    let content_info = ContentInfo::from_der(&der_bytes)
        .map_err(|e| CertsrvError::cms_parsing(format!("Failed to parse ContentInfo: {}", e)))?;

    let signed_data = extract_signed_data(&content_info)?;

    extract_certificates(signed_data)
}

/// Turn a bundle body into DER bytes.
pub fn decode_bundle(body: &[u8]) -> Result<Vec<u8>> {
    if body.first() == Some(&DER_SEQUENCE) {
        return Ok(body.to_vec());
    }

    let text = std::str::from_utf8(body)
        .map_err(|_| CertsrvError::cms_parsing("Bundle is neither DER nor base64 text"))?;

    let payload: String = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .collect();

    if payload.is_empty() {
        return Err(CertsrvError::cms_parsing("Empty PKCS#7 bundle"));
    }

    decode_base64(payload.as_bytes())
}

/// Encode a certificate as PEM with `\n` line endings.
pub fn encode_certificate_pem(cert: &Certificate) -> Result<String> {
    cert.to_pem(LineEnding::LF).map_err(|e| {
        CertsrvError::certificate_parsing(format!("Failed to encode certificate: {}", e))
    })
}

/// Decode base64 data, handling various line ending formats.
fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    BASE64_STANDARD.decode(&cleaned).map_err(CertsrvError::Base64)
}

/// Return the body of the SignedData SEQUENCE.
fn extract_signed_data(content_info: &ContentInfo) -> Result<&[u8]> {
    let oid_str = content_info.content_type.to_string();
    if oid_str != SIGNED_DATA_OID {
        return Err(CertsrvError::cms_parsing(format!(
            "Expected SignedData OID, got {}",
            oid_str
        )));
    }

    if content_info.content.tag() != Tag::Sequence {
        return Err(CertsrvError::cms_parsing("SignedData is not a SEQUENCE"));
    }

    Ok(content_info.content.value())
}

/// Extract certificates from a SignedData body in stored order.
fn extract_certificates(signed_data: &[u8]) -> Result<Vec<Certificate>> {
    let mut fields = SliceReader::new(signed_data)?;
    let mut certificates = Vec::new();

    while !fields.is_finished() {
        let field = Any::decode(&mut fields)?;
        if field.tag() != CERTIFICATES_TAG {
            continue;
        }

        let mut choices = SliceReader::new(field.value())?;
        while !choices.is_finished() {
            let choice = Any::decode(&mut choices)?;

            // Extended and attribute certificates carry context tags
            if choice.tag() != Tag::Sequence {
                tracing::warn!("Skipping non-X.509 certificate choice {}", choice.tag());
                continue;
            }

            let cert_der = choice.to_der()?;
            let cert = Certificate::from_der(&cert_der).map_err(|e| {
                CertsrvError::cms_parsing(format!(
                    "Certificate {} in bundle is not decodable: {}",
                    certificates.len(),
                    e
                ))
            })?;
            certificates.push(cert);
        }
    }

    Ok(certificates)
}

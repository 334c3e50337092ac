//! Root chain assembly (FETCH-ROOTS).
//!
//! certmonger expects a nickname line followed by a PEM certificate for
//! each CA certificate, with the root first and a blank line separating it
//! from the rest.

use der::asn1::Any;
use der::{Tag, Tagged};
use x509_cert::Certificate;

use crate::error::{CertsrvError, Result};
use crate::types::{encode_certificate_pem, parse_certs_only};

/// One certificate of the assembled chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    /// Lower-cased subject common name.
    pub common_name: String,
    /// PEM encoding, ending with a newline.
    pub pem: String,
}

/// Order the bundle's certificates for certmonger.
///
/// Entries come out from the last stored certificate to the first.
pub fn root_chain(certs: &[Certificate]) -> Result<Vec<RootEntry>> {
    if certs.is_empty() {
        return Err(CertsrvError::cms_parsing("CA chain contains no certificates"));
    }

    certs
        .iter()
        .rev()
        .map(|cert| {
            let mut pem = encode_certificate_pem(cert)?;
            if !pem.ends_with('\n') {
                pem.push('\n');
            }

            Ok(RootEntry {
                common_name: common_name(cert).to_lowercase(),
                pem,
            })
        })
        .collect()
}

/// Decode a PKCS#7 bundle and render it as certmonger's root listing.
pub fn assemble_roots(bundle: &[u8]) -> Result<String> {
    let certs = parse_certs_only(bundle)?;
    let entries = root_chain(&certs)?;
    tracing::debug!("CA chain contains {} certificates", entries.len());

    let mut out = String::new();
    for (position, entry) in entries.iter().enumerate() {
        out.push_str(&entry.common_name);
        out.push('\n');
        out.push_str(&entry.pem);
        if position == 0 {
            out.push('\n');
        }
    }

    Ok(out)
}

/// Get the subject common name from a certificate.
///
/// Certificates without a CN fall back to the full subject DN.
pub fn common_name(cert: &Certificate) -> String {
    use const_oid::db::rfc4519::CN;

    for rdn in cert.tbs_certificate.subject.0.iter() {
        for atv in rdn.0.iter() {
            if atv.oid == CN {
                if let Some(name) = directory_string(&atv.value) {
                    return name;
                }
            }
        }
    }

    cert.tbs_certificate.subject.to_string()
}

/// Text of a directory string whose encoding is UTF-8 compatible.
///
/// BMP and universal strings are not; callers fall back to the DN.
fn directory_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::TeletexString => {
            std::str::from_utf8(value.value()).ok().map(str::to_string)
        }
        _ => None,
    }
}

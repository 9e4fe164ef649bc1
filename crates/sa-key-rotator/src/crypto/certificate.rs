//! Certificate inspection.

use x509_parser::pem::parse_x509_pem;

use crate::error::{Result, RotatorError};

/// Extract the subject common name of a PEM-encoded x509 certificate.
///
/// A certificate without a common name yields an empty string.
pub fn common_name(certificate_pem: &str) -> Result<String> {
    let (_, pem) = parse_x509_pem(certificate_pem.as_bytes())
        .map_err(|e| RotatorError::Parse(format!("malformed PEM block: {e}")))?;
    if pem.label != "CERTIFICATE" {
        return Err(RotatorError::Parse(format!(
            "expected a CERTIFICATE block, found {}",
            pem.label
        )));
    }

    let certificate = pem
        .parse_x509()
        .map_err(|e| RotatorError::Parse(format!("malformed certificate: {e}")))?;

    let cn = match certificate.subject().iter_common_name().next() {
        Some(cn) => cn
            .as_str()
            .map(str::to_string)
            .map_err(|e| RotatorError::Parse(format!("unreadable common name: {e}")))?,
        None => String::new(),
    };
    Ok(cn)
}

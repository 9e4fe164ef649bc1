//! RSA key pair generation and self-signed certificates.
//!
//! The identity service only accepts externally generated keys as x509
//! certificates, so every fresh key pair is wrapped in a self-signed
//! certificate whose subject common name carries the owner label.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SerialNumber};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

use crate::crypto::random;
use crate::error::{Result, RotatorError};
use crate::time::to_offset_date_time;

/// Modulus size of every minted key.
pub const RSA_KEY_BITS: usize = 2048;

/// A freshly minted private key and its self-signed certificate.
///
/// The private key PEM is zeroized on drop.
pub struct KeyMaterial {
    /// PKCS#8 private key in a `PRIVATE KEY` PEM block.
    pub private_key_pem: Zeroizing<String>,
    /// DER certificate in a `CERTIFICATE` PEM block.
    pub certificate_pem: String,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("private_key_pem", &"<redacted>")
            .field("certificate_pem", &self.certificate_pem)
            .finish()
    }
}

/// Produces key material bound to a label and a validity window.
pub trait KeyMinter: Send + Sync {
    fn mint(
        &self,
        label: &str,
        not_before: DateTime<FixedOffset>,
        not_after: DateTime<FixedOffset>,
    ) -> Result<KeyMaterial>;
}

/// Mints RSA-2048 keys with `rsa` and self-signs them with `rcgen`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RsaKeyMinter;

impl KeyMinter for RsaKeyMinter {
    fn mint(
        &self,
        label: &str,
        not_before: DateTime<FixedOffset>,
        not_after: DateTime<FixedOffset>,
    ) -> Result<KeyMaterial> {
        let serial = random::serial_number()?;

        let private_key = RsaPrivateKey::new(&mut rand::rngs::OsRng, RSA_KEY_BITS)
            .map_err(|e| RotatorError::Crypto(format!("rsa key generation: {e}")))?;
        let private_key_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| RotatorError::Crypto(format!("pkcs8 encoding: {e}")))?;

        let signer = KeyPair::from_pem_and_sign_algo(&private_key_pem, &rcgen::PKCS_RSA_SHA256)
            .map_err(|e| RotatorError::Crypto(format!("loading signing key: {e}")))?;

        let mut subject = DistinguishedName::new();
        subject.push(DnType::CommonName, label);

        let mut params = CertificateParams::default();
        params.serial_number = Some(SerialNumber::from_slice(&serial));
        params.not_before = to_offset_date_time(&not_before)?;
        params.not_after = to_offset_date_time(&not_after)?;
        params.distinguished_name = subject;

        let certificate = params
            .self_signed(&signer)
            .map_err(|e| RotatorError::Crypto(format!("self-signing certificate: {e}")))?;

        Ok(KeyMaterial {
            private_key_pem,
            certificate_pem: certificate.pem(),
        })
    }
}

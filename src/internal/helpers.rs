//! Internal helper functions.

use pgp::crypto::public_key::PublicKeyAlgorithm;
use pgp::types::KeyDetails;

use crate::types::RecipientId;

/// Get the key ID as a hex string.
pub(crate) fn keyid_to_hex(key: &impl KeyDetails) -> String {
    hex::encode_upper(key.key_id().as_ref())
}

/// Whether `key` is the recipient named by a session key packet.
///
/// Anonymous recipients never match.
pub(crate) fn is_recipient(recipient: &RecipientId, key: &impl KeyDetails) -> bool {
    match recipient {
        RecipientId::KeyId(id) => key.key_id().as_ref() == id.as_slice(),
        RecipientId::Fingerprint(fp) => key.fingerprint().as_bytes() == fp.as_slice(),
        RecipientId::Anonymous => false,
    }
}

/// Get a normalized algorithm name for log output.
pub(crate) fn algorithm_name(key: &impl KeyDetails) -> String {
    match key.algorithm() {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
            "RSA".to_string()
        }
        PublicKeyAlgorithm::EdDSALegacy | PublicKeyAlgorithm::Ed25519 => "EdDSA".to_string(),
        PublicKeyAlgorithm::ECDH => "ECDH".to_string(),
        PublicKeyAlgorithm::ECDSA => "ECDSA".to_string(),
        PublicKeyAlgorithm::X25519 => "X25519".to_string(),
        PublicKeyAlgorithm::X448 => "X448".to_string(),
        PublicKeyAlgorithm::Elgamal => "Elgamal".to_string(),
        algo => format!("{:?}", algo),
    }
}

//! Key validity policy.
//!
//! rpgp doesn't have a policy system, so the checks that decide whether a
//! key may receive a session key live here:
//! - algorithm capability
//! - encryption key flags on binding and self signatures, with the algorithm
//!   deciding alone when no signature carries key flags
//! - subkey expiration and revocation

use std::time::SystemTime;

use pgp::composed::{SignedPublicKey, SignedPublicSubKey};
use pgp::packet::{Signature, SignatureType, SubpacketData};
use pgp::types::PublicKeyTrait;

/// Check if a key has expired based on its creation time and validity period.
pub(crate) fn is_key_expired(creation_time: SystemTime, validity_seconds: Option<u64>) -> bool {
    match validity_seconds {
        Some(0) | None => false,
        Some(validity) => creation_time + std::time::Duration::from_secs(validity) < SystemTime::now(),
    }
}

/// Check if a subkey is revoked.
pub(crate) fn is_subkey_revoked(subkey: &SignedPublicSubKey) -> bool {
    subkey
        .signatures
        .iter()
        .any(|sig| sig.typ() == Some(SignatureType::SubkeyRevocation))
}

/// Check if a subkey is usable (not expired, not revoked).
pub(crate) fn is_subkey_valid(subkey: &SignedPublicSubKey) -> bool {
    if is_subkey_revoked(subkey) {
        return false;
    }

    // expiration comes from the most recent binding signature
    if let Some(validity) = subkey.signatures.last().and_then(|sig| sig.key_expiration_time()) {
        let creation_time: SystemTime = (*subkey.key.created_at()).into();
        if is_key_expired(creation_time, Some(validity.num_seconds() as u64)) {
            return false;
        }
    }

    true
}

/// Whether the signature's hashed area has a key flags subpacket at all.
fn has_key_flags(sig: &Signature) -> bool {
    sig.config().is_some_and(|config| {
        config
            .hashed_subpackets()
            .any(|packet| matches!(packet.data, SubpacketData::KeyFlags(_)))
    })
}

/// Encryption permission granted by key flags.
///
/// `None` when no signature carries a key flags subpacket.
pub(crate) fn encryption_flags<'a>(signatures: impl Iterator<Item = &'a Signature>) -> Option<bool> {
    let mut flagged = false;
    for sig in signatures.filter(|sig| has_key_flags(sig)) {
        let flags = sig.key_flags();
        if flags.encrypt_comms() || flags.encrypt_storage() {
            return Some(true);
        }
        flagged = true;
    }
    flagged.then_some(false)
}

/// Whether a subkey may receive a session key.
pub(crate) fn subkey_can_encrypt(subkey: &SignedPublicSubKey) -> bool {
    subkey.key.is_encryption_key()
        && encryption_flags(subkey.signatures.iter()).unwrap_or(true)
        && is_subkey_valid(subkey)
}

/// Whether the primary key itself may receive a session key.
///
/// The flags come from user id self-signatures or direct-key signatures.
pub(crate) fn primary_can_encrypt(key: &SignedPublicKey) -> bool {
    if !key.primary_key.is_encryption_key() {
        return false;
    }
    let user_sigs = key.details.users.iter().flat_map(|user| user.signatures.iter());
    encryption_flags(user_sigs.chain(key.details.direct_signatures.iter())).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_key_expiry() {
        let long_ago = SystemTime::now() - Duration::from_secs(3600);
        assert!(!is_key_expired(long_ago, None));
        assert!(!is_key_expired(long_ago, Some(0)));
        assert!(is_key_expired(long_ago, Some(60)));
        assert!(!is_key_expired(long_ago, Some(7200)));
    }

    #[test]
    fn test_no_signatures_means_no_flags() {
        assert_eq!(encryption_flags(std::iter::empty()), None);
    }
}

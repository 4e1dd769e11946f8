//! Key selection.
//!
//! Picks the key that receives the session key on encryption, and the
//! private key that unwraps it on decryption.

use pgp::composed::{SignedPublicKey, SignedPublicSubKey, SignedSecretKey};
use pgp::types::Password;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::internal::{algorithm_name, is_recipient, keyid_to_hex, primary_can_encrypt, subkey_can_encrypt};
use crate::keyring::{PublicKeyrings, SecretKeyrings};
use crate::types::RecipientId;

/// A public key chosen to receive the session key.
#[derive(Debug, Clone, Copy)]
pub enum EncryptionKey<'a> {
    /// The primary key of a keyring
    Primary(&'a SignedPublicKey),
    /// A subkey of a keyring
    Subkey(&'a SignedPublicSubKey),
}

impl EncryptionKey<'_> {
    /// Key ID as an uppercase hex string.
    pub fn key_id(&self) -> String {
        match self {
            EncryptionKey::Primary(key) => keyid_to_hex(&key.primary_key),
            EncryptionKey::Subkey(subkey) => keyid_to_hex(&subkey.key),
        }
    }

    /// Normalized algorithm name.
    pub fn algorithm(&self) -> String {
        match self {
            EncryptionKey::Primary(key) => algorithm_name(&key.primary_key),
            EncryptionKey::Subkey(subkey) => algorithm_name(&subkey.key),
        }
    }
}

/// Which key of a secret keyring was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySlot {
    Primary,
    Subkey(usize),
}

/// Secret key material selected for decryption, still locked.
#[derive(Debug, Clone, Copy)]
pub struct PrivateKeyMaterial<'a> {
    keyring: &'a SignedSecretKey,
    slot: KeySlot,
}

impl<'a> PrivateKeyMaterial<'a> {
    /// The keyring holding the selected key.
    pub fn keyring(&self) -> &'a SignedSecretKey {
        self.keyring
    }

    /// Which key of the keyring was selected.
    pub fn slot(&self) -> KeySlot {
        self.slot
    }

    /// Key ID as an uppercase hex string.
    pub fn key_id(&self) -> String {
        match self.slot {
            KeySlot::Primary => keyid_to_hex(&self.keyring.primary_key),
            KeySlot::Subkey(i) => keyid_to_hex(&self.keyring.secret_subkeys[i].key),
        }
    }

    /// Decrypt the secret parameters with `password` and discard the result.
    ///
    /// Keys stored without protection unlock with any password.
    ///
    /// # Errors
    /// * [`Error::Passphrase`] - the secret material could not be decrypted
    pub fn unlock(&self, password: &Password) -> Result<()> {
        let outcome = match self.slot {
            KeySlot::Primary => self.keyring.primary_key.unlock(password, |_, _| Ok(())),
            KeySlot::Subkey(i) => self.keyring.secret_subkeys[i]
                .key
                .unlock(password, |_, _| Ok(())),
        };

        outcome.and_then(|inner| inner).map_err(|e| Error::Passphrase {
            key_id: self.key_id(),
            reason: e.to_string(),
        })
    }
}

/// Select the first key valid for encryption.
///
/// Keyrings are visited in order, and within a keyring the primary key comes
/// before its subkeys. The first qualifying key wins.
///
/// # Errors
/// * [`Error::NoUsableKey`] - no key in the collection may encrypt
pub fn select_encryption_key(keyrings: &PublicKeyrings) -> Result<EncryptionKey<'_>> {
    let mut checked = 0;

    for keyring in keyrings {
        checked += 1;
        if primary_can_encrypt(keyring) {
            let key = EncryptionKey::Primary(keyring);
            debug!(key_id = %key.key_id(), algorithm = %key.algorithm(), "selected primary key for encryption");
            return Ok(key);
        }

        for subkey in &keyring.public_subkeys {
            checked += 1;
            if subkey_can_encrypt(subkey) {
                let key = EncryptionKey::Subkey(subkey);
                debug!(key_id = %key.key_id(), algorithm = %key.algorithm(), "selected subkey for encryption");
                return Ok(key);
            }
        }
    }

    Err(Error::NoUsableKey { checked })
}

/// Select the private key that can unwrap a session key for `recipient`.
///
/// An anonymous recipient falls back to the very first private key only if
/// `allow_anonymous` is set; the result is then best-effort.
///
/// # Errors
/// * [`Error::NoMatchingKey`] - no key matches, or the recipient is
///   anonymous and the fallback is disabled
pub fn select_decryption_key<'a>(
    keyrings: &'a SecretKeyrings,
    recipient: &RecipientId,
    allow_anonymous: bool,
) -> Result<PrivateKeyMaterial<'a>> {
    if *recipient == RecipientId::Anonymous {
        if !allow_anonymous {
            return Err(Error::NoMatchingKey {
                target: None,
                checked: 0,
            });
        }
        let keyring = keyrings.iter().next().ok_or(Error::NoMatchingKey {
            target: None,
            checked: 0,
        })?;
        warn!(
            key_id = %keyid_to_hex(&keyring.primary_key),
            "anonymous recipient, using the first private key"
        );
        return Ok(PrivateKeyMaterial {
            keyring,
            slot: KeySlot::Primary,
        });
    }

    let mut checked = 0;
    for keyring in keyrings {
        checked += 1;
        if is_recipient(recipient, &keyring.primary_key) {
            debug!(key_id = %recipient, "matched primary key");
            return Ok(PrivateKeyMaterial {
                keyring,
                slot: KeySlot::Primary,
            });
        }

        for (index, subkey) in keyring.secret_subkeys.iter().enumerate() {
            checked += 1;
            if is_recipient(recipient, &subkey.key) {
                debug!(
                    key_id = %recipient,
                    algorithm = %algorithm_name(&subkey.key),
                    "matched subkey"
                );
                return Ok(PrivateKeyMaterial {
                    keyring,
                    slot: KeySlot::Subkey(index),
                });
            }
        }
    }

    Err(Error::NoMatchingKey {
        target: recipient.to_hex(),
        checked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::KeyringCollection;

    #[test]
    fn test_empty_collection_has_no_usable_key() {
        let keyrings: PublicKeyrings = KeyringCollection::new(Vec::new());
        assert!(matches!(
            select_encryption_key(&keyrings).unwrap_err(),
            Error::NoUsableKey { checked: 0 }
        ));
    }

    #[test]
    fn test_anonymous_requires_opt_in() {
        let keyrings: SecretKeyrings = KeyringCollection::new(Vec::new());
        let err = select_decryption_key(&keyrings, &RecipientId::Anonymous, false).unwrap_err();
        assert!(matches!(err, Error::NoMatchingKey { target: None, .. }));

        let err = select_decryption_key(&keyrings, &RecipientId::Anonymous, true).unwrap_err();
        assert!(matches!(err, Error::NoMatchingKey { target: None, checked: 0 }));
    }

    #[test]
    fn test_unknown_key_id_reports_target() {
        let keyrings: SecretKeyrings = KeyringCollection::new(Vec::new());
        let recipient = RecipientId::KeyId([0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 1]);
        match select_decryption_key(&keyrings, &recipient, false).unwrap_err() {
            Error::NoMatchingKey { target, checked } => {
                assert_eq!(target.as_deref(), Some("DEADBEEF00000001"));
                assert_eq!(checked, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

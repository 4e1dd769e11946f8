//! Decryption pipeline.
//!
//! This module decrypts OpenPGP messages using secret key material. Each
//! stage fails with its own error so callers can tell a wrong key from a
//! wrong passphrase, a non-OpenPGP input and a tampered message.

use pgp::composed::Message;
use pgp::packet::{Packet, PacketParser, PublicKeyEncryptedSessionKey};
use pgp::types::Password;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::armor::{self, ArmoredBlock};
use crate::error::{Error, Result};
use crate::keyring::{resolve_secret, SecretKeyrings};
use crate::select::{select_decryption_key, PrivateKeyMaterial};
use crate::types::{ArmorKind, Options, RecipientId};

/// Decrypt an armored message with already-resolved secret keyrings.
///
/// # Arguments
/// * `message` - The normalized `PGP MESSAGE` block
/// * `keyrings` - Secret keyrings to pick the recipient key from
/// * `passphrase` - Passphrase of the recipient key; `None` or empty tries
///   the empty passphrase once
/// * `options` - Engine options
///
/// # Returns
/// The literal data payload.
///
/// # Errors
/// * [`Error::NoEncryptedData`] - no public-key encrypted session key packet
/// * [`Error::NoMatchingKey`] - no private key matches the recipient
/// * [`Error::Passphrase`] - the recipient key could not be unlocked
/// * [`Error::Integrity`] - the message was altered or cannot be decrypted
/// * [`Error::UnexpectedPacket`] - the decrypted content is not literal data
pub fn decrypt_with_keyrings(
    message: &ArmoredBlock,
    keyrings: &SecretKeyrings,
    passphrase: Option<&Zeroizing<String>>,
    options: &Options,
) -> Result<Vec<u8>> {
    // the markers were intact, so a payload that does not decode was altered
    let data = message.decode().map_err(|e| match message.kind() {
        ArmorKind::Message => Error::Integrity(format!("armored ciphertext was altered: {e}")),
        _ => e,
    })?;

    let recipient = find_recipient(&data)?;
    debug!(recipient = %recipient, "found session key packet");

    let key = select_decryption_key(keyrings, &recipient, options.allow_anonymous_recipient)?;
    let password = unlock(&key, passphrase)?;

    let parsed = Message::from_bytes(&data[..])
        .map_err(|e| Error::Integrity(format!("ciphertext packets are corrupted: {e}")))?;
    let decrypted = parsed
        .decrypt(&password, key.keyring())
        .map_err(|e| Error::Integrity(format!("decrypting message failed: {e}")))?;

    let mut content = if decrypted.is_compressed() {
        decrypted
            .decompress()
            .map_err(|e| Error::Integrity(format!("decompressing message failed: {e}")))?
    } else {
        decrypted
    };

    if !matches!(content, Message::Literal { .. }) {
        return Err(Error::UnexpectedPacket {
            found: message_kind(&content),
        });
    }

    // the integrity tag is verified once the literal data is read to the end
    let plaintext = content
        .as_data_vec()
        .map_err(|e| Error::Integrity(format!("reading literal data failed: {e}")))?;

    debug!(key_id = %key.key_id(), plaintext_len = plaintext.len(), "message decrypted");
    Ok(plaintext)
}

/// Decrypt an armored message with an armored private key.
///
/// # Arguments
/// * `ciphertext` - ASCII-armored `PGP MESSAGE` text, possibly untidy
/// * `private_key` - ASCII-armored private key text, possibly untidy
/// * `passphrase` - Passphrase of the private key, if any
/// * `options` - Engine options
///
/// # Errors
/// * [`Error::Armor`] - either input has no usable armored block
/// * [`Error::WrongKeyType`] - a public key was given as the private key
/// * [`Error::KeyParse`] - the private key could not be decoded
/// * any error of [`decrypt_with_keyrings`]
pub fn decrypt_bytes(
    ciphertext: &str,
    private_key: &str,
    passphrase: Option<&Zeroizing<String>>,
    options: &Options,
) -> Result<Vec<u8>> {
    let key_block = armor::normalize(private_key)?;
    let keyrings = resolve_secret(&key_block)?;
    let message = armor::normalize(ciphertext)?;
    decrypt_with_keyrings(&message, &keyrings, passphrase, options)
}

/// Recipient of the first supported public-key encrypted session key packet.
fn find_recipient(data: &[u8]) -> Result<RecipientId> {
    let mut inspected = 0;

    for packet in PacketParser::new(data) {
        inspected += 1;
        let pkesk = match packet {
            Ok(Packet::PublicKeyEncryptedSessionKey(pkesk)) => pkesk,
            Ok(_) => continue,
            Err(e) => {
                warn!(index = inspected, error = %e, "skipping unparseable ciphertext packet");
                continue;
            }
        };

        match pkesk {
            PublicKeyEncryptedSessionKey::V3 { id, .. } if id.is_wildcard() => {
                return Ok(RecipientId::Anonymous)
            }
            PublicKeyEncryptedSessionKey::V3 { id, .. } => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(id.as_ref());
                return Ok(RecipientId::KeyId(bytes));
            }
            PublicKeyEncryptedSessionKey::V6 {
                fingerprint: Some(fingerprint),
                ..
            } => return Ok(RecipientId::Fingerprint(fingerprint.as_bytes().to_vec())),
            PublicKeyEncryptedSessionKey::V6 { fingerprint: None, .. } => {
                return Ok(RecipientId::Anonymous)
            }
            PublicKeyEncryptedSessionKey::Other { version, .. } => {
                debug!(index = inspected, version, "skipping unsupported session key packet version")
            }
        }
    }

    Err(Error::NoEncryptedData { inspected })
}

/// Unlock the selected key, returning the password that worked.
///
/// A non-empty passphrase is tried exactly once. Without one, the empty
/// passphrase is tried once for keys stored unprotected.
fn unlock(key: &PrivateKeyMaterial<'_>, passphrase: Option<&Zeroizing<String>>) -> Result<Password> {
    let supplied = passphrase
        .map(|p| p.as_str())
        .filter(|p| !p.is_empty());

    let password = match supplied {
        Some(p) => Password::from(p),
        None => {
            debug!(key_id = %key.key_id(), "no passphrase supplied, trying the empty passphrase");
            Password::empty()
        }
    };

    key.unlock(&password).map_err(|e| match (e, supplied) {
        (Error::Passphrase { key_id, .. }, None) => Error::Passphrase {
            key_id,
            reason: "key is passphrase protected and no passphrase was supplied".to_string(),
        },
        (Error::Passphrase { key_id, .. }, Some(_)) => Error::Passphrase {
            key_id,
            reason: "wrong passphrase".to_string(),
        },
        (other, _) => other,
    })?;

    Ok(password)
}

fn message_kind(message: &Message<'_>) -> &'static str {
    match message {
        Message::Literal { .. } => "literal data",
        Message::Compressed { .. } => "compressed data",
        Message::Encrypted { .. } => "encrypted data",
        _ => "signed data",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armor::encode;
    use crate::keyring::KeyringCollection;

    const TAG_PKESK: u8 = 1;

    fn pkesk_v3(id: [u8; 8]) -> Vec<u8> {
        // version, key id, RSA, one 8-bit MPI
        let mut body = vec![3];
        body.extend_from_slice(&id);
        body.extend_from_slice(&[1, 0, 8, 0xAA]);
        let mut packet = vec![0xC0 | TAG_PKESK, body.len() as u8];
        packet.extend(body);
        packet
    }

    #[test]
    fn test_recipient_after_marker_packet() {
        let mut data = vec![0xC0 | 10, 3, b'P', b'G', b'P'];
        data.extend(pkesk_v3([9, 8, 7, 6, 5, 4, 3, 2]));
        assert_eq!(
            find_recipient(&data).unwrap(),
            RecipientId::KeyId([9, 8, 7, 6, 5, 4, 3, 2])
        );
    }

    #[test]
    fn test_wildcard_key_id_is_anonymous() {
        assert_eq!(find_recipient(&pkesk_v3([0; 8])).unwrap(), RecipientId::Anonymous);
    }

    #[test]
    fn test_no_session_key_packet() {
        let data = vec![0xC0 | 10, 3, b'P', b'G', b'P'];
        assert!(matches!(
            find_recipient(&data).unwrap_err(),
            Error::NoEncryptedData { inspected: 1 }
        ));
    }

    #[test]
    fn test_altered_armor_is_integrity_error() {
        let mut text = encode(ArmorKind::Message, &pkesk_v3([1; 8])).unwrap().to_armored_string();
        // swap one payload character without touching the checksum
        let pos = text.find("\n\n").unwrap() + 3;
        let replacement = if &text[pos..pos + 1] == "A" { "B" } else { "A" };
        text.replace_range(pos..pos + 1, replacement);

        let block = armor::normalize(&text).unwrap();
        let keyrings: SecretKeyrings = KeyringCollection::new(Vec::new());
        let err = decrypt_with_keyrings(&block, &keyrings, None, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)), "got {err}");
    }

    #[test]
    fn test_undecodable_payload_is_integrity_error() {
        let mut text = encode(ArmorKind::Message, &pkesk_v3([1; 8])).unwrap().to_armored_string();
        let pos = text.find("\n\n").unwrap() + 6;
        text.replace_range(pos..pos + 1, "=");

        let block = armor::normalize(&text).unwrap();
        let keyrings: SecretKeyrings = KeyringCollection::new(Vec::new());
        let err = decrypt_with_keyrings(&block, &keyrings, None, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)), "got {err}");
    }

    #[test]
    fn test_unknown_recipient_is_no_matching_key() {
        let block = encode(ArmorKind::Message, &pkesk_v3([1; 8])).unwrap();
        let keyrings: SecretKeyrings = KeyringCollection::new(Vec::new());
        let err = decrypt_with_keyrings(&block, &keyrings, None, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::NoMatchingKey { .. }));
    }
}

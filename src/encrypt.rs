//! Encryption pipeline.
//!
//! Wraps the plaintext in a binary literal data packet, compresses it,
//! encrypts it under a fresh AES-256 session key in an integrity protected
//! (SEIPD v1) packet, wraps the session key for the recipient and armors the
//! result as a `PGP MESSAGE` block.

use pgp::composed::MessageBuilder;
use rand::thread_rng;
use tracing::debug;

use crate::armor::{self, ArmoredBlock};
use crate::backend;
use crate::error::{Error, Result};
use crate::keyring::resolve_public;
use crate::select::{select_encryption_key, EncryptionKey};
use crate::types::Options;

/// Encrypt bytes to a selected recipient key.
///
/// Either the whole armored message is returned or nothing is.
///
/// # Arguments
/// * `plaintext` - The data to encrypt
/// * `recipient` - The key that receives the session key
/// * `options` - Compression preference
///
/// # Errors
/// * [`Error::CryptoBackend`] - no supported compression algorithm
/// * [`Error::Encoding`] - the packet stream could not be composed
pub fn encrypt_to_key(
    plaintext: &[u8],
    recipient: &EncryptionKey<'_>,
    options: &Options,
) -> Result<ArmoredBlock> {
    let backend = backend::init()?;
    let compression = backend.choose_compression(&options.compression)?;
    let mut rng = thread_rng();

    // literal data: binary, empty file name
    let mut builder = MessageBuilder::from_bytes("", plaintext.to_vec())
        .seipd_v1(&mut rng, backend.symmetric());
    builder.compression(compression);

    let wrapped = match recipient {
        EncryptionKey::Primary(key) => builder.encrypt_to_key(&mut rng, &key.primary_key),
        EncryptionKey::Subkey(subkey) => builder.encrypt_to_key(&mut rng, *subkey),
    };
    wrapped
        .map(|_| ())
        .map_err(|e| Error::Encoding(format!("wrapping session key failed: {e}")))?;

    let armored = builder
        .to_armored_string(&mut rng, None.into())
        .map_err(|e| Error::Encoding(format!("composing message packets failed: {e}")))?;

    debug!(
        recipient = %recipient.key_id(),
        algorithm = %recipient.algorithm(),
        compression = ?compression,
        plaintext_len = plaintext.len(),
        armored_len = armored.len(),
        "message encrypted"
    );

    // canonical form: no armor headers, single trailing newline
    armor::normalize(&armored)
}

/// Encrypt bytes to the first encryption-capable key of an armored public key.
///
/// # Arguments
/// * `public_key` - ASCII-armored public key text, possibly untidy
/// * `plaintext` - The data to encrypt
/// * `options` - Engine options
///
/// # Returns
/// The ASCII-armored `PGP MESSAGE` text, ending in a newline.
///
/// # Errors
/// * [`Error::Armor`] - the key text has no usable armored block
/// * [`Error::KeyParse`] / [`Error::WrongKeyType`] - the block is not a public key
/// * [`Error::NoUsableKey`] - no key may encrypt
pub fn encrypt_bytes(public_key: &str, plaintext: &[u8], options: &Options) -> Result<String> {
    let block = armor::normalize(public_key)?;
    let keyrings = resolve_public(&block)?;
    let recipient = select_encryption_key(&keyrings)?;
    encrypt_to_key(plaintext, &recipient, options).map(|block| block.to_armored_string())
}

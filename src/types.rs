//! Public type definitions for the wxcrypt engine.
//!
//! This module contains the data structures shared between the armor,
//! keyring, selection and pipeline modules.

use std::fmt;

use pgp::armor::BlockType;
use pgp::types::CompressionAlgorithm;

/// The kind named in an armor `BEGIN`/`END` marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmorKind {
    /// `PUBLIC KEY BLOCK`
    PublicKey,
    /// `PRIVATE KEY BLOCK` (also accepts the older `SECRET KEY BLOCK`)
    PrivateKey,
    /// `MESSAGE`
    Message,
    /// `SIGNATURE`
    Signature,
    /// Any other label, kept verbatim
    Other(String),
}

impl ArmorKind {
    /// Parse the label that follows `BEGIN PGP ` / `END PGP `.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "PUBLIC KEY BLOCK" => ArmorKind::PublicKey,
            "PRIVATE KEY BLOCK" | "SECRET KEY BLOCK" => ArmorKind::PrivateKey,
            "MESSAGE" => ArmorKind::Message,
            "SIGNATURE" => ArmorKind::Signature,
            other => ArmorKind::Other(other.to_string()),
        }
    }

    /// The label written into marker lines.
    pub fn label(&self) -> &str {
        match self {
            ArmorKind::PublicKey => "PUBLIC KEY BLOCK",
            ArmorKind::PrivateKey => "PRIVATE KEY BLOCK",
            ArmorKind::Message => "MESSAGE",
            ArmorKind::Signature => "SIGNATURE",
            ArmorKind::Other(label) => label,
        }
    }

    /// The rpgp armor block type, if rpgp knows this kind.
    pub fn block_type(&self) -> Option<BlockType> {
        match self {
            ArmorKind::PublicKey => Some(BlockType::PublicKey),
            ArmorKind::PrivateKey => Some(BlockType::PrivateKey),
            ArmorKind::Message => Some(BlockType::Message),
            ArmorKind::Signature => Some(BlockType::Signature),
            ArmorKind::Other(label) if label == "ARMORED FILE" => Some(BlockType::File),
            ArmorKind::Other(_) => None,
        }
    }
}

impl fmt::Display for ArmorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recipient named by a public-key encrypted session key packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientId {
    /// v3 packet: 8-octet key id
    KeyId([u8; 8]),
    /// v6 packet: fingerprint (without its version octet)
    Fingerprint(Vec<u8>),
    /// Wildcard key id or omitted fingerprint
    Anonymous,
}

impl RecipientId {
    /// Uppercase hex form, `None` for anonymous recipients.
    pub fn to_hex(&self) -> Option<String> {
        match self {
            RecipientId::KeyId(id) => Some(hex::encode_upper(id)),
            RecipientId::Fingerprint(fp) => Some(hex::encode_upper(fp)),
            RecipientId::Anonymous => None,
        }
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_hex() {
            Some(hex) => f.write_str(&hex),
            None => f.write_str("anonymous"),
        }
    }
}

/// Language of the human-readable failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    English,
    Chinese,
}

/// Engine options.
///
/// The symmetric cipher is always AES-256 and is not part of the options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Compression algorithms in order of preference. The first one the
    /// backend supports is used.
    pub compression: Vec<CompressionAlgorithm>,
    /// Decrypt messages with an anonymous recipient using the first private
    /// key found. Unsafe with multi-key secret keyrings.
    pub allow_anonymous_recipient: bool,
    /// Language of boundary failure messages
    pub locale: Locale,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            compression: vec![
                CompressionAlgorithm::ZIP,
                CompressionAlgorithm::ZLIB,
                CompressionAlgorithm::Uncompressed,
            ],
            allow_anonymous_recipient: false,
            locale: Locale::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_kind_labels() {
        assert_eq!(ArmorKind::from_label("PUBLIC KEY BLOCK"), ArmorKind::PublicKey);
        assert_eq!(ArmorKind::from_label("SECRET KEY BLOCK"), ArmorKind::PrivateKey);
        assert_eq!(ArmorKind::PrivateKey.label(), "PRIVATE KEY BLOCK");
        assert_eq!(
            ArmorKind::from_label("ARMORED FILE"),
            ArmorKind::Other("ARMORED FILE".to_string())
        );
    }

    #[test]
    fn test_block_types() {
        assert_eq!(ArmorKind::Message.block_type(), Some(BlockType::Message));
        assert_eq!(ArmorKind::from_label("SECRET KEY BLOCK").block_type(), Some(BlockType::PrivateKey));
        assert_eq!(ArmorKind::from_label("ARMORED FILE").block_type(), Some(BlockType::File));
        assert_eq!(ArmorKind::from_label("COOKIE").block_type(), None);
    }

    #[test]
    fn test_recipient_hex() {
        let id = RecipientId::KeyId([0xAB, 0xCD, 0, 1, 2, 3, 4, 5]);
        assert_eq!(id.to_hex().as_deref(), Some("ABCD000102030405"));
        assert_eq!(RecipientId::Anonymous.to_string(), "anonymous");
    }

    #[test]
    fn test_default_options() {
        let opts = Options::default();
        assert_eq!(opts.compression[0], CompressionAlgorithm::ZIP);
        assert!(!opts.allow_anonymous_recipient);
        assert_eq!(opts.locale, Locale::English);
    }
}

//! Error types for the wxcrypt engine.
//!
//! Every failure that can cross the operation boundary is one variant of
//! [`Error`], and every variant belongs to exactly one [`ErrorCategory`].

use std::fmt;

use thiserror::Error;

/// A single failed keyring decoding strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    /// Name of the strategy that was attempted
    pub strategy: &'static str,
    /// Why it did not produce a keyring
    pub reason: String,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// The main error type for wxcrypt operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Armored text is malformed or missing its markers
    #[error("Malformed armored data: {0}")]
    Armor(String),

    /// The armor CRC-24 line does not match the decoded payload
    #[error("Armor checksum mismatch: expected {expected:06X}, computed {computed:06X}")]
    ArmorChecksum { expected: u32, computed: u32 },

    /// No strategy could decode a keyring
    #[error("Unable to parse keyring ({packets_inspected} packets inspected): {}", join_failures(.attempts))]
    KeyParse {
        attempts: Vec<StrategyFailure>,
        packets_inspected: usize,
    },

    /// A public key was supplied where a private key is required, or the reverse
    #[error("Wrong key type supplied: expected {expected}, found {found}")]
    WrongKeyType {
        expected: &'static str,
        found: &'static str,
    },

    /// No key in the collection may be used for encryption
    #[error("No key valid for encryption found ({checked} keys checked)")]
    NoUsableKey { checked: usize },

    /// No private key matches the recipient of the message
    #[error("No private key matches recipient {} ({checked} keys checked)", .target.as_deref().unwrap_or("<anonymous>"))]
    NoMatchingKey {
        target: Option<String>,
        checked: usize,
    },

    /// The secret key material could not be unlocked
    #[error("Unable to unlock secret key {key_id}: {reason}")]
    Passphrase { key_id: String, reason: String },

    /// A required algorithm is unavailable in the crypto backend
    #[error("Crypto backend unavailable: {0}")]
    CryptoBackend(String),

    /// The ciphertext holds no public-key encrypted session key
    #[error("No encrypted session key found ({inspected} packets inspected)")]
    NoEncryptedData { inspected: usize },

    /// Authenticated decryption failed
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// The decrypted content is not literal data
    #[error("Unexpected packet in decrypted content: {found}")]
    UnexpectedPacket { found: &'static str },

    /// Packet composition or text conversion failed
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

fn join_failures(attempts: &[StrategyFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A specialized Result type for wxcrypt operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure category reported across the operation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Armor,
    KeyParse,
    WrongKeyType,
    NoUsableKey,
    NoMatchingKey,
    Passphrase,
    CryptoBackend,
    NoEncryptedData,
    Integrity,
    UnexpectedPacket,
    Encoding,
}

impl ErrorCategory {
    /// Stable identifier for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Armor => "ArmorError",
            ErrorCategory::KeyParse => "KeyParseError",
            ErrorCategory::WrongKeyType => "WrongKeyTypeError",
            ErrorCategory::NoUsableKey => "NoUsableKeyError",
            ErrorCategory::NoMatchingKey => "NoMatchingKeyError",
            ErrorCategory::Passphrase => "PassphraseError",
            ErrorCategory::CryptoBackend => "CryptoBackendError",
            ErrorCategory::NoEncryptedData => "NoEncryptedDataError",
            ErrorCategory::Integrity => "IntegrityError",
            ErrorCategory::UnexpectedPacket => "UnexpectedPacketError",
            ErrorCategory::Encoding => "EncodingError",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// The boundary category this error is reported under.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Armor(_) | Error::ArmorChecksum { .. } => ErrorCategory::Armor,
            Error::KeyParse { .. } => ErrorCategory::KeyParse,
            Error::WrongKeyType { .. } => ErrorCategory::WrongKeyType,
            Error::NoUsableKey { .. } => ErrorCategory::NoUsableKey,
            Error::NoMatchingKey { .. } => ErrorCategory::NoMatchingKey,
            Error::Passphrase { .. } => ErrorCategory::Passphrase,
            Error::CryptoBackend(_) => ErrorCategory::CryptoBackend,
            Error::NoEncryptedData { .. } => ErrorCategory::NoEncryptedData,
            Error::Integrity(_) => ErrorCategory::Integrity,
            Error::UnexpectedPacket { .. } => ErrorCategory::UnexpectedPacket,
            Error::Encoding(_) => ErrorCategory::Encoding,
        }
    }
}

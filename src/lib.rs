//! # wxcrypt
//!
//! OpenPGP encryption and decryption of text messages using [rpgp](https://docs.rs/pgp).
//!
//! The engine takes ASCII-armored keys and messages the way users paste them
//! (with stray whitespace, headers and junk characters) and provides:
//!
//! - **Armor normalization**: Recover a strict armored block from untidy text
//! - **Keyring resolution**: Decode public and private keyrings, with a
//!   packet-scan fallback for public keys
//! - **Key selection**: Pick the encryption key or the matching private key
//! - **Encryption/Decryption**: AES-256, integrity protected, compressed
//!
//! ## Quick Start
//!
//! ```no_run
//! use wxcrypt::*;
//!
//! # let public_key = "";
//! # let private_key = "";
//! let ciphertext = encrypt("Hello!", public_key).unwrap();
//!
//! let plaintext = decrypt(&ciphertext, private_key, Some("password")).unwrap();
//! assert_eq!(plaintext, "Hello!");
//! ```
//!
//! Failures are reported as a [`Failure`] with an [`ErrorCategory`] and a
//! localized message. The byte-level functions return the full [`Error`].
//!
//! ## Design
//!
//! This library uses a functional API - all operations are standalone
//! functions over armored text. Each call is independent; the only shared
//! state is the crypto backend, checked once per process by [`init`].

// Modules
mod error;
mod types;
mod internal;

mod armor;
mod keyring;
mod select;
mod backend;
mod encrypt;
mod decrypt;
mod api;

// Re-export error types
pub use error::{Error, ErrorCategory, Result, StrategyFailure};

// Re-export all public types
pub use types::{ArmorKind, Locale, Options, RecipientId};

// Operation boundary
pub use api::{decrypt, decrypt_with_options, encrypt, encrypt_with_options, Failure};

// Armor
pub use armor::{encode as armor_encode, normalize, ArmoredBlock};

// Keyrings and key selection
pub use keyring::{resolve_public, resolve_secret, KeyringCollection, PublicKeyrings, SecretKeyrings};
pub use select::{select_decryption_key, select_encryption_key, EncryptionKey, KeySlot, PrivateKeyMaterial};

// Backend
pub use backend::{init, negotiate, Backend, SYMMETRIC_ALGORITHM};

// Pipelines
pub use encrypt::{encrypt_bytes, encrypt_to_key};
pub use decrypt::{decrypt_bytes, decrypt_with_keyrings};

// Re-export rpgp types that appear in the public API
pub use pgp::composed::{SignedPublicKey, SignedSecretKey};
pub use pgp::types::CompressionAlgorithm;
pub use zeroize::Zeroizing;

//! Text operation boundary.
//!
//! The two operations a front end calls. Failures cross this boundary as a
//! [`Failure`]: a category plus a short localized message. Library
//! diagnostics stay in the logs.

use std::fmt;

use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::decrypt::decrypt_bytes;
use crate::encrypt::encrypt_bytes;
use crate::error::{Error, ErrorCategory};
use crate::types::{Locale, Options};

/// A failed operation as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Which stage failed
    pub category: ErrorCategory,
    /// Human-readable message in the requested locale
    pub message: String,
}

impl Failure {
    /// Build the boundary failure for an engine error.
    pub fn from_error(error: &Error, locale: Locale) -> Self {
        Self {
            category: error.category(),
            message: localized_message(error, locale),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

impl std::error::Error for Failure {}

fn localized_message(error: &Error, locale: Locale) -> String {
    match locale {
        Locale::English => english_message(error),
        Locale::Chinese => chinese_message(error),
    }
}

fn english_message(error: &Error) -> String {
    match error {
        Error::Armor(_) => "The text is not valid ASCII-armored OpenPGP data.".to_string(),
        Error::ArmorChecksum { .. } => "The armored data is damaged (checksum mismatch).".to_string(),
        Error::KeyParse { .. } => {
            "The key could not be read. Please check that it was copied completely.".to_string()
        }
        Error::WrongKeyType { expected, found } => {
            format!("Wrong key type supplied: a {expected} is required, but a {found} was given.")
        }
        Error::NoUsableKey { checked } => {
            format!("None of the {checked} keys can be used for encryption.")
        }
        Error::NoMatchingKey { target: None, .. } => {
            "The message does not name its recipient, so no private key can be chosen.".to_string()
        }
        Error::NoMatchingKey { checked, .. } => {
            format!("The message was not encrypted for this private key ({checked} keys checked).")
        }
        Error::Passphrase { .. } => "The passphrase is incorrect.".to_string(),
        Error::CryptoBackend(_) => "A required encryption algorithm is not available.".to_string(),
        Error::NoEncryptedData { .. } => "The text is not an encrypted OpenPGP message.".to_string(),
        Error::Integrity(_) => "The message has been altered or is corrupted.".to_string(),
        Error::UnexpectedPacket { .. } => "The decrypted message does not contain text.".to_string(),
        Error::Encoding(_) => "The message could not be encoded.".to_string(),
    }
}

fn chinese_message(error: &Error) -> String {
    match error {
        Error::Armor(_) => "文本不是有效的 ASCII 封装 OpenPGP 数据。".to_string(),
        Error::ArmorChecksum { .. } => "封装数据已损坏（校验和不匹配）。".to_string(),
        Error::KeyParse { .. } => {
            "无法读取密钥，请检查密钥是否复制完整。".to_string()
        }
        Error::WrongKeyType { expected, .. } => {
            let wanted = if *expected == "public key" { "公钥" } else { "私钥" };
            format!("密钥类型错误，此处需要{wanted}。")
        }
        Error::NoUsableKey { checked } => format!("{checked} 个密钥均不能用于加密。"),
        Error::NoMatchingKey { target: None, .. } => {
            "消息未指明接收者，无法选择私钥。".to_string()
        }
        Error::NoMatchingKey { checked, .. } => {
            format!("该消息不是用此私钥加密的（已检查 {checked} 个密钥）。")
        }
        Error::Passphrase { .. } => "密码错误。".to_string(),
        Error::CryptoBackend(_) => "所需的加密算法不可用。".to_string(),
        Error::NoEncryptedData { .. } => "文本不是 OpenPGP 加密消息。".to_string(),
        Error::Integrity(_) => "消息已被篡改或已损坏。".to_string(),
        Error::UnexpectedPacket { .. } => "解密后的消息不包含文本。".to_string(),
        Error::Encoding(_) => "消息编码失败。".to_string(),
    }
}

fn fail(operation: &'static str, error: Error, locale: Locale) -> Failure {
    let failure = Failure::from_error(&error, locale);
    warn!(operation, category = %failure.category, error = %error, "operation failed");
    failure
}

/// Encrypt a text message to an armored public key.
///
/// # Example
///
/// ```no_run
/// # let public_key = "";
/// let armored = wxcrypt::encrypt("hello", public_key).unwrap();
/// assert!(armored.starts_with("-----BEGIN PGP MESSAGE-----"));
/// ```
pub fn encrypt(message: &str, public_key: &str) -> Result<String, Failure> {
    encrypt_with_options(message, public_key, &Options::default())
}

/// Encrypt a text message with explicit options.
pub fn encrypt_with_options(message: &str, public_key: &str, options: &Options) -> Result<String, Failure> {
    match encrypt_bytes(public_key, message.as_bytes(), options) {
        Ok(armored) => {
            info!(operation = "encrypt", armored_len = armored.len(), "operation succeeded");
            Ok(armored)
        }
        Err(e) => Err(fail("encrypt", e, options.locale)),
    }
}

/// Decrypt an armored message to text with an armored private key.
///
/// `passphrase` may be `None` or empty for keys stored without protection.
pub fn decrypt(ciphertext: &str, private_key: &str, passphrase: Option<&str>) -> Result<String, Failure> {
    decrypt_with_options(ciphertext, private_key, passphrase, &Options::default())
}

/// Decrypt an armored message to text with explicit options.
pub fn decrypt_with_options(
    ciphertext: &str,
    private_key: &str,
    passphrase: Option<&str>,
    options: &Options,
) -> Result<String, Failure> {
    let passphrase = passphrase.map(|p| Zeroizing::new(p.to_string()));

    let plaintext = decrypt_bytes(ciphertext, private_key, passphrase.as_ref(), options)
        .and_then(|bytes| {
            String::from_utf8(bytes)
                .map_err(|e| Error::Encoding(format!("plaintext is not UTF-8 at byte {}", e.utf8_error().valid_up_to())))
        });

    match plaintext {
        Ok(text) => {
            info!(operation = "decrypt", plaintext_len = text.len(), "operation succeeded");
            Ok(text)
        }
        Err(e) => Err(fail("decrypt", e, options.locale)),
    }
}

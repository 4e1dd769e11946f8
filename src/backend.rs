//! Crypto backend initialization and capability negotiation.
//!
//! The backend is checked once per process: the fixed symmetric cipher must be
//! available and each candidate compression algorithm must survive a
//! compress/decompress self-test through rpgp. Later calls reuse the result.

use std::fmt::Debug;
use std::sync::OnceLock;

use pgp::composed::{Message, MessageBuilder};
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::types::CompressionAlgorithm;
use rand::thread_rng;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Symmetric cipher used for every message.
pub const SYMMETRIC_ALGORITHM: SymmetricKeyAlgorithm = SymmetricKeyAlgorithm::AES256;

const COMPRESSION_CANDIDATES: &[CompressionAlgorithm] = &[
    CompressionAlgorithm::ZIP,
    CompressionAlgorithm::ZLIB,
    CompressionAlgorithm::Uncompressed,
];

const SELF_TEST_DATA: &[u8] = b"wxcrypt backend self-test";

static BACKEND: OnceLock<Backend> = OnceLock::new();

/// Capabilities of the crypto backend, established once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    symmetric: SymmetricKeyAlgorithm,
    compression: Vec<CompressionAlgorithm>,
}

impl Backend {
    /// The negotiated symmetric cipher.
    pub fn symmetric(&self) -> SymmetricKeyAlgorithm {
        self.symmetric
    }

    /// Compression algorithms that passed the self-test.
    pub fn compression(&self) -> &[CompressionAlgorithm] {
        &self.compression
    }

    /// First algorithm of `preference` that this backend supports.
    ///
    /// # Errors
    /// * [`Error::CryptoBackend`] - none of the preferred algorithms is supported
    pub fn choose_compression(&self, preference: &[CompressionAlgorithm]) -> Result<CompressionAlgorithm> {
        negotiate("compression", preference, |alg| {
            if self.compression.contains(&alg) {
                Ok(())
            } else {
                Err(format!("{alg:?} failed the backend self-test"))
            }
        })
    }
}

/// Initialize the backend, running the self-test on first use.
///
/// Repeated calls return the same instance without testing again.
///
/// # Errors
/// * [`Error::CryptoBackend`] - a required algorithm is unavailable
pub fn init() -> Result<&'static Backend> {
    if let Some(backend) = BACKEND.get() {
        return Ok(backend);
    }
    let checked = self_test()?;
    // a racing initializer may have won; both results are equivalent
    Ok(BACKEND.get_or_init(|| checked))
}

fn self_test() -> Result<Backend> {
    let symmetric = negotiate("symmetric cipher", &[SYMMETRIC_ALGORITHM], |alg| {
        if alg.key_size() == 32 {
            Ok(())
        } else {
            Err(format!("{alg:?} has a {}-byte key", alg.key_size()))
        }
    })?;

    let compression: Vec<CompressionAlgorithm> = COMPRESSION_CANDIDATES
        .iter()
        .copied()
        .filter(|alg| match compression_round_trip(*alg) {
            Ok(()) => true,
            Err(reason) => {
                warn!(algorithm = ?alg, %reason, "compression algorithm unavailable");
                false
            }
        })
        .collect();

    debug!(symmetric = ?symmetric, compression = ?compression, "crypto backend initialized");
    Ok(Backend {
        symmetric,
        compression,
    })
}

/// Compress a short literal message and read it back.
fn compression_round_trip(alg: CompressionAlgorithm) -> std::result::Result<(), String> {
    let mut rng = thread_rng();
    let mut builder = MessageBuilder::from_bytes("", SELF_TEST_DATA.to_vec());
    builder.compression(alg);
    let bytes = builder.to_vec(&mut rng).map_err(|e| e.to_string())?;

    let message = Message::from_bytes(&bytes[..]).map_err(|e| e.to_string())?;
    let mut message = if message.is_compressed() {
        message.decompress().map_err(|e| e.to_string())?
    } else {
        message
    };
    let data = message.as_data_vec().map_err(|e| e.to_string())?;

    if data == SELF_TEST_DATA {
        Ok(())
    } else {
        Err("round trip altered the self-test data".to_string())
    }
}

/// Try candidates in order and return the first one `accept` approves.
///
/// # Errors
/// * [`Error::CryptoBackend`] - every candidate was rejected; the message
///   lists each candidate with its reason
pub fn negotiate<T, F>(capability: &str, candidates: &[T], mut accept: F) -> Result<T>
where
    T: Copy + Debug,
    F: FnMut(T) -> std::result::Result<(), String>,
{
    let mut rejected = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        match accept(candidate) {
            Ok(()) => {
                debug!(capability, choice = ?candidate, "negotiated");
                return Ok(candidate);
            }
            Err(reason) => rejected.push(format!("{candidate:?}: {reason}")),
        }
    }

    if rejected.is_empty() {
        return Err(Error::CryptoBackend(format!("no {capability} candidates configured")));
    }
    Err(Error::CryptoBackend(format!(
        "no usable {capability} ({})",
        rejected.join("; ")
    )))
}

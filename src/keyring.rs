//! Keyring resolution.
//!
//! Turns a normalized [`ArmoredBlock`] into a collection of rpgp keyrings.
//! Public keyrings are resolved by an ordered list of strategies: the armored
//! block is first decoded as a whole, and if rpgp rejects it the raw packet
//! stream is scanned for the first transferable public key. Secret keyrings
//! only use the whole-block decode.

use std::io::Cursor;

use pgp::composed::{Deserializable, SignedPublicKey, SignedSecretKey};
use pgp::packet::{Packet, PacketParser, PacketTrait};
use tracing::{debug, warn};

use crate::armor::ArmoredBlock;
use crate::error::{Error, Result, StrategyFailure};
use crate::types::ArmorKind;

/// An ordered set of keyrings decoded from one armored block.
#[derive(Debug, Clone)]
pub struct KeyringCollection<K> {
    keyrings: Vec<K>,
}

/// Public keyrings (transferable public keys).
pub type PublicKeyrings = KeyringCollection<SignedPublicKey>;

/// Secret keyrings (transferable secret keys).
pub type SecretKeyrings = KeyringCollection<SignedSecretKey>;

impl<K> KeyringCollection<K> {
    /// Wrap already-decoded keyrings.
    pub fn new(keyrings: Vec<K>) -> Self {
        Self { keyrings }
    }

    /// Iterate keyrings in block order.
    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keyrings.iter()
    }

    /// Number of keyrings.
    pub fn len(&self) -> usize {
        self.keyrings.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.keyrings.is_empty()
    }
}

impl<'a, K> IntoIterator for &'a KeyringCollection<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keyrings.iter()
    }
}

/// Result of a single strategy: the keyrings, or why it failed.
type StrategyResult<K> = std::result::Result<Vec<K>, String>;

/// A named way of decoding a block into keyrings.
struct Strategy<K> {
    name: &'static str,
    run: fn(&ArmoredBlock, &mut ScanStats) -> StrategyResult<K>,
}

/// What the strategies observed about the raw packet stream.
#[derive(Debug, Default)]
struct ScanStats {
    packets_inspected: usize,
    saw_public_key: bool,
    saw_secret_key: bool,
}

const PUBLIC_STRATEGIES: &[Strategy<SignedPublicKey>] = &[
    Strategy {
        name: "armored keyring",
        run: decode_public_collection,
    },
    Strategy {
        name: "packet scan",
        run: scan_public_keyring,
    },
];

const SECRET_STRATEGIES: &[Strategy<SignedSecretKey>] = &[Strategy {
    name: "armored keyring",
    run: decode_secret_collection,
}];

/// Try each strategy in order until one yields at least one keyring.
fn run_strategies<K>(
    block: &ArmoredBlock,
    strategies: &[Strategy<K>],
    stats: &mut ScanStats,
) -> std::result::Result<Vec<K>, Vec<StrategyFailure>> {
    let mut failures = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        match (strategy.run)(block, stats) {
            Ok(keyrings) => {
                debug!(strategy = strategy.name, keyrings = keyrings.len(), "keyring decoded");
                return Ok(keyrings);
            }
            Err(reason) => {
                warn!(strategy = strategy.name, %reason, "keyring strategy failed");
                failures.push(StrategyFailure {
                    strategy: strategy.name,
                    reason,
                });
            }
        }
    }
    Err(failures)
}

/// Resolve the public keyrings of a block.
///
/// # Errors
/// * [`Error::WrongKeyType`] - the block holds private key material
/// * [`Error::KeyParse`] - no strategy produced a public keyring
pub fn resolve_public(block: &ArmoredBlock) -> Result<PublicKeyrings> {
    if block.kind() == &ArmorKind::PrivateKey {
        return Err(Error::WrongKeyType {
            expected: "public key",
            found: "private key",
        });
    }

    let mut stats = ScanStats::default();
    match run_strategies(block, PUBLIC_STRATEGIES, &mut stats) {
        Ok(keyrings) => Ok(KeyringCollection::new(keyrings)),
        Err(_) if stats.saw_secret_key && !stats.saw_public_key => Err(Error::WrongKeyType {
            expected: "public key",
            found: "private key",
        }),
        Err(attempts) => Err(Error::KeyParse {
            attempts,
            packets_inspected: stats.packets_inspected,
        }),
    }
}

/// Resolve the secret keyrings of a block.
///
/// # Errors
/// * [`Error::WrongKeyType`] - the block holds only public key material
/// * [`Error::KeyParse`] - the block is not a secret keyring
pub fn resolve_secret(block: &ArmoredBlock) -> Result<SecretKeyrings> {
    if block.kind() == &ArmorKind::PublicKey {
        return Err(Error::WrongKeyType {
            expected: "private key",
            found: "public key",
        });
    }

    let mut stats = ScanStats::default();
    match run_strategies(block, SECRET_STRATEGIES, &mut stats) {
        Ok(keyrings) => Ok(KeyringCollection::new(keyrings)),
        Err(attempts) => {
            // a public keyring where a secret one was expected
            if let Ok(data) = block.decode() {
                inspect_packets(&data, &mut stats);
            }
            if stats.saw_public_key && !stats.saw_secret_key {
                return Err(Error::WrongKeyType {
                    expected: "private key",
                    found: "public key",
                });
            }
            Err(Error::KeyParse {
                attempts,
                packets_inspected: stats.packets_inspected,
            })
        }
    }
}

/// Decode every keyring of an armored block, keeping the ones rpgp accepts.
fn decode_many<K: Deserializable>(block: &ArmoredBlock) -> StrategyResult<K> {
    let text = block.to_armored_string();
    let cursor = Cursor::new(text.as_bytes());
    let (keys_iter, _headers) = K::from_reader_many(cursor).map_err(|e| e.to_string())?;

    let mut keyrings = Vec::new();
    let mut last_error = None;
    for key_result in keys_iter {
        match key_result {
            Ok(key) => keyrings.push(key),
            Err(e) => {
                warn!(error = %e, "skipping undecodable keyring");
                last_error = Some(e.to_string());
            }
        }
    }

    if keyrings.is_empty() {
        return Err(last_error.unwrap_or_else(|| "block contains no keyring".to_string()));
    }
    Ok(keyrings)
}

fn decode_public_collection(block: &ArmoredBlock, _stats: &mut ScanStats) -> StrategyResult<SignedPublicKey> {
    decode_many(block)
}

fn decode_secret_collection(block: &ArmoredBlock, _stats: &mut ScanStats) -> StrategyResult<SignedSecretKey> {
    decode_many(block)
}

impl ScanStats {
    fn record(&mut self, packet: &Packet) {
        match packet {
            Packet::PublicKey(_) => self.saw_public_key = true,
            Packet::SecretKey(_) => self.saw_secret_key = true,
            _ => {}
        }
    }
}

/// Count packets and note which kinds of primary key packets occur.
fn inspect_packets(data: &[u8], stats: &mut ScanStats) {
    stats.packets_inspected = 0;
    for packet in PacketParser::new(data) {
        stats.packets_inspected += 1;
        if let Ok(packet) = packet {
            stats.record(&packet);
        }
    }
}

/// Scan the raw packet stream for the first transferable public key.
///
/// Packets ahead of the first public key packet are skipped, as are packets
/// rpgp cannot parse; the keyring runs until the next primary key packet or
/// the end of the stream.
fn scan_public_keyring(block: &ArmoredBlock, stats: &mut ScanStats) -> StrategyResult<SignedPublicKey> {
    let data = block.decode().map_err(|e| e.to_string())?;

    let mut keyring: Vec<Packet> = Vec::new();
    let mut skipped = 0usize;

    for packet in PacketParser::new(&data[..]) {
        stats.packets_inspected += 1;
        let packet = match packet {
            Ok(packet) => packet,
            Err(e) => {
                debug!(index = stats.packets_inspected, error = %e, "skipping unparseable packet");
                skipped += 1;
                continue;
            }
        };
        debug!(index = stats.packets_inspected, tag = ?packet.tag(), "scanned packet");
        stats.record(&packet);

        let is_primary = matches!(packet, Packet::PublicKey(_) | Packet::SecretKey(_));
        if keyring.is_empty() {
            if matches!(packet, Packet::PublicKey(_)) {
                keyring.push(packet);
            }
        } else if is_primary {
            break;
        } else {
            keyring.push(packet);
        }
    }

    if keyring.is_empty() {
        return Err(format!(
            "no public key packet among {} packets ({skipped} unparseable)",
            stats.packets_inspected
        ));
    }

    let packets = keyring.into_iter().map(Ok).peekable();
    match SignedPublicKey::from_packets(packets).next() {
        Some(Ok(key)) => Ok(vec![key]),
        Some(Err(e)) => Err(e.to_string()),
        None => Err("public key packets did not form a keyring".to_string()),
    }
}

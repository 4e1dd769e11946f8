//! ASCII armor normalization, decoding and encoding.
//!
//! Armored text pasted by users is rarely pristine: byte-order marks,
//! indentation, stray header lines, missing separators and characters
//! outside the base64 alphabet all show up in practice. [`normalize`] turns
//! such text into a strict [`ArmoredBlock`], whose string form is:
//!
//! ```text
//! -----BEGIN PGP <KIND>-----
//!
//! <base64 lines>
//! =<crc24>
//! -----END PGP <KIND>-----
//! ```

use std::fmt;
use std::io::{self, Read};

use pgp::armor::{self as pgp_armor, ArmorCrc24Status, Dearmor};
use pgp::ser::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::ArmorKind;

const BEGIN_PREFIX: &str = "-----BEGIN PGP";
const END_PREFIX: &str = "-----END PGP";
const MARKER_SUFFIX: &str = "-----";

/// A cleaned, RFC 4880 conformant armored block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmoredBlock {
    kind: ArmorKind,
    lines: Vec<String>,
}

impl ArmoredBlock {
    /// The kind named by the begin and end markers.
    pub fn kind(&self) -> &ArmorKind {
        &self.kind
    }

    /// Whitespace-free base64 lines in input order, checksum line included.
    pub fn payload_lines(&self) -> &[String] {
        &self.lines
    }

    /// The trailing `=XXXX` checksum line without its `=`, if present.
    pub fn checksum(&self) -> Option<&str> {
        self.lines
            .last()
            .and_then(|line| line.strip_prefix('='))
            .filter(|sum| sum.len() == 4)
    }

    /// Render the block as armored text, always ending in a newline.
    pub fn to_armored_string(&self) -> String {
        let label = self.kind.label();
        let mut out = String::new();
        out.push_str(&format!("{BEGIN_PREFIX} {label}{MARKER_SUFFIX}\n\n"));
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!("{END_PREFIX} {label}{MARKER_SUFFIX}\n"));
        out
    }

    /// Decode the payload into the binary packet stream.
    ///
    /// rpgp's [`Dearmor`] reads the block. A checksum line, if present, must
    /// match the decoded bytes.
    ///
    /// # Errors
    /// * [`Error::Armor`] - rpgp rejects the payload or footer
    /// * [`Error::ArmorChecksum`] - the checksum does not match
    pub fn decode(&self) -> Result<Vec<u8>> {
        let text = self.to_armored_string();
        let mut dearmor = Dearmor::new(text.as_bytes());
        let mut data = Vec::new();
        dearmor
            .read_to_end(&mut data)
            .map_err(|e| Error::Armor(format!("invalid armored payload: {e}")))?;

        // rpgp only reports the footer checksum, the comparison happens here
        match dearmor.crc24_status() {
            ArmorCrc24Status::Unchecked { footer_crc } | ArmorCrc24Status::CheckedOk { crc: footer_crc } => {
                let computed = crc24::hash_raw(&data);
                if footer_crc != computed {
                    return Err(Error::ArmorChecksum {
                        expected: footer_crc,
                        computed,
                    });
                }
            }
            ArmorCrc24Status::CheckedInvalid {
                footer_crc,
                calculated_crc,
            } => {
                return Err(Error::ArmorChecksum {
                    expected: footer_crc,
                    computed: calculated_crc,
                })
            }
            ArmorCrc24Status::NoCrc24 if self.checksum().is_some() => {
                return Err(Error::Armor("checksum line was read as payload".to_string()));
            }
            ArmorCrc24Status::NoCrc24 => {}
        }

        Ok(data)
    }
}

impl fmt::Display for ArmoredBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_armored_string())
    }
}

/// Clean raw armored text into a strict [`ArmoredBlock`].
///
/// Only the first `BEGIN`/`END` pair is used; anything after the first end
/// marker is ignored.
///
/// # Errors
/// * [`Error::Armor`] - no begin marker, no end marker, mismatched end
///   marker, or no recoverable payload line
pub fn normalize(text: &str) -> Result<ArmoredBlock> {
    let content = text.trim().trim_start_matches('\u{feff}').trim();

    let mut kind: Option<ArmorKind> = None;
    let mut lines = Vec::new();
    let mut closed = false;
    let mut headers_dropped = 0usize;

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();

        let Some(current) = kind.as_ref() else {
            if let Some(label) = marker_label(line, BEGIN_PREFIX) {
                kind = Some(ArmorKind::from_label(label));
            }
            continue;
        };

        if let Some(label) = marker_label(line, END_PREFIX) {
            let end_kind = ArmorKind::from_label(label);
            if &end_kind != current {
                return Err(Error::Armor(format!(
                    "end marker kind '{end_kind}' does not match begin marker kind '{current}'"
                )));
            }
            closed = true;
            break;
        }

        if marker_label(line, BEGIN_PREFIX).is_some() {
            return Err(Error::Armor(format!(
                "second begin marker on line {} before an end marker",
                index + 1
            )));
        }

        if line.is_empty() {
            continue;
        }

        if is_header_line(line) {
            headers_dropped += 1;
            continue;
        }

        let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        let cleaned = if compact.chars().all(is_base64_char) {
            compact
        } else {
            let stripped: String = compact.chars().filter(|c| is_base64_char(*c)).collect();
            if stripped.is_empty() {
                warn!(line = index + 1, len = compact.len(), "discarding non-base64 armor line");
                continue;
            }
            warn!(
                line = index + 1,
                removed = compact.len() - stripped.len(),
                "stripped non-base64 characters from armor line"
            );
            stripped
        };

        lines.push(cleaned);
    }

    let kind = kind.ok_or_else(|| Error::Armor("no BEGIN PGP marker found".to_string()))?;
    if !closed {
        return Err(Error::Armor(format!("no END PGP {kind} marker found")));
    }
    if lines.is_empty() {
        return Err(Error::Armor("armored block has no payload".to_string()));
    }

    let block = ArmoredBlock { kind, lines };
    debug!(
        kind = %block.kind,
        lines = block.lines.len(),
        headers_dropped,
        has_checksum = block.checksum().is_some(),
        "normalized armored block"
    );
    Ok(block)
}

/// Binary packet data handed to rpgp's armor writer as is.
struct RawPackets<'a>(&'a [u8]);

impl Serialize for RawPackets<'_> {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> pgp::errors::Result<()> {
        writer.write_all(self.0)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.0.len()
    }
}

/// Armor binary packet data as a block of the given kind, with checksum.
///
/// # Errors
/// * [`Error::Armor`] - rpgp has no block type for `kind`
/// * [`Error::Encoding`] - rpgp failed to write the armor
pub fn encode(kind: ArmorKind, data: &[u8]) -> Result<ArmoredBlock> {
    let typ = kind
        .block_type()
        .ok_or_else(|| Error::Armor(format!("cannot armor a '{kind}' block")))?;

    let mut out = Vec::new();
    pgp_armor::write(&RawPackets(data), typ, &mut out, None, true)
        .map_err(|e| Error::Encoding(format!("writing armor failed: {e}")))?;
    let text = String::from_utf8(out).map_err(|e| Error::Encoding(format!("armor is not UTF-8: {e}")))?;

    normalize(&text)
}

/// Label of a `-----BEGIN PGP <label>-----` style marker line.
fn marker_label<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix)?.strip_suffix(MARKER_SUFFIX)
}

/// `Key: Value` lines such as `Version:`, `Comment:`, `Charset:`, `Hash:`.
fn is_header_line(line: &str) -> bool {
    let Some((key, _value)) = line.split_once(':') else {
        return false;
    };
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-')
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

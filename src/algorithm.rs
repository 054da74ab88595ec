//! Encoding algorithms (X.891 Abschnitt 10).
//!
//! Eingebaute Algorithmen (Id 0-9) sind fest; Ids 10-31 sind reserviert.
//! Ab Id 32 wird über die Algorithmus-URI-Tabelle des Dokuments auf einen
//! Codec aufgelöst, den die Anwendung per URI registriert hat
//! ([`AlgorithmRegistry::register`]).
//!
//! Für Character Chunks wird Text nicht eager erzeugt: der Decoder hält die
//! Rohbytes und ruft [`EncodingAlgorithm::to_text`] erst auf, wenn der
//! Aufrufer Text verlangt. Attributwerte werden sofort konvertiert.

use std::fmt::{self, Write};
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::FastHashMap;
use crate::constants::{
    BASE64, BOOLEAN, CDATA, DOUBLE, FLOAT, HEXADECIMAL, INT, LONG, SHORT, UUID,
};
use crate::{Error, Result};

/// Typed value produced by an encoding algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum AlgorithmValue {
    /// hexadecimal, base64
    Bytes(Vec<u8>),
    Shorts(Vec<i16>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Booleans(Vec<bool>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Uuids(Vec<u128>),
    /// cdata
    Text(String),
    /// Application algorithm without registered codec.
    Opaque(Vec<u8>),
}

/// Codec turning an octet range into a typed value or characters.
pub trait EncodingAlgorithm {
    /// Decodes `bytes` into a typed value.
    fn decode(&self, bytes: &[u8]) -> Result<AlgorithmValue>;

    /// Appends the character representation of `bytes` to `out`.
    fn to_text(&self, bytes: &[u8], out: &mut String) -> Result<()>;
}

/// The ten built-in algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInAlgorithm {
    Hexadecimal,
    Base64,
    Short,
    Int,
    Long,
    Boolean,
    Float,
    Double,
    Uuid,
    Cdata,
}

impl BuiltInAlgorithm {
    /// Built-in algorithm for `id`, `None` for ids above 9.
    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            HEXADECIMAL => Self::Hexadecimal,
            BASE64 => Self::Base64,
            SHORT => Self::Short,
            INT => Self::Int,
            LONG => Self::Long,
            BOOLEAN => Self::Boolean,
            FLOAT => Self::Float,
            DOUBLE => Self::Double,
            UUID => Self::Uuid,
            CDATA => Self::Cdata,
            _ => return None,
        })
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    /// Size of one item in octets (1 for byte oriented algorithms).
    fn item_size(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Long | Self::Double => 8,
            Self::Uuid => 16,
            _ => 1,
        }
    }

    /// Checks `bytes` without producing text, so a later `to_text` cannot fail.
    pub(crate) fn validate(self, bytes: &[u8]) -> Result<()> {
        self.check_length(bytes)?;
        match self {
            Self::Boolean => booleans(bytes).map(drop),
            Self::Cdata => utf8(bytes).map(drop),
            _ => Ok(()),
        }
    }

    fn check_length(self, bytes: &[u8]) -> Result<()> {
        let size = self.item_size();
        if bytes.len() % size != 0 {
            return Err(Error::malformed(format!(
                "{self:?} algorithm: {} octets is not a multiple of {size}",
                bytes.len()
            )));
        }
        Ok(())
    }
}

fn items<const N: usize>(bytes: &[u8]) -> impl Iterator<Item = [u8; N]> + '_ {
    bytes.chunks_exact(N).map(|c| {
        let mut a = [0u8; N];
        a.copy_from_slice(c);
        a
    })
}

/// Liest die Boolean-Bits: die ersten 4 Bit geben die ungenutzten Bits im letzten Oktett an.
fn booleans(bytes: &[u8]) -> Result<Vec<bool>> {
    let Some(&first) = bytes.first() else {
        return Err(Error::malformed("boolean algorithm: empty octet string"));
    };
    let unused = usize::from(first >> 4);
    let total_bits = bytes.len() * 8;
    if 4 + unused > total_bits {
        return Err(Error::malformed("boolean algorithm: unused bit count exceeds data"));
    }
    let count = total_bits - 4 - unused;
    Ok((4..4 + count)
        .map(|bit| bytes[bit / 8] & (0x80 >> (bit % 8)) != 0)
        .collect())
}

fn write_joined<T>(out: &mut String, values: impl Iterator<Item = T>, mut f: impl FnMut(&mut String, T)) {
    for (i, v) in values.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        f(out, v);
    }
}

fn write_float(out: &mut String, v: f64) {
    if v.is_nan() {
        out.push_str("NaN");
    } else if v.is_infinite() {
        out.push_str(if v > 0.0 { "INF" } else { "-INF" });
    } else {
        let _ = write!(out, "{v}");
    }
}

fn write_uuid(out: &mut String, v: u128) {
    let b = v.to_be_bytes();
    for (i, byte) in b.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        let _ = write!(out, "{byte:02x}");
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::InvalidCharacter("cdata algorithm: invalid UTF-8".into()))
}

impl EncodingAlgorithm for BuiltInAlgorithm {
    fn decode(&self, bytes: &[u8]) -> Result<AlgorithmValue> {
        self.check_length(bytes)?;
        Ok(match self {
            Self::Hexadecimal | Self::Base64 => AlgorithmValue::Bytes(bytes.to_vec()),
            Self::Short => AlgorithmValue::Shorts(items::<2>(bytes).map(i16::from_be_bytes).collect()),
            Self::Int => AlgorithmValue::Ints(items::<4>(bytes).map(i32::from_be_bytes).collect()),
            Self::Long => AlgorithmValue::Longs(items::<8>(bytes).map(i64::from_be_bytes).collect()),
            Self::Boolean => AlgorithmValue::Booleans(booleans(bytes)?),
            Self::Float => AlgorithmValue::Floats(items::<4>(bytes).map(f32::from_be_bytes).collect()),
            Self::Double => AlgorithmValue::Doubles(items::<8>(bytes).map(f64::from_be_bytes).collect()),
            Self::Uuid => AlgorithmValue::Uuids(items::<16>(bytes).map(u128::from_be_bytes).collect()),
            Self::Cdata => AlgorithmValue::Text(utf8(bytes)?.to_owned()),
        })
    }

    fn to_text(&self, bytes: &[u8], out: &mut String) -> Result<()> {
        self.check_length(bytes)?;
        match self {
            Self::Hexadecimal => {
                for b in bytes {
                    let _ = write!(out, "{b:02X}");
                }
            }
            Self::Base64 => STANDARD.encode_string(bytes, out),
            Self::Short => write_joined(out, items::<2>(bytes).map(i16::from_be_bytes), |o, v| {
                let _ = write!(o, "{v}");
            }),
            Self::Int => write_joined(out, items::<4>(bytes).map(i32::from_be_bytes), |o, v| {
                let _ = write!(o, "{v}");
            }),
            Self::Long => write_joined(out, items::<8>(bytes).map(i64::from_be_bytes), |o, v| {
                let _ = write!(o, "{v}");
            }),
            Self::Boolean => write_joined(out, booleans(bytes)?.into_iter(), |o, v| {
                o.push_str(if v { "true" } else { "false" });
            }),
            Self::Float => write_joined(out, items::<4>(bytes).map(f32::from_be_bytes), |o, v| {
                // über Display von f32, damit 0.1f32 nicht als 0.10000000149011612 erscheint
                if v.is_finite() {
                    let _ = write!(o, "{v}");
                } else {
                    write_float(o, f64::from(v));
                }
            }),
            Self::Double => write_joined(out, items::<8>(bytes).map(f64::from_be_bytes), write_float),
            Self::Uuid => write_joined(out, items::<16>(bytes).map(u128::from_be_bytes), write_uuid),
            Self::Cdata => out.push_str(utf8(bytes)?),
        }
        Ok(())
    }
}

/// Carries up to two trailing octets between consecutive base64 chunks.
///
/// Base64 ist nur in Dreiergruppen eindeutig. Folgt auf einen Chunk ein weiterer
/// base64-Chunk, bleibt der Rest (`len % 3`) hier liegen und wird dem nächsten
/// Chunk vorangestellt. Nur wenn kein weiterer Chunk folgt, wird die kurze
/// Gruppe mit Padding ausgegeben.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Tale {
    bytes: [u8; 3],
    len: usize,
}

impl Base64Tale {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Appends the base64 text of `data` (prefixed by the carried tale) to `out`.
    pub fn encode_chunk(&mut self, mut data: &[u8], more_follows: bool, out: &mut String) {
        if self.len > 0 {
            let n = (3 - self.len).min(data.len());
            self.bytes[self.len..self.len + n].copy_from_slice(&data[..n]);
            self.len += n;
            data = &data[n..];
            if self.len == 3 {
                STANDARD.encode_string(self.bytes, out);
                self.len = 0;
            } else if !more_follows {
                STANDARD.encode_string(&self.bytes[..self.len], out);
                self.len = 0;
                return;
            } else {
                return;
            }
        }
        if more_follows {
            let main = data.len() - data.len() % 3;
            STANDARD.encode_string(&data[..main], out);
            let rest = &data[main..];
            self.bytes[..rest.len()].copy_from_slice(rest);
            self.len = rest.len();
        } else {
            STANDARD.encode_string(data, out);
        }
    }
}

/// Application codecs keyed by algorithm URI.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    by_uri: FastHashMap<Rc<str>, Rc<dyn EncodingAlgorithm>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `codec` for `uri`. Returns the previous registration.
    pub fn register(
        &mut self,
        uri: impl Into<Rc<str>>,
        codec: Rc<dyn EncodingAlgorithm>,
    ) -> Option<Rc<dyn EncodingAlgorithm>> {
        self.by_uri.insert(uri.into(), codec)
    }

    pub fn unregister(&mut self, uri: &str) -> Option<Rc<dyn EncodingAlgorithm>> {
        self.by_uri.remove(uri)
    }

    pub fn get(&self, uri: &str) -> Option<&Rc<dyn EncodingAlgorithm>> {
        self.by_uri.get(uri)
    }

    pub fn len(&self) -> usize {
        self.by_uri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uri.is_empty()
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_uri.keys()).finish()
    }
}

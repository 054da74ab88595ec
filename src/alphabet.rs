//! Restricted alphabets (X.891 Abschnitt 9).
//!
//! Eingebaut sind das numerische Alphabet (Id 0) und das Datum/Zeit-Alphabet
//! (Id 1), beide mit 4 Bit pro Zeichen; der Wert 15 im letzten Halbbyte
//! markiert das Ende. Alphabete aus dem Vokabular (Id >= 16) verwenden
//! `n = ceil(log2(len + 1))` Bit pro Zeichen, der Wert `2^n - 1` terminiert.
//! Ids 2-15 sind reserviert.

use crate::constants::{
    DATE_TIME_ALPHABET, DATE_TIME_ALPHABET_INDEX, NUMERIC_ALPHABET, NUMERIC_ALPHABET_INDEX,
    RESTRICTED_ALPHABET_APPLICATION_START,
};
use crate::string_table::StringTable;
use crate::{Error, Result};

/// Decodes `bytes` with alphabet `id` and appends the characters to `out`.
pub fn decode(id: u32, table: &StringTable, bytes: &[u8], out: &mut String) -> Result<()> {
    match id {
        NUMERIC_ALPHABET_INDEX => decode_four_bit(NUMERIC_ALPHABET.as_bytes(), bytes, out),
        DATE_TIME_ALPHABET_INDEX => decode_four_bit(DATE_TIME_ALPHABET.as_bytes(), bytes, out),
        id if id >= RESTRICTED_ALPHABET_APPLICATION_START => {
            let index = (id - RESTRICTED_ALPHABET_APPLICATION_START) as usize;
            let alphabet = table.get(index).map_err(|_| Error::UnknownAlphabet(id))?;
            let chars: Vec<char> = alphabet.chars().collect();
            decode_with_alphabet(&chars, bytes, out)
        }
        _ => Err(Error::UnknownAlphabet(id)),
    }
}

/// Built-in alphabets: zwei Zeichen pro Oktett.
fn decode_four_bit(alphabet: &[u8], bytes: &[u8], out: &mut String) -> Result<()> {
    let Some((&last, head)) = bytes.split_last() else {
        return Err(Error::malformed("restricted alphabet: empty octet string"));
    };
    let lookup = |v: u8| -> Result<char> {
        alphabet
            .get(usize::from(v))
            .map(|&c| char::from(c))
            .ok_or_else(|| Error::malformed("restricted alphabet: terminator before last octet"))
    };
    out.reserve(bytes.len() * 2);
    for &b in head {
        out.push(lookup(b >> 4)?);
        out.push(lookup(b & 0x0F)?);
    }
    out.push(lookup(last >> 4)?);
    if last & 0x0F != 0x0F {
        out.push(lookup(last & 0x0F)?);
    }
    Ok(())
}

/// MSB-first Bitleser über einem Oktett-Slice.
struct Bits<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl Bits<'_> {
    fn read(&mut self, n: u32) -> u32 {
        let mut value = 0u32;
        for _ in 0..n {
            let byte = self.data[self.bit_pos / 8];
            let bit = (byte >> (7 - self.bit_pos % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.bit_pos += 1;
        }
        value
    }
}

/// Bit width for an alphabet of `len` characters.
pub(crate) fn bits_per_character(len: usize) -> u32 {
    let mut bits = 1;
    while (1usize << bits) <= len {
        bits += 1;
    }
    bits
}

fn decode_with_alphabet(alphabet: &[char], bytes: &[u8], out: &mut String) -> Result<()> {
    if alphabet.len() < 2 {
        return Err(Error::malformed("restricted alphabet must contain at least 2 characters"));
    }
    let bits = bits_per_character(alphabet.len());
    let terminator = (1u32 << bits) - 1;
    let count = bytes.len() * 8 / bits as usize;
    if count == 0 {
        return Err(Error::malformed("restricted alphabet: octet string too short"));
    }
    let mut reader = Bits { data: bytes, bit_pos: 0 };
    for i in 0..count {
        let value = reader.read(bits);
        if bits < 8 && value == terminator {
            if (i * bits as usize) / 8 != bytes.len() - 1 {
                return Err(Error::malformed("restricted alphabet incorrectly terminated"));
            }
            break;
        }
        let c = alphabet
            .get(value as usize)
            .ok_or_else(|| Error::malformed(format!("restricted alphabet: code {value} out of range")))?;
        out.push(*c);
    }
    Ok(())
}

//! Quadruple character codes and their hex-alphabet representation.
//!
//! A universal character is stored as four bytes: group, plane, row and cell,
//! group being the most significant. When a character is handed to the POSIX
//! regex engine every nibble is written as a letter from `'A'` (0) to `'P'`
//! (15), so one quadruple always takes exactly 8 characters and a range of
//! nibbles stays a plain bracket expression like `[C-K]`.
//!
//! The packing is done with shifts, so the hex form is the same on every host.

use std::fmt;
use std::ops::Sub;

use crate::PatternError;

/// Length of the hex-alphabet form of one quadruple.
pub const HEXREPR_LEN: usize = 8;

/// Letter standing for the nibble 0.
const HEX_BASE: u8 = b'A';

/// Letter standing for the nibble 15.
const HEX_LAST: u8 = b'P';

/// One byte of a quadruple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Group,
    Plane,
    Row,
    Cell,
}

impl Field {
    /// All fields, most significant first.
    pub const ALL: [Field; 4] = [Field::Group, Field::Plane, Field::Row, Field::Cell];

    /// Field for a position where 0 is the group and 3 is the cell.
    pub fn from_index(index: usize) -> Result<Field, PatternError> {
        Field::ALL
            .get(index)
            .copied()
            .ok_or(PatternError::FieldIndexOutOfRange(index))
    }

    /// Position of the field, 0 for the group up to 3 for the cell.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    fn shift(self) -> u32 {
        24 - 8 * self as u32
    }
}

/// A quadruple: one character code packed into a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Quad {
    value: u32,
}

impl Quad {
    /// The largest quadruple, `{255, 255, 255, 255}`.
    pub const MAX: Quad = Quad { value: u32::MAX };

    /// Build a quadruple from its four bytes.
    #[inline]
    pub const fn new(group: u8, plane: u8, row: u8, cell: u8) -> Quad {
        Quad {
            value: (group as u32) << 24 | (plane as u32) << 16 | (row as u32) << 8 | cell as u32,
        }
    }

    #[inline]
    pub const fn from_value(value: u32) -> Quad {
        Quad { value }
    }

    /// The packed value; the ordering of quadruples follows it.
    #[inline]
    pub const fn value(self) -> u32 {
        self.value
    }

    #[inline]
    pub fn get(self, field: Field) -> u8 {
        (self.value >> field.shift()) as u8
    }

    /// The four bytes, group first.
    #[inline]
    pub fn bytes(self) -> [u8; 4] {
        self.value.to_be_bytes()
    }

    #[inline]
    pub fn set(&mut self, field: Field, byte: u8) {
        let shift = field.shift();
        self.value = (self.value & !(0xFF << shift)) | (byte as u32) << shift;
    }

    pub fn set_all(&mut self, group: u8, plane: u8, row: u8, cell: u8) {
        *self = Quad::new(group, plane, row, cell);
    }

    /// The 8-letter form, e.g. `{0, 0, 1, 0x2F}` is `"AAAAABCP"`.
    pub fn hexrepr(self) -> String {
        let mut buf = [0u8; HEXREPR_LEN];
        self.write_hexrepr(&mut buf);
        buf.iter().map(|&b| b as char).collect()
    }

    /// Write the 8-letter form into `buf`: `buf[0]` gets the upper half of
    /// the group, `buf[7]` the lower half of the cell.
    pub fn write_hexrepr(self, buf: &mut [u8; HEXREPR_LEN]) {
        for (chunk, byte) in buf.chunks_exact_mut(2).zip(self.bytes()) {
            chunk.copy_from_slice(&char_hexrepr(byte));
        }
    }

    /// Parse the 8-letter form. This is the exact inverse of [`Quad::hexrepr`].
    pub fn from_hexrepr(hex: &str) -> Result<Quad, PatternError> {
        Quad::from_hexrepr_bytes(hex.as_bytes())
            .ok_or_else(|| PatternError::InvalidHexRepr(hex.to_string()))
    }

    pub fn set_hexrepr(&mut self, hex: &str) -> Result<(), PatternError> {
        *self = Quad::from_hexrepr(hex)?;
        Ok(())
    }

    /// Decode 8 hex-alphabet bytes, `None` on a wrong length or letter.
    pub(crate) fn from_hexrepr_bytes(hex: &[u8]) -> Option<Quad> {
        if hex.len() != HEXREPR_LEN {
            return None;
        }
        let mut value = 0u32;
        for &c in hex {
            if !(HEX_BASE..=HEX_LAST).contains(&c) {
                return None;
            }
            value = value << 4 | (c - HEX_BASE) as u32;
        }
        Some(Quad { value })
    }

    /// The character this quadruple encodes, if it is a valid `char`.
    pub fn to_char(self) -> Option<char> {
        char::from_u32(self.value)
    }
}

impl From<u32> for Quad {
    fn from(value: u32) -> Self {
        Quad { value }
    }
}

impl From<Quad> for u32 {
    fn from(q: Quad) -> Self {
        q.value
    }
}

impl From<char> for Quad {
    fn from(c: char) -> Self {
        Quad { value: c as u32 }
    }
}

impl Sub for Quad {
    type Output = Quad;

    /// Distance between two quadruples. Only meaningful when `self >= rhs`.
    fn sub(self, rhs: Quad) -> Quad {
        Quad {
            value: self.value.wrapping_sub(rhs.value),
        }
    }
}

impl PartialEq<u32> for Quad {
    fn eq(&self, other: &u32) -> bool {
        self.value == *other
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; HEXREPR_LEN];
        self.write_hexrepr(&mut buf);
        for b in buf {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

/// The two letters encoding one byte, high nibble first.
#[inline]
pub fn char_hexrepr(byte: u8) -> [u8; 2] {
    [HEX_BASE + (byte >> 4), HEX_BASE + (byte & 0x0F)]
}

/// [`char_hexrepr`] as a `String`.
pub fn char_hexrepr_str(byte: u8) -> String {
    let [hi, lo] = char_hexrepr(byte);
    let mut s = String::with_capacity(2);
    s.push(hi as char);
    s.push(lo as char);
    s
}

/// Encode a whole string, 8 letters per character. This is the form the
/// matched value takes before a generated expression is applied to it.
pub fn hexrepr_of_str(s: &str) -> String {
    let mut out = String::with_capacity(s.chars().count() * HEXREPR_LEN);
    let mut buf = [0u8; HEXREPR_LEN];
    for c in s.chars() {
        Quad::from(c).write_hexrepr(&mut buf);
        out.extend(buf.iter().map(|&b| b as char));
    }
    out
}

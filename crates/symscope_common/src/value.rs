//! Arbitrary-width 2-state bit vectors for reading and writing signal storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bits per storage word.
const WORD_BITS: u32 = 32;

/// Widest value, in bits, that parsing and signal registration accept.
pub const MAX_WIDTH: u32 = 1 << 16;

/// A 2-state vector of `width` bits packed into `u32` words.
///
/// Word 0 holds bits `0..32`, word 1 bits `32..64`, and so on, which is the
/// layout wide (`Array`) signal storage uses. Bits at or above `width` are
/// always zero.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitVector")]
pub struct BitVector {
    width: u32,
    words: Vec<u32>,
}

/// Unchecked serialized form of [`BitVector`].
#[derive(Deserialize)]
struct RawBitVector {
    width: u32,
    words: Vec<u32>,
}

impl TryFrom<RawBitVector> for BitVector {
    type Error = ParseValueError;

    fn try_from(raw: RawBitVector) -> Result<Self, Self::Error> {
        if raw.width > MAX_WIDTH {
            return Err(ParseValueError::InvalidWidth(raw.width.to_string()));
        }
        let expected = word_count(raw.width);
        if raw.words.len() != expected {
            return Err(ParseValueError::WordCount {
                width: raw.width,
                expected,
                found: raw.words.len(),
            });
        }
        let mut v = Self {
            width: raw.width,
            words: raw.words,
        };
        v.mask();
        Ok(v)
    }
}

/// Errors produced when parsing a textual value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseValueError {
    /// The input contained no digits.
    #[error("empty value")]
    Empty,

    /// A digit was not valid in the literal's radix.
    #[error("invalid digit '{digit}' for base {radix}")]
    InvalidDigit {
        /// The offending character.
        digit: char,
        /// The radix being parsed.
        radix: u32,
    },

    /// The base specifier after `'` was not one of `b`, `o`, `d`, `h`.
    #[error("unknown base specifier '{0}'")]
    UnknownBase(char),

    /// The width of a literal was zero, not an integer, or above
    /// [`MAX_WIDTH`].
    #[error("invalid width '{0}'")]
    InvalidWidth(String),

    /// A serialized vector's word count disagrees with its width.
    #[error("width {width} needs {expected} word(s), found {found}")]
    WordCount {
        /// Declared width in bits.
        width: u32,
        /// Words that width requires.
        expected: usize,
        /// Words actually present.
        found: usize,
    },
}

impl BitVector {
    /// Creates a zeroed vector of the given width.
    pub fn new(width: u32) -> Self {
        Self {
            width,
            words: vec![0; word_count(width)],
        }
    }

    /// Returns the number of bits in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the backing words, least significant first.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Builds a vector from words (least significant first), truncated or
    /// zero-extended to `width`.
    pub fn from_words(words: &[u32], width: u32) -> Self {
        let mut v = Self::new(width);
        let n = v.words.len().min(words.len());
        v.words[..n].copy_from_slice(&words[..n]);
        v.mask();
        v
    }

    /// Creates a vector from a `u64`, truncated to `width`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        Self::from_words(&[value as u32, (value >> 32) as u32], width)
    }

    /// Returns the value as a `u64` if no bit at or above 64 is set.
    pub fn to_u64(&self) -> Option<u64> {
        if self.words.iter().skip(2).any(|&w| w != 0) {
            return None;
        }
        Some(self.low_u64())
    }

    /// Returns the low 64 bits, ignoring anything above.
    pub fn low_u64(&self) -> u64 {
        let lo = self.words.first().copied().unwrap_or(0) as u64;
        let hi = self.words.get(1).copied().unwrap_or(0) as u64;
        lo | (hi << 32)
    }

    /// Gets the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> bool {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = self.words[(index / WORD_BITS) as usize];
        (word >> (index % WORD_BITS)) & 1 != 0
    }

    /// Sets the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: bool) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = &mut self.words[(index / WORD_BITS) as usize];
        let bit = 1u32 << (index % WORD_BITS);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Returns a copy truncated or zero-extended to `width`.
    pub fn resized(&self, width: u32) -> Self {
        Self::from_words(&self.words, width)
    }

    /// Returns true if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns the number of bits needed to represent the value (at least 1).
    pub fn significant_bits(&self) -> u32 {
        for (i, &w) in self.words.iter().enumerate().rev() {
            if w != 0 {
                return i as u32 * WORD_BITS + (WORD_BITS - w.leading_zeros());
            }
        }
        1
    }

    /// Parses a value in any of the accepted textual forms.
    ///
    /// Accepted: decimal (`4660`), `0x1234`, `0b1010`, and Verilog sized or
    /// unsized literals (`16'h1234`, `'b101`, `8'd255`, `12'o7777`).
    /// Underscores are ignored. Sized literals are truncated to their width;
    /// unsized hex/octal/binary literals take their width from the digit
    /// count, unsized decimals from the value. Widths above [`MAX_WIDTH`]
    /// are rejected with [`ParseValueError::InvalidWidth`].
    pub fn parse(s: &str) -> Result<Self, ParseValueError> {
        let cleaned: String = s.trim().chars().filter(|&c| c != '_').collect();
        if cleaned.is_empty() {
            return Err(ParseValueError::Empty);
        }

        if let Some((size, rest)) = cleaned.split_once('\'') {
            let mut chars = rest.chars();
            let base = chars.next().ok_or(ParseValueError::Empty)?;
            let digits = chars.as_str();
            let radix = match base.to_ascii_lowercase() {
                'b' => 2,
                'o' => 8,
                'd' => 10,
                'h' => 16,
                other => return Err(ParseValueError::UnknownBase(other)),
            };
            if size.is_empty() {
                let natural = natural_width(digits, radix)?;
                return Self::from_radix_digits(digits, radix, natural);
            }
            let width: u32 = size
                .parse()
                .ok()
                .filter(|&w| w > 0 && w <= MAX_WIDTH)
                .ok_or_else(|| ParseValueError::InvalidWidth(size.to_string()))?;
            return Self::from_radix_digits(digits, radix, width);
        }

        let lower = cleaned.to_ascii_lowercase();
        if let Some(digits) = lower.strip_prefix("0x") {
            return Self::from_radix_digits(digits, 16, natural_width(digits, 16)?);
        }
        if let Some(digits) = lower.strip_prefix("0b") {
            return Self::from_radix_digits(digits, 2, natural_width(digits, 2)?);
        }
        Self::from_radix_digits(&lower, 10, natural_width(&lower, 10)?)
    }

    /// Accumulates `digits` in `radix` into a vector of `width` bits.
    fn from_radix_digits(digits: &str, radix: u32, width: u32) -> Result<Self, ParseValueError> {
        if digits.is_empty() {
            return Err(ParseValueError::Empty);
        }
        // Work at full precision and truncate once at the end.
        let max_bits = digits.len() as u32 * bits_per_digit(radix);
        let mut acc = vec![0u32; word_count(max_bits.max(1))];
        for c in digits.chars() {
            let d = c
                .to_digit(radix)
                .ok_or(ParseValueError::InvalidDigit { digit: c, radix })?;
            let mut carry = d as u64;
            for word in acc.iter_mut() {
                let wide = (*word as u64) * radix as u64 + carry;
                *word = wide as u32;
                carry = wide >> WORD_BITS;
            }
        }
        Ok(Self::from_words(&acc, width))
    }

    /// Formats the value as lowercase hex digits without a prefix.
    pub fn to_hex_string(&self) -> String {
        let digits = self.width.div_ceil(4).max(1);
        let mut s = String::with_capacity(digits as usize);
        for nibble in (0..digits).rev() {
            let bit = nibble * 4;
            let word = self.words.get((bit / WORD_BITS) as usize).copied().unwrap_or(0);
            let n = (word >> (bit % WORD_BITS)) & 0xf;
            s.push(char::from_digit(n, 16).unwrap_or('0'));
        }
        s
    }

    fn mask(&mut self) {
        let rem = self.width % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u32 << rem) - 1;
            }
        }
    }
}

impl fmt::Display for BitVector {
    /// Renders as a Verilog hex literal, e.g. `16'h1234`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'h{}", self.width, self.to_hex_string())
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector({self})")
    }
}

/// Returns the number of u32 words needed to store `width` bits.
fn word_count(width: u32) -> usize {
    width.div_ceil(WORD_BITS) as usize
}

fn bits_per_digit(radix: u32) -> u32 {
    match radix {
        2 => 1,
        8 => 3,
        16 => 4,
        // log2(10) < 4
        _ => 4,
    }
}

/// Width implied by an unsized literal's digits.
fn natural_width(digits: &str, radix: u32) -> Result<u32, ParseValueError> {
    if digits.is_empty() {
        return Err(ParseValueError::Empty);
    }
    let max_bits = u32::try_from(digits.len())
        .ok()
        .and_then(|n| n.checked_mul(bits_per_digit(radix)))
        .filter(|&bits| radix == 10 || bits <= MAX_WIDTH)
        .ok_or_else(|| ParseValueError::InvalidWidth(format!("{} digits", digits.len())))?;
    if radix == 10 {
        let bits = BitVector::from_radix_digits(digits, 10, max_bits)?.significant_bits();
        if bits > MAX_WIDTH {
            return Err(ParseValueError::InvalidWidth(bits.to_string()));
        }
        return Ok(bits);
    }
    Ok(max_bits)
}

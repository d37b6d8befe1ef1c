//! Non-owning handles to model-owned signal storage.
//!
//! A [`StorageRef<'m>`] borrows a `Cell` (or a slice of `Cell<u32>` words)
//! for the model lifetime `'m`. The registry holding it is therefore bound
//! to `'m` as well, so it cannot outlive the model whose memory it exposes.
//! `Cell` gives interior mutability for pokes through a shared borrow and
//! keeps the registry `!Sync`.

use std::cell::Cell;

use symscope_common::BitVector;

/// A borrowed storage cell of one of the supported layouts.
#[derive(Clone, Copy, Debug)]
pub enum StorageRef<'m> {
    /// 8-bit cell (bit and byte variables).
    U8(&'m Cell<u8>),
    /// 16-bit cell.
    U16(&'m Cell<u16>),
    /// 32-bit cell.
    U32(&'m Cell<u32>),
    /// 64-bit cell.
    U64(&'m Cell<u64>),
    /// Wide value as 32-bit words, least significant first.
    Words(&'m [Cell<u32>]),
}

impl StorageRef<'_> {
    /// Returns how many bits the cell can hold.
    pub fn capacity_bits(&self) -> u32 {
        match self {
            StorageRef::U8(_) => 8,
            StorageRef::U16(_) => 16,
            StorageRef::U32(_) => 32,
            StorageRef::U64(_) => 64,
            StorageRef::Words(words) => words.len() as u32 * 32,
        }
    }

    /// Short name of the storage layout, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            StorageRef::U8(_) => "u8 cell",
            StorageRef::U16(_) => "u16 cell",
            StorageRef::U32(_) => "u32 cell",
            StorageRef::U64(_) => "u64 cell",
            StorageRef::Words(_) => "u32 word slice",
        }
    }

    /// Reads the low `width` bits.
    pub(crate) fn load(&self, width: u32) -> BitVector {
        match self {
            StorageRef::Words(words) => {
                let raw: Vec<u32> = words.iter().map(Cell::get).collect();
                BitVector::from_words(&raw, width)
            }
            _ => BitVector::from_u64(self.load_u64(width), width),
        }
    }

    /// Reads the low `width` bits (at most 64) as an integer.
    pub(crate) fn load_u64(&self, width: u32) -> u64 {
        let raw = match self {
            StorageRef::U8(c) => c.get() as u64,
            StorageRef::U16(c) => c.get() as u64,
            StorageRef::U32(c) => c.get() as u64,
            StorageRef::U64(c) => c.get(),
            StorageRef::Words(words) => {
                let lo = words.first().map_or(0, Cell::get) as u64;
                let hi = words.get(1).map_or(0, Cell::get) as u64;
                lo | (hi << 32)
            }
        };
        raw & mask(width)
    }

    /// Writes `value` truncated to `width` bits; bits above `width` in the
    /// cell are cleared.
    pub(crate) fn store(&self, value: &BitVector, width: u32) {
        match self {
            StorageRef::Words(words) => {
                let v = value.resized(width);
                for (i, cell) in words.iter().enumerate() {
                    cell.set(v.words().get(i).copied().unwrap_or(0));
                }
            }
            _ => self.store_u64(value.low_u64(), width),
        }
    }

    /// Writes the low `width` bits of `value`.
    pub(crate) fn store_u64(&self, value: u64, width: u32) {
        let v = value & mask(width);
        match self {
            StorageRef::U8(c) => c.set(v as u8),
            StorageRef::U16(c) => c.set(v as u16),
            StorageRef::U32(c) => c.set(v as u32),
            StorageRef::U64(c) => c.set(v),
            StorageRef::Words(words) => {
                for (i, cell) in words.iter().enumerate() {
                    let word = match i {
                        0 => v as u32,
                        1 => (v >> 32) as u32,
                        _ => 0,
                    };
                    cell.set(word);
                }
            }
        }
    }
}

impl<'m> From<&'m Cell<u8>> for StorageRef<'m> {
    fn from(cell: &'m Cell<u8>) -> Self {
        StorageRef::U8(cell)
    }
}

impl<'m> From<&'m Cell<u16>> for StorageRef<'m> {
    fn from(cell: &'m Cell<u16>) -> Self {
        StorageRef::U16(cell)
    }
}

impl<'m> From<&'m Cell<u32>> for StorageRef<'m> {
    fn from(cell: &'m Cell<u32>) -> Self {
        StorageRef::U32(cell)
    }
}

impl<'m> From<&'m Cell<u64>> for StorageRef<'m> {
    fn from(cell: &'m Cell<u64>) -> Self {
        StorageRef::U64(cell)
    }
}

impl<'m> From<&'m [Cell<u32>]> for StorageRef<'m> {
    fn from(words: &'m [Cell<u32>]) -> Self {
        StorageRef::Words(words)
    }
}

impl<'m, const N: usize> From<&'m [Cell<u32>; N]> for StorageRef<'m> {
    fn from(words: &'m [Cell<u32>; N]) -> Self {
        StorageRef::Words(words)
    }
}

/// All-ones mask of `width` bits, saturating at 64.
fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

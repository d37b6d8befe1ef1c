//! Typed peek/poke access to registered variables.
//!
//! Values are converted to and from the descriptor's declared width: reads
//! are zero-extended (or truncated, for narrower target types) and writes
//! are truncated to the declared width.

use symscope_common::BitVector;

use crate::descriptor::VariableDescriptor;
use crate::error::RegistryError;

/// Reads a variable as `T`.
pub trait Peek<T> {
    /// Returns the current value converted to `T`.
    fn peek(&self) -> T;
}

/// Writes a variable from `T`.
pub trait Poke<T> {
    /// Stores `value`, failing if the variable is read-only.
    fn poke(&self, value: T) -> Result<(), RegistryError>;
}

macro_rules! impl_scalar_access {
    ($($ty:ty),*) => {
        $(
            impl Peek<$ty> for VariableDescriptor<'_> {
                fn peek(&self) -> $ty {
                    self.read_u64() as $ty
                }
            }

            impl Poke<$ty> for VariableDescriptor<'_> {
                fn poke(&self, value: $ty) -> Result<(), RegistryError> {
                    self.write_u64(value as u64)
                }
            }
        )*
    };
}

impl_scalar_access!(u8, u16, u32, u64);

impl Peek<bool> for VariableDescriptor<'_> {
    /// True when any bit is set.
    fn peek(&self) -> bool {
        !self.read().is_zero()
    }
}

impl Poke<bool> for VariableDescriptor<'_> {
    fn poke(&self, value: bool) -> Result<(), RegistryError> {
        self.write_u64(value as u64)
    }
}

impl Peek<BitVector> for VariableDescriptor<'_> {
    fn peek(&self) -> BitVector {
        self.read()
    }
}

impl Poke<&BitVector> for VariableDescriptor<'_> {
    fn poke(&self, value: &BitVector) -> Result<(), RegistryError> {
        self.write(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Direction, StorageKind, VariableSpec};
    use crate::ids::ScopeId;
    use std::cell::Cell;

    fn word_var(cell: &Cell<u16>) -> VariableDescriptor<'_> {
        let spec = VariableSpec::new("in_signal", StorageKind::Word, Direction::In).range(15, 0);
        VariableDescriptor::new(spec, cell.into(), ScopeId::from_raw(0), "top.in_signal".into())
            .unwrap()
    }

    #[test]
    fn peek_poke_u16() {
        let cell = Cell::new(0u16);
        let var = word_var(&cell);
        var.poke(0x1234u16).unwrap();
        let v: u16 = var.peek();
        assert_eq!(v, 0x1234);
    }

    #[test]
    fn peek_narrower_type_truncates() {
        let cell = Cell::new(0x1234u16);
        let var = word_var(&cell);
        let low: u8 = var.peek();
        assert_eq!(low, 0x34);
    }

    #[test]
    fn poke_wider_type_is_masked() {
        let cell = Cell::new(0u16);
        let var = word_var(&cell);
        var.poke(0xdead_beefu32).unwrap();
        assert_eq!(cell.get(), 0xbeef);
    }

    #[test]
    fn bool_access() {
        let cell = Cell::new(0u8);
        let spec = VariableSpec::new("rst", StorageKind::Byte, Direction::In);
        let var =
            VariableDescriptor::new(spec, (&cell).into(), ScopeId::from_raw(0), "top.rst".into())
                .unwrap();
        var.poke(true).unwrap();
        assert_eq!(cell.get(), 1);
        let high: bool = var.peek();
        assert!(high);
    }

    #[test]
    fn bitvector_access() {
        let cell = Cell::new(0u16);
        let var = word_var(&cell);
        var.poke(&BitVector::parse("16'hbeef").unwrap()).unwrap();
        let v: BitVector = var.peek();
        assert_eq!(v.to_string(), "16'hbeef");
    }
}

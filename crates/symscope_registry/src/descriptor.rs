//! Variable descriptors: typed metadata plus a storage handle for one piece
//! of externally visible simulation state.

use std::fmt;

use serde::{Deserialize, Serialize};
use symscope_common::{BitVector, MAX_WIDTH};

use crate::error::RegistryError;
use crate::ids::ScopeId;
use crate::storage::StorageRef;

/// Direction of a variable relative to its enclosing module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Module input.
    In,
    /// Module output.
    Out,
    /// Bidirectional port.
    InOut,
    /// Internal signal.
    Internal,
    /// Constant; never writable.
    Const,
}

impl Direction {
    /// Returns the lowercase name used in layouts and console output.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::InOut => "inout",
            Direction::Internal => "internal",
            Direction::Const => "const",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The storage cell layout a variable lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// A single bit held in an 8-bit cell.
    Bit,
    /// Up to 8 bits.
    Byte,
    /// Up to 16 bits.
    Word,
    /// Up to 32 bits.
    DoubleWord,
    /// Up to 64 bits.
    QuadWord,
    /// Any width, as a slice of 32-bit words.
    Array,
}

impl StorageKind {
    /// Returns the smallest kind able to hold `width` bits.
    pub fn for_width(width: u32) -> Self {
        match width {
            0..=1 => StorageKind::Bit,
            2..=8 => StorageKind::Byte,
            9..=16 => StorageKind::Word,
            17..=32 => StorageKind::DoubleWord,
            33..=64 => StorageKind::QuadWord,
            _ => StorageKind::Array,
        }
    }

    /// Returns the snake_case name used in layouts.
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Bit => "bit",
            StorageKind::Byte => "byte",
            StorageKind::Word => "word",
            StorageKind::DoubleWord => "double_word",
            StorageKind::QuadWord => "quad_word",
            StorageKind::Array => "array",
        }
    }

    /// Name of the storage layout this kind requires.
    fn expected_storage(self) -> &'static str {
        match self {
            StorageKind::Bit | StorageKind::Byte => "u8 cell",
            StorageKind::Word => "u16 cell",
            StorageKind::DoubleWord => "u32 cell",
            StorageKind::QuadWord => "u64 cell",
            StorageKind::Array => "u32 word slice",
        }
    }

    fn accepts(self, storage: &StorageRef<'_>) -> bool {
        matches!(
            (self, storage),
            (StorageKind::Bit | StorageKind::Byte, StorageRef::U8(_))
                | (StorageKind::Word, StorageRef::U16(_))
                | (StorageKind::DoubleWord, StorageRef::U32(_))
                | (StorageKind::QuadWord, StorageRef::U64(_))
                | (StorageKind::Array, StorageRef::Words(_))
        )
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One packed dimension `[msb:lsb]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitRange {
    /// High bound.
    pub msb: i32,
    /// Low bound.
    pub lsb: i32,
}

impl BitRange {
    /// Creates a range.
    pub fn new(msb: i32, lsb: i32) -> Self {
        Self { msb, lsb }
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.msb, self.lsb)
    }
}

/// Computes the total packed width of `dims`; no dimensions means a 1-bit
/// scalar.
///
/// Fails with [`RegistryError::InvalidWidth`] when a range has its high bound
/// below its low bound or the product exceeds [`MAX_WIDTH`].
pub fn packed_width(name: &str, dims: &[BitRange]) -> Result<u32, RegistryError> {
    let mut width: u32 = 1;
    for range in dims {
        if range.msb < range.lsb {
            return Err(RegistryError::InvalidWidth {
                name: name.to_string(),
                reason: format!("msb {} < lsb {}", range.msb, range.lsb),
            });
        }
        let size = u32::try_from(range.msb as i64 - range.lsb as i64 + 1)
            .ok()
            .and_then(|size| width.checked_mul(size))
            .filter(|&total| total <= MAX_WIDTH)
            .ok_or_else(|| RegistryError::InvalidWidth {
                name: name.to_string(),
                reason: format!("range {range} is too wide"),
            })?;
        width = size;
    }
    Ok(width)
}

/// Everything about a variable except its storage and owning scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableSpec {
    /// Name within the scope.
    pub name: String,
    /// Storage layout.
    pub kind: StorageKind,
    /// Direction; forced to [`Direction::Const`] when `is_const` is set.
    pub direction: Direction,
    /// Whether the variable is a constant.
    pub is_const: bool,
    /// Whether external tooling may write the variable.
    pub public: bool,
    /// Packed dimensions, outermost first.
    pub dims: Vec<BitRange>,
}

impl VariableSpec {
    /// A public, non-constant 1-bit variable.
    pub fn new(name: impl Into<String>, kind: StorageKind, direction: Direction) -> Self {
        Self {
            name: name.into(),
            kind,
            direction,
            is_const: false,
            public: true,
            dims: Vec::new(),
        }
    }

    /// Appends a packed dimension.
    pub fn range(mut self, msb: i32, lsb: i32) -> Self {
        self.dims.push(BitRange::new(msb, lsb));
        self
    }

    /// Marks the variable constant.
    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    /// Exposes the variable read-only.
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }
}

/// Metadata and storage handle of one registered variable.
#[derive(Debug)]
pub struct VariableDescriptor<'m> {
    name: String,
    qualified_name: String,
    scope: ScopeId,
    width_bits: u32,
    direction: Direction,
    storage_kind: StorageKind,
    dims: Vec<BitRange>,
    public: bool,
    storage: StorageRef<'m>,
}

impl<'m> VariableDescriptor<'m> {
    /// Validates `spec` against `storage` and builds the descriptor.
    pub(crate) fn new(
        spec: VariableSpec,
        storage: StorageRef<'m>,
        scope: ScopeId,
        qualified_name: String,
    ) -> Result<Self, RegistryError> {
        let width_bits = packed_width(&spec.name, &spec.dims)?;
        if !spec.kind.accepts(&storage) {
            return Err(RegistryError::StorageMismatch {
                name: spec.name,
                expected: spec.kind.expected_storage(),
                found: storage.describe(),
            });
        }
        if spec.kind == StorageKind::Bit && width_bits != 1 {
            return Err(RegistryError::InvalidWidth {
                name: spec.name,
                reason: format!("bit storage holds 1 bit, declared {width_bits}"),
            });
        }
        if width_bits > storage.capacity_bits() {
            return Err(RegistryError::InvalidWidth {
                name: spec.name,
                reason: format!(
                    "{width_bits} bits do not fit in a {}",
                    storage.describe()
                ),
            });
        }
        let fitted = StorageKind::for_width(width_bits);
        if spec.kind != fitted && !(spec.kind == StorageKind::Byte && fitted == StorageKind::Bit)
        {
            tracing::warn!(
                name = %qualified_name,
                width = width_bits,
                kind = %spec.kind,
                "variable stored in a wider cell than its width needs"
            );
        }
        let direction = if spec.is_const {
            Direction::Const
        } else {
            spec.direction
        };
        Ok(Self {
            name: spec.name,
            qualified_name,
            scope,
            width_bits,
            direction,
            storage_kind: spec.kind,
            dims: spec.dims,
            public: spec.public,
            storage,
        })
    }

    /// Name within the owning scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified dotted name.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The owning scope.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Declared width in bits (always > 0).
    pub fn width_bits(&self) -> u32 {
        self.width_bits
    }

    /// Direction relative to the owning module.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Storage layout.
    pub fn storage_kind(&self) -> StorageKind {
        self.storage_kind
    }

    /// Packed dimensions as declared.
    pub fn dims(&self) -> &[BitRange] {
        &self.dims
    }

    /// Whether external tooling may write the variable.
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Whether writes through this descriptor are allowed.
    pub fn is_writable(&self) -> bool {
        self.public && self.direction != Direction::Const
    }

    /// Reads the current value, masked to the declared width.
    ///
    /// Outputs the model has not yet driven read as their storage's initial
    /// contents (zero for default-initialized cells).
    pub fn read(&self) -> BitVector {
        self.storage.load(self.width_bits)
    }

    /// Reads the low 64 bits of the current value.
    pub fn read_u64(&self) -> u64 {
        self.storage.load_u64(self.width_bits)
    }

    /// Writes `value`, truncated to the declared width.
    ///
    /// Fails with [`RegistryError::ReadOnlyViolation`] without touching
    /// storage if the descriptor is constant or not public.
    pub fn write(&self, value: &BitVector) -> Result<(), RegistryError> {
        self.check_writable()?;
        self.storage.store(value, self.width_bits);
        Ok(())
    }

    /// Writes the low bits of `value`, truncated to the declared width.
    pub fn write_u64(&self, value: u64) -> Result<(), RegistryError> {
        self.check_writable()?;
        self.storage.store_u64(value, self.width_bits);
        Ok(())
    }

    fn check_writable(&self) -> Result<(), RegistryError> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(RegistryError::ReadOnlyViolation {
                qualified_name: self.qualified_name.clone(),
            })
        }
    }
}

impl fmt::Display for VariableDescriptor<'_> {
    /// `in [15:0] threshold (word)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.direction)?;
        for dim in &self.dims {
            write!(f, "{dim}")?;
        }
        if !self.dims.is_empty() {
            f.write_str(" ")?;
        }
        write!(f, "{} ({})", self.name, self.storage_kind)?;
        if !self.public {
            f.write_str(" ro")?;
        }
        Ok(())
    }
}

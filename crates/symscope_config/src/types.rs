//! Layout types deserialized from `symscope.toml`.

use serde::{Deserialize, Deserializer};

/// The top-level layout parsed from `symscope.toml`.
#[derive(Debug, Deserialize)]
pub struct LayoutConfig {
    /// Model instance metadata (instance name and timescale).
    pub model: ModelMeta,
    /// Scopes in registration order.
    #[serde(default, rename = "scope")]
    pub scopes: Vec<ScopeDecl>,
}

/// Instance name and global timescale of the model.
#[derive(Debug, Deserialize)]
pub struct ModelMeta {
    /// Instance name prefixed to every qualified name (e.g. `"top"`).
    pub instance: String,
    /// Time unit (e.g. `"1ps"`).
    #[serde(default = "default_timescale")]
    pub time_unit: String,
    /// Time precision (e.g. `"1ps"`); must not be coarser than the unit.
    #[serde(default = "default_timescale")]
    pub time_precision: String,
}

fn default_timescale() -> String {
    "1ps".to_string()
}

/// One scope of the model hierarchy.
#[derive(Debug, Deserialize)]
pub struct ScopeDecl {
    /// Short scope name (e.g. `"distortion"`, or `"TOP"` for the root).
    pub name: String,
    /// Qualified name below the instance. Defaults to `name`; an empty string
    /// makes the scope the instance itself.
    #[serde(default)]
    pub qualified: Option<String>,
    /// Scope kind.
    #[serde(default)]
    pub kind: ScopeKindDecl,
    /// Qualified name of the parent scope. Absent means a root scope.
    #[serde(default)]
    pub parent: Option<String>,
    /// Time precision of a module scope (e.g. `"1ps"`). Defaults to the
    /// model precision for modules and is ignored for other scopes.
    #[serde(default)]
    pub time_precision: Option<String>,
    /// Variables exposed by this scope.
    #[serde(default, rename = "var")]
    pub vars: Vec<VarDecl>,
}

impl ScopeDecl {
    /// Returns the qualified name below the instance.
    pub fn qualified_name(&self) -> &str {
        self.qualified.as_deref().unwrap_or(&self.name)
    }
}

/// Scope kind as written in the layout.
#[derive(Debug, Default, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKindDecl {
    /// A module instance (default).
    #[default]
    Module,
    /// Any other grouping (e.g. the synthetic `TOP` scope).
    Other,
}

/// One variable declaration.
#[derive(Debug, Deserialize)]
pub struct VarDecl {
    /// Variable name within its scope.
    pub name: String,
    /// Storage cell kind.
    pub kind: StorageKindDecl,
    /// Direction relative to the enclosing module.
    #[serde(default)]
    pub direction: DirectionDecl,
    /// Whether the variable is a constant.
    #[serde(default, rename = "const")]
    pub is_const: bool,
    /// Whether external tooling may write the variable.
    #[serde(default = "default_public")]
    pub public: bool,
    /// Packed dimensions as `[msb, lsb]` pairs. Empty means a 1-bit scalar.
    #[serde(default, deserialize_with = "deserialize_ranges")]
    pub range: Vec<RangeDecl>,
    /// Initial value.
    #[serde(default)]
    pub value: Option<ValueDecl>,
    /// Number of 32-bit words for `array` storage. Defaults to what the
    /// declared width needs.
    #[serde(default)]
    pub words: Option<u32>,
}

fn default_public() -> bool {
    true
}

/// Storage kind as written in the layout.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum StorageKindDecl {
    /// Single-bit value in an 8-bit cell.
    Bit,
    /// Up to 8 bits.
    Byte,
    /// Up to 16 bits.
    Word,
    /// Up to 32 bits.
    DoubleWord,
    /// Up to 64 bits.
    QuadWord,
    /// Any width, in 32-bit words.
    Array,
}

/// Direction as written in the layout.
#[derive(Debug, Default, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum DirectionDecl {
    /// Module input.
    In,
    /// Module output.
    Out,
    /// Bidirectional port.
    InOut,
    /// Internal signal (default).
    #[default]
    Internal,
    /// Constant.
    Const,
}

/// A packed bit range `[msb:lsb]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeDecl {
    /// High bound.
    pub msb: i32,
    /// Low bound.
    pub lsb: i32,
}

/// An initial value: a TOML integer or a literal string such as `"16'h1234"`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ValueDecl {
    /// A non-negative integer.
    Int(u64),
    /// A textual literal parsed by the registry.
    Text(String),
}

/// Deserializes a range that can be a single pair or a list of pairs.
///
/// Accepts both `range = [15, 0]` and `range = [[3, 0], [7, 0]]`.
fn deserialize_ranges<'de, D>(deserializer: D) -> Result<Vec<RangeDecl>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One([i32; 2]),
        Many(Vec<[i32; 2]>),
    }

    let pairs = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pair) => vec![pair],
        OneOrMany::Many(pairs) => pairs,
    };
    Ok(pairs
        .into_iter()
        .map(|[msb, lsb]| RangeDecl { msb, lsb })
        .collect())
}

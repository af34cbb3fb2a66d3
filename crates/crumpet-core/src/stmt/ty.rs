use std::fmt;

/// Application-level column type, before lowering to a storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Bool,
    I64,
    F64,
    String,
    Bytes,
    DateTime,
    Date,
    Time,
    /// An enum column; the stored scalar is the variant discriminant.
    Enum(EnumId),
}

/// Index of an enum definition within the app schema.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub usize);

impl Type {
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::I64 | Type::Bool | Type::Enum(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Type::Bool => "bool",
            Type::I64 => "i64",
            Type::F64 => "f64",
            Type::String => "String",
            Type::Bytes => "Vec<u8>",
            Type::DateTime => "DateTime<Utc>",
            Type::Date => "NaiveDate",
            Type::Time => "NaiveTime",
            Type::Enum(_) => "enum",
        }
    }
}

impl fmt::Debug for EnumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumId({})", self.0)
    }
}

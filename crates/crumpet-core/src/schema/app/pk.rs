/// The model's primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    /// Field indexes of the key columns.
    pub fields: Vec<usize>,

    /// True when the key is the implicit auto-increment `id` column.
    pub auto_increment: bool,
}

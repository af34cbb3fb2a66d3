/// A secondary index declared by an `index` or `unique` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Field indexes of the covered columns, in yield order.
    pub fields: Vec<usize>,

    pub unique: bool,
}

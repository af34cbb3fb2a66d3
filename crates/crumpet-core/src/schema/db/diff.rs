use super::{Column, Index, Table};

/// Structural difference between a declared table and its live counterpart.
#[derive(Debug, Clone, Default)]
pub struct TableDiff {
    pub table: String,

    /// True when the table did not exist and must be created.
    pub created: bool,

    pub added_columns: Vec<Column>,
    pub removed_columns: Vec<String>,

    /// `(live, declared)` for columns whose type or nullability changed.
    pub changed_columns: Vec<(Column, Column)>,

    pub added_indexes: Vec<Index>,
    pub removed_indexes: Vec<String>,

    pub primary_key_changed: bool,

    /// Set when applying the diff needs a copy-through table rebuild: a
    /// column was removed or type-changed, or the primary key changed.
    pub requires_rebuild: bool,
}

/// Per-table diffs for one push invocation.
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    pub tables: Vec<TableDiff>,
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        !self.created
            && self.added_columns.is_empty()
            && self.removed_columns.is_empty()
            && self.changed_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.removed_indexes.is_empty()
            && !self.primary_key_changed
    }
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(TableDiff::is_empty)
    }

    pub fn push(&mut self, diff: TableDiff) {
        self.tables.push(diff);
    }
}

/// Compares a declared table to the live catalog state.
///
/// Index removal is only reported when the caller opted into syncing
/// indexes; system indexes are the caller's concern to exclude.
pub fn diff_table(declared: &Table, live: &Table, sync_indexes: bool) -> TableDiff {
    let mut diff = TableDiff {
        table: declared.name.clone(),
        ..TableDiff::default()
    };

    for column in &declared.columns {
        match live.column(&column.name) {
            None => diff.added_columns.push(column.clone()),
            Some(live_column) => {
                if live_column.ty != column.ty
                    || live_column.nullable != column.nullable
                    || live_column.auto_increment != column.auto_increment
                {
                    diff.changed_columns
                        .push((live_column.clone(), column.clone()));
                }
            }
        }
    }

    for column in &live.columns {
        if declared.column(&column.name).is_none() {
            diff.removed_columns.push(column.name.clone());
        }
    }

    diff.primary_key_changed = declared.primary_key != live.primary_key;

    for index in &declared.indexes {
        match live.index(&index.name) {
            None => diff.added_indexes.push(index.clone()),
            Some(live_index) => {
                if live_index.columns != index.columns || live_index.unique != index.unique {
                    diff.removed_indexes.push(index.name.clone());
                    diff.added_indexes.push(index.clone());
                }
            }
        }
    }

    if sync_indexes {
        for index in &live.indexes {
            if declared.index(&index.name).is_none() {
                diff.removed_indexes.push(index.name.clone());
            }
        }
    }

    diff.requires_rebuild = !diff.removed_columns.is_empty()
        || !diff.changed_columns.is_empty()
        || diff.primary_key_changed;

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::db::ColumnType;

    fn column(name: &str, ty: ColumnType, nullable: bool) -> Column {
        Column {
            name: name.to_owned(),
            ty,
            nullable,
            auto_increment: false,
        }
    }

    fn table(name: &str, columns: Vec<Column>, primary_key: &[&str]) -> Table {
        Table {
            name: name.to_owned(),
            columns,
            primary_key: primary_key.iter().map(|s| s.to_string()).collect(),
            indexes: vec![],
        }
    }

    #[test]
    fn identical_tables_diff_empty() {
        let declared = table(
            "user",
            vec![column("id", ColumnType::Integer, false)],
            &["id"],
        );
        let diff = diff_table(&declared, &declared.clone(), true);
        assert!(diff.is_empty());
        assert!(!diff.requires_rebuild);
    }

    #[test]
    fn added_column_does_not_require_rebuild() {
        let declared = table(
            "user",
            vec![
                column("id", ColumnType::Integer, false),
                column("name", ColumnType::Text, false),
            ],
            &["id"],
        );
        let live = table("user", vec![column("id", ColumnType::Integer, false)], &["id"]);
        let diff = diff_table(&declared, &live, false);
        assert_eq!(diff.added_columns.len(), 1);
        assert!(!diff.requires_rebuild);
    }

    #[test]
    fn type_change_requires_rebuild() {
        let declared = table("user", vec![column("email", ColumnType::Integer, false)], &["id"]);
        let mut live = declared.clone();
        live.columns[0] = column("email", ColumnType::Text, true);
        let diff = diff_table(&declared, &live, false);
        assert!(diff.requires_rebuild);
        assert_eq!(diff.changed_columns.len(), 1);
    }

    #[test]
    fn removed_column_requires_rebuild() {
        let declared = table("user", vec![column("id", ColumnType::Integer, false)], &["id"]);
        let mut live = declared.clone();
        live.columns.push(column("legacy", ColumnType::Text, true));
        let diff = diff_table(&declared, &live, false);
        assert_eq!(diff.removed_columns, vec!["legacy".to_string()]);
        assert!(diff.requires_rebuild);
    }

    #[test]
    fn undeclared_index_removed_only_when_syncing() {
        let declared = table("user", vec![column("id", ColumnType::Integer, false)], &["id"]);
        let mut live = declared.clone();
        live.indexes.push(Index {
            name: "idx_user_legacy".to_owned(),
            columns: vec!["legacy".to_owned()],
            unique: false,
        });

        let diff = diff_table(&declared, &live, false);
        assert!(diff.removed_indexes.is_empty());

        let diff = diff_table(&declared, &live, true);
        assert_eq!(diff.removed_indexes, vec!["idx_user_legacy".to_string()]);
        assert!(!diff.requires_rebuild);
    }
}

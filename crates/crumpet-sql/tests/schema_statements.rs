use crumpet_core::schema::db::{Column, ColumnType, Index, Table};
use crumpet_core::schema::spec::{ColumnSpec, TableSpec};
use crumpet_core::stmt::Value;
use crumpet_sql::stmt::{CopyColumn, Insert, Select};
use crumpet_sql::{Serializer, Statement};

static EMPTY: &[&TableSpec] = &[];

fn serialize(stmt: Statement) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let sql = Serializer::sqlite(&EMPTY).serialize(&stmt, &mut params).unwrap();
    (sql, params)
}

fn user_table() -> Table {
    Table {
        name: "user".into(),
        columns: vec![
            Column {
                name: "id".into(),
                ty: ColumnType::Integer,
                nullable: false,
                auto_increment: true,
            },
            Column {
                name: "name".into(),
                ty: ColumnType::Text,
                nullable: false,
                auto_increment: false,
            },
            Column {
                name: "email".into(),
                ty: ColumnType::Text,
                nullable: true,
                auto_increment: false,
            },
        ],
        primary_key: vec!["id".into()],
        indexes: vec![],
    }
}

#[test]
fn create_table_with_inline_autoincrement_pk() {
    let (sql, _) = serialize(Statement::create_table(user_table()));
    assert_eq!(
        sql,
        r#"CREATE TABLE IF NOT EXISTS "user" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "name" TEXT NOT NULL, "email" TEXT);"#
    );
}

#[test]
fn composite_primary_key_gets_a_table_clause() {
    let table = Table {
        name: "membership".into(),
        columns: vec![
            Column {
                name: "org_id".into(),
                ty: ColumnType::Integer,
                nullable: false,
                auto_increment: false,
            },
            Column {
                name: "user_id".into(),
                ty: ColumnType::Integer,
                nullable: false,
                auto_increment: false,
            },
        ],
        primary_key: vec!["org_id".into(), "user_id".into()],
        indexes: vec![],
    };
    let (sql, _) = serialize(Statement::create_table(table));
    assert_eq!(
        sql,
        r#"CREATE TABLE IF NOT EXISTS "membership" ("org_id" INTEGER, "user_id" INTEGER, PRIMARY KEY ("org_id", "user_id"));"#
    );
}

#[test]
fn create_index_statements() {
    let (sql, _) = serialize(Statement::create_index(
        "user",
        Index {
            name: Index::name_for("user", &["name"], false),
            columns: vec!["name".into()],
            unique: false,
        },
    ));
    assert_eq!(
        sql,
        r#"CREATE INDEX IF NOT EXISTS "idx_user_name" ON "user" ("name");"#
    );

    let (sql, _) = serialize(Statement::create_index(
        "user",
        Index {
            name: Index::name_for("user", &["email"], true),
            columns: vec!["email".into()],
            unique: true,
        },
    ));
    assert_eq!(
        sql,
        r#"CREATE UNIQUE INDEX IF NOT EXISTS "uidx_user_email" ON "user" ("email");"#
    );
}

#[test]
fn copy_table_lists_columns_on_both_sides() {
    let (sql, _) = serialize(Statement::copy_table(
        "user",
        "_crumpet_new_user",
        vec![CopyColumn::plain("id"), CopyColumn::plain("name")],
    ));
    assert_eq!(
        sql,
        r#"INSERT INTO "_crumpet_new_user" ("id", "name") SELECT "id", "name" FROM "user";"#
    );
}

#[test]
fn copy_table_fills_nulls_for_tightened_columns() {
    let (sql, _) = serialize(Statement::copy_table(
        "user",
        "_crumpet_new_user",
        vec![CopyColumn::plain("id"), CopyColumn::filled("email", "0")],
    ));
    assert_eq!(
        sql,
        r#"INSERT INTO "_crumpet_new_user" ("id", "email") SELECT "id", COALESCE("email", 0) FROM "user";"#
    );
}

#[test]
fn multi_row_insert_parameterizes_every_value() {
    let (sql, params) = serialize(
        Insert {
            table: "user".into(),
            columns: vec!["name".into(), "email".into()],
            rows: vec![
                vec![Value::from("Alice"), Value::Null],
                vec![Value::from("Bob"), Value::from("bob@example.com")],
            ],
        }
        .into(),
    );
    assert_eq!(
        sql,
        r#"INSERT INTO "user" ("name", "email") VALUES (?, ?), (?, ?);"#
    );
    assert_eq!(params.len(), 4);
}

#[test]
fn select_take_and_skip() {
    static SPEC: TableSpec = TableSpec {
        model: "User",
        table: "user",
        data_source: "sqlite",
        columns: &[ColumnSpec { name: "id", nullable: false }],
        primary_key: &["id"],
        auto_increment: Some("id"),
        indexes: &[],
        foreign_keys: &[],
        relations: &[],
    };

    let (sql, _) = serialize(
        Select {
            spec: &SPEC,
            filter: None,
            order_by: vec![],
            take: Some(10),
            skip: Some(5),
        }
        .into(),
    );
    assert_eq!(sql, r#"SELECT "user"."id" FROM "user" LIMIT 10 OFFSET 5;"#);

    let (sql, _) = serialize(
        Select {
            spec: &SPEC,
            filter: None,
            order_by: vec![],
            take: None,
            skip: Some(5),
        }
        .into(),
    );
    assert_eq!(sql, r#"SELECT "user"."id" FROM "user" LIMIT -1 OFFSET 5;"#);
}

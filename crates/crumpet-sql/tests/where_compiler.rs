use crumpet_core::schema::spec::*;
use crumpet_core::stmt::{Filter, OrderBy, RelationOp, ScalarOp, Value};
use crumpet_core::ErrorCategory;
use crumpet_sql::stmt::Select;
use crumpet_sql::{Serializer, Statement};

static USER: TableSpec = TableSpec {
    model: "User",
    table: "user",
    data_source: "sqlite",
    columns: &[
        ColumnSpec { name: "id", nullable: false },
        ColumnSpec { name: "name", nullable: false },
        ColumnSpec { name: "email", nullable: true },
    ],
    primary_key: &["id"],
    auto_increment: Some("id"),
    indexes: &[],
    foreign_keys: &[],
    relations: &[RelationSpec {
        name: "addresses",
        target: "Address",
        cardinality: Cardinality::Many,
        join: &[("id", "user_id")],
    }],
};

static ADDRESS: TableSpec = TableSpec {
    model: "Address",
    table: "address",
    data_source: "sqlite",
    columns: &[
        ColumnSpec { name: "id", nullable: false },
        ColumnSpec { name: "location", nullable: false },
        ColumnSpec { name: "user_id", nullable: false },
    ],
    primary_key: &["id"],
    auto_increment: Some("id"),
    indexes: &[],
    foreign_keys: &[ForeignKeySpec {
        columns: &["user_id"],
        target_model: "User",
        target_columns: &["id"],
        local_attr: Some("user"),
        remote_attr: Some("addresses"),
    }],
    relations: &[RelationSpec {
        name: "user",
        target: "User",
        cardinality: Cardinality::One,
        join: &[("user_id", "id")],
    }],
};

static SPECS: &[&TableSpec] = &[&USER, &ADDRESS];

fn compile(filter: Filter) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let stmt = Statement::Select(Select {
        spec: &USER,
        filter: Some(filter),
        order_by: vec![],
        take: None,
        skip: None,
    });
    let sql = Serializer::sqlite(&SPECS).serialize(&stmt, &mut params).unwrap();
    (sql, params)
}

fn compile_err(filter: Filter) -> crumpet_core::Error {
    let mut params = Vec::new();
    let stmt = Statement::Select(Select {
        spec: &USER,
        filter: Some(filter),
        order_by: vec![],
        take: None,
        skip: None,
    });
    Serializer::sqlite(&SPECS)
        .serialize(&stmt, &mut params)
        .unwrap_err()
}

#[test]
fn direct_equality() {
    let (sql, params) = compile(Filter::eq("name", "Alice"));
    assert!(sql.ends_with(r#"WHERE "user"."name" = ?;"#), "{sql}");
    assert_eq!(params, vec![Value::from("Alice")]);
}

#[test]
fn equality_against_null_is_a_null_test() {
    let (sql, params) = compile(Filter::eq("email", Value::Null));
    assert!(sql.contains(r#""user"."email" IS NULL"#), "{sql}");
    assert!(params.is_empty());
}

#[test]
fn siblings_conjoin_with_parentheses() {
    let (sql, params) = compile(Filter::And(vec![
        Filter::eq("name", "Alice"),
        Filter::eq("id", 1i64),
    ]));
    assert!(
        sql.contains(r#"("user"."name" = ?) AND ("user"."id" = ?)"#),
        "{sql}"
    );
    assert_eq!(params.len(), 2);
}

#[test]
fn single_element_or_collapses_to_operand() {
    let (or_sql, _) = compile(Filter::Or(vec![Filter::eq("name", "Alice")]));
    let (plain_sql, _) = compile(Filter::eq("name", "Alice"));
    assert_eq!(or_sql, plain_sql);
}

#[test]
fn empty_in_list_matches_nothing() {
    let (sql, params) = compile(Filter::Scalar {
        column: "id".into(),
        op: ScalarOp::In(vec![]),
    });
    assert!(sql.contains("1 = 0"), "{sql}");
    assert!(params.is_empty());
}

#[test]
fn contains_becomes_like() {
    let (sql, params) = compile(Filter::Scalar {
        column: "name".into(),
        op: ScalarOp::Contains("NY".into()),
    });
    assert!(sql.contains(r#""user"."name" LIKE ?"#), "{sql}");
    assert_eq!(params, vec![Value::from("%NY%")]);
}

#[test]
fn some_compiles_to_exists_with_join_columns() {
    let (sql, params) = compile(Filter::relation(
        "addresses",
        RelationOp::Some,
        Filter::Scalar {
            column: "location".into(),
            op: ScalarOp::Contains("NY".into()),
        },
    ));
    assert!(
        sql.contains(
            r#"EXISTS (SELECT 1 FROM "address" WHERE "address"."user_id" = "user"."id" AND ("address"."location" LIKE ?))"#
        ),
        "{sql}"
    );
    assert_eq!(params, vec![Value::from("%NY%")]);
}

#[test]
fn none_negates_the_subquery() {
    let (sql, _) = compile(Filter::relation(
        "addresses",
        RelationOp::None,
        Filter::eq("location", "NY"),
    ));
    assert!(sql.contains("NOT EXISTS (SELECT 1 FROM \"address\""), "{sql}");
}

#[test]
fn every_is_vacuously_true_on_empty_relations() {
    // every(P) == there is no related row violating P
    let (sql, _) = compile(Filter::relation(
        "addresses",
        RelationOp::Every,
        Filter::eq("location", "NY"),
    ));
    assert!(
        sql.contains(
            r#"NOT EXISTS (SELECT 1 FROM "address" WHERE "address"."user_id" = "user"."id" AND NOT ("address"."location" = ?))"#
        ),
        "{sql}"
    );
}

#[test]
fn disjunction_of_scalar_and_relation_filters() {
    // The shape of end-to-end scenario 4: a single select with a top-level
    // OR over a simple predicate and an EXISTS subquery.
    let (sql, params) = compile(Filter::Or(vec![
        Filter::Scalar {
            column: "name".into(),
            op: ScalarOp::StartsWith("A".into()),
        },
        Filter::relation(
            "addresses",
            RelationOp::Some,
            Filter::Scalar {
                column: "location".into(),
                op: ScalarOp::Contains("NY".into()),
            },
        ),
    ]));
    assert!(sql.starts_with("SELECT "), "{sql}");
    assert!(sql.contains(" OR "), "{sql}");
    assert!(sql.contains("EXISTS (SELECT 1 FROM \"address\""), "{sql}");
    assert_eq!(params, vec![Value::from("A%"), Value::from("%NY%")]);
}

#[test]
fn unknown_key_is_invalid() {
    let err = compile_err(Filter::eq("nme", "Alice"));
    assert_eq!(err.category(), ErrorCategory::InvalidFilter);
    assert!(err.to_string().contains("nme"), "{err}");
}

#[test]
fn some_on_a_to_one_relation_is_invalid() {
    let mut params = Vec::new();
    let stmt = Statement::Select(Select {
        spec: &ADDRESS,
        filter: Some(Filter::relation(
            "user",
            RelationOp::Some,
            Filter::eq("name", "Alice"),
        )),
        order_by: vec![],
        take: None,
        skip: None,
    });
    let err = Serializer::sqlite(&SPECS)
        .serialize(&stmt, &mut params)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidFilter);
}

#[test]
fn is_on_a_many_relation_is_invalid() {
    let err = compile_err(Filter::relation(
        "addresses",
        RelationOp::Is,
        Filter::eq("location", "NY"),
    ));
    assert_eq!(err.category(), ErrorCategory::InvalidFilter);
}

#[test]
fn nested_keys_validate_against_the_target_model() {
    let err = compile_err(Filter::relation(
        "addresses",
        RelationOp::Some,
        Filter::eq("name", "oops"),
    ));
    assert_eq!(err.category(), ErrorCategory::InvalidFilter);
    assert!(err.to_string().contains("Address"), "{err}");
}

#[test]
fn unknown_order_by_column_is_rejected() {
    let mut params = Vec::new();
    let stmt = Statement::Select(Select {
        spec: &USER,
        filter: None,
        order_by: vec![OrderBy {
            column: "nope".into(),
            direction: Default::default(),
        }],
        take: None,
        skip: None,
    });
    let err = Serializer::sqlite(&SPECS)
        .serialize(&stmt, &mut params)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidFilter);
}

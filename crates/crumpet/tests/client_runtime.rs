//! Engine behavior against a hand-wired model pair, exercising the same
//! surface a generated module wires up: specs, vtables, static
//! (de)serializers, and relation handles.

use crumpet::codegen_support::*;
use crumpet::stmt::{Filter, RelationOp, ScalarOp};
use crumpet::ErrorCategory;

static USER_SPEC: TableSpec = TableSpec {
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
    indexes: &[IndexSpec { columns: &["email"], unique: true }],
    foreign_keys: &[],
    relations: &[RelationSpec {
        name: "addresses",
        target: "Address",
        cardinality: Cardinality::Many,
        join: &[("id", "user_id")],
    }],
};

static USER_VTABLE: ModelVtable = ModelVtable {
    spec: &USER_SPEC,
    deserialize: deserialize_user_erased,
    attach: attach_user,
};

#[derive(Debug)]
struct User {
    id: i64,
    name: String,
    email: Option<String>,
    addresses: HasMany<Address>,
}

impl User {
    fn addresses(&self) -> Result<Vec<Arc<Address>>> {
        self.addresses.load("User.addresses")
    }
}

impl Record for User {
    const VTABLE: &'static ModelVtable = &USER_VTABLE;
}

fn serialize_user(id: Option<i64>, name: &str, email: Option<&str>) -> InsertRow {
    let mut row = InsertRow::new();
    if let Some(id) = id {
        row.push("id", Value::from(id));
    }
    row.push("name", Value::from(name));
    row.push("email", Value::from(email.map(str::to_owned)));
    row
}

fn deserialize_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.require("User", "id")?.to_i64()?,
        name: row.require("User", "name")?.to_text()?,
        email: row.require("User", "email")?.to_text_opt()?,
        addresses: HasMany::unlinked(),
    })
}

fn deserialize_user_erased(row: &Row) -> Result<ErasedRecord> {
    let record: ErasedRecord = Arc::new(deserialize_user(row)?);
    Ok(record)
}

fn attach_user(record: &ErasedRecord, cx: &AttachCx<'_>) -> Result<()> {
    let record = record
        .downcast_ref::<User>()
        .ok_or_else(|| Error::msg("attach received a record that is not `User`"))?;
    record
        .addresses
        .attach(cx.relation("addresses", vec![Value::from(record.id)])?)?;
    Ok(())
}

static ADDRESS_SPEC: TableSpec = TableSpec {
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

static ADDRESS_VTABLE: ModelVtable = ModelVtable {
    spec: &ADDRESS_SPEC,
    deserialize: deserialize_address_erased,
    attach: attach_address,
};

#[derive(Debug)]
struct Address {
    id: i64,
    location: String,
    user_id: i64,
    user: BelongsTo<User>,
}

impl Address {
    fn user(&self) -> Result<Arc<User>> {
        self.user.load_required("Address.user")
    }
}

impl Record for Address {
    const VTABLE: &'static ModelVtable = &ADDRESS_VTABLE;
}

fn serialize_address(location: &str, user_id: i64) -> InsertRow {
    let mut row = InsertRow::new();
    row.push("location", Value::from(location));
    row.push("user_id", Value::from(user_id));
    row
}

fn deserialize_address(row: &Row) -> Result<Address> {
    Ok(Address {
        id: row.require("Address", "id")?.to_i64()?,
        location: row.require("Address", "location")?.to_text()?,
        user_id: row.require("Address", "user_id")?.to_i64()?,
        user: BelongsTo::unlinked(),
    })
}

fn deserialize_address_erased(row: &Row) -> Result<ErasedRecord> {
    let record: ErasedRecord = Arc::new(deserialize_address(row)?);
    Ok(record)
}

fn attach_address(record: &ErasedRecord, cx: &AttachCx<'_>) -> Result<()> {
    let record = record
        .downcast_ref::<Address>()
        .ok_or_else(|| Error::msg("attach received a record that is not `Address`"))?;
    record
        .user
        .attach(cx.relation("user", vec![Value::from(record.user_id)])?)?;
    Ok(())
}

const SCHEMA_SQL: &str = "\
CREATE TABLE \"user\" (\
    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
    \"name\" TEXT NOT NULL, \
    \"email\" TEXT); \
CREATE UNIQUE INDEX \"uidx_user_email\" ON \"user\" (\"email\"); \
CREATE TABLE \"address\" (\
    \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
    \"location\" TEXT NOT NULL, \
    \"user_id\" INTEGER NOT NULL);";

const DATA_SOURCE: DataSourceConfig = DataSourceConfig {
    key: "sqlite",
    provider: "sqlite",
    url: "sqlite:///:memory:",
};

fn backend() -> Arc<Backend> {
    let connection = Connection::open_in_memory().unwrap();
    connection.execute_batch(SCHEMA_SQL).unwrap();
    Backend::new(
        DATA_SOURCE,
        vec![&USER_VTABLE, &ADDRESS_VTABLE],
        ConnectionSource::Connection(connection),
        false,
    )
}

fn seed(backend: &Arc<Backend>) -> (Arc<User>, Arc<User>) {
    let alice = backend
        .insert::<User>(serialize_user(None, "Alice", None))
        .unwrap();
    let bob = backend
        .insert::<User>(serialize_user(None, "Bob", Some("bob@example.com")))
        .unwrap();
    backend
        .insert::<Address>(serialize_address("NYC", alice.id))
        .unwrap();
    backend
        .insert::<Address>(serialize_address("Albany NY", alice.id))
        .unwrap();
    (alice, bob)
}

#[test]
fn insert_reads_back_the_generated_key() {
    let backend = backend();
    let alice = backend
        .insert::<User>(serialize_user(None, "Alice", None))
        .unwrap();
    assert_eq!(alice.id, 1);
    assert_eq!(alice.name, "Alice");
    assert_eq!(alice.email, None);

    let bob = backend
        .insert::<User>(serialize_user(None, "Bob", Some("bob@example.com")))
        .unwrap();
    assert_eq!(bob.id, 2);
}

#[test]
fn insert_many_preserves_payload_order() {
    let backend = backend();
    let users = backend
        .insert_many::<User>(
            vec![
                serialize_user(None, "Alice", None),
                serialize_user(None, "Bob", None),
                serialize_user(None, "Carol", None),
            ],
            None,
        )
        .unwrap();
    let names: Vec<&str> = users.iter().map(|user| user.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob", "Carol"]);
    assert_eq!(users[2].id, 3);
}

#[test]
fn insert_many_in_batches_still_numbers_contiguously() {
    let backend = backend();
    let users = backend
        .insert_many::<User>(
            (0..5)
                .map(|i| serialize_user(None, &format!("user-{i}"), None))
                .collect(),
            Some(2),
        )
        .unwrap();
    let ids: Vec<i64> = users.iter().map(|user| user.id).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5]);
}

#[test]
fn unique_violations_surface_as_integrity_errors() {
    let backend = backend();
    backend
        .insert::<User>(serialize_user(None, "Bob", Some("bob@example.com")))
        .unwrap();
    let err = backend
        .insert::<User>(serialize_user(None, "Robert", Some("bob@example.com")))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::IntegrityViolation);
}

#[test]
fn empty_filter_yields_the_full_table() {
    let backend = backend();
    seed(&backend);
    let users = backend.find_many::<User>(QueryArgs::default()).unwrap();
    assert_eq!(users.len(), 2);
}

#[test]
fn find_first_matches_the_inserted_row() {
    let backend = backend();
    seed(&backend);
    let found = backend
        .find_first::<User>(QueryArgs {
            filter: Some(Filter::eq("name", "Alice")),
            ..QueryArgs::default()
        })
        .unwrap()
        .unwrap();
    assert_eq!(found.id, 1);
}

#[test]
fn order_take_and_skip() {
    let backend = backend();
    seed(&backend);
    let users = backend
        .find_many::<User>(QueryArgs {
            order_by: vec![OrderBy {
                column: "name".into(),
                direction: Direction::Desc,
            }],
            take: Some(1),
            skip: Some(1),
            ..QueryArgs::default()
        })
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Alice");
}

#[test]
fn conjunction_is_equivalent_to_inlined_siblings() {
    let backend = backend();
    seed(&backend);

    let nested = backend
        .find_many::<User>(QueryArgs {
            filter: Some(Filter::And(vec![
                Filter::eq("name", "Alice"),
                Filter::eq("id", 1i64),
            ])),
            ..QueryArgs::default()
        })
        .unwrap();
    let inlined = backend
        .find_many::<User>(QueryArgs {
            filter: Some(Filter::and_from_vec(vec![
                Filter::eq("name", "Alice"),
                Filter::eq("id", 1i64),
            ])),
            ..QueryArgs::default()
        })
        .unwrap();
    assert_eq!(nested.len(), inlined.len());
    assert_eq!(nested[0].id, inlined[0].id);
}

#[test]
fn double_negation_is_identity() {
    let backend = backend();
    seed(&backend);

    let plain = backend
        .find_many::<User>(QueryArgs {
            filter: Some(Filter::eq("name", "Alice")),
            ..QueryArgs::default()
        })
        .unwrap();
    let doubled = backend
        .find_many::<User>(QueryArgs {
            filter: Some(Filter::not(Filter::not(Filter::eq("name", "Alice")))),
            ..QueryArgs::default()
        })
        .unwrap();
    assert_eq!(plain.len(), doubled.len());
    assert_eq!(plain[0].id, doubled[0].id);
}

#[test]
fn relation_filter_selects_parents_through_exists() {
    let backend = backend();
    seed(&backend);

    let with_ny = backend
        .find_many::<User>(QueryArgs {
            filter: Some(Filter::Or(vec![
                Filter::Scalar {
                    column: "name".into(),
                    op: ScalarOp::StartsWith("Z".into()),
                },
                Filter::relation(
                    "addresses",
                    RelationOp::Some,
                    Filter::Scalar {
                        column: "location".into(),
                        op: ScalarOp::Contains("NY".into()),
                    },
                ),
            ])),
            ..QueryArgs::default()
        })
        .unwrap();
    assert_eq!(with_ny.len(), 1);
    assert_eq!(with_ny[0].name, "Alice");
}

#[test]
fn every_is_vacuously_true_for_childless_parents() {
    let backend = backend();
    seed(&backend);

    let all_ny = backend
        .find_many::<User>(QueryArgs {
            filter: Some(Filter::relation(
                "addresses",
                RelationOp::Every,
                Filter::Scalar {
                    column: "location".into(),
                    op: ScalarOp::Contains("NY".into()),
                },
            )),
            ..QueryArgs::default()
        })
        .unwrap();
    // Alice's addresses all contain NY; Bob has none at all.
    assert_eq!(all_ny.len(), 2);
}

#[test]
fn included_relations_do_not_query_on_access() {
    let backend = backend();
    seed(&backend);

    let users = backend
        .find_many::<User>(QueryArgs {
            include: vec!["Address"],
            ..QueryArgs::default()
        })
        .unwrap();

    // With the connection gone, any further access must come from the
    // prefetched state.
    backend.close();

    let alice = users.iter().find(|user| user.name == "Alice").unwrap();
    assert_eq!(alice.addresses().unwrap().len(), 2);
    let bob = users.iter().find(|user| user.name == "Bob").unwrap();
    assert!(bob.addresses().unwrap().is_empty());
}

#[test]
fn lazy_relation_queries_once_and_caches() {
    let backend = backend();
    seed(&backend);

    let users = backend.find_many::<User>(QueryArgs::default()).unwrap();
    let alice = users.iter().find(|user| user.name == "Alice").unwrap();

    let first = alice.addresses().unwrap();
    assert_eq!(first.len(), 2);

    // The second access must not touch the store.
    backend.close();
    let second = alice.addresses().unwrap();
    assert_eq!(second.len(), 2);
    assert!(Arc::ptr_eq(&first[0], &second[0]));
}

#[test]
fn first_lazy_access_covers_the_whole_batch() {
    let backend = backend();
    seed(&backend);

    let users = backend.find_many::<User>(QueryArgs::default()).unwrap();
    let alice = users.iter().find(|user| user.name == "Alice").unwrap();
    let bob = users.iter().find(|user| user.name == "Bob").unwrap();

    // One access resolves the relation for every parent of the batch.
    assert_eq!(alice.addresses().unwrap().len(), 2);

    backend.close();
    assert!(bob.addresses().unwrap().is_empty());
}

#[test]
fn failed_lazy_resolution_does_not_poison_the_slot() {
    let backend = backend();
    seed(&backend);

    let users = backend.find_many::<User>(QueryArgs::default()).unwrap();
    let alice = users.iter().find(|user| user.name == "Alice").unwrap();

    backend.close();
    let first = alice.addresses().unwrap_err();
    assert_eq!(first.category(), ErrorCategory::ConnectionClosed);
    // Still unresolved, still answerable with an error rather than a
    // poisoned state.
    let second = alice.addresses().unwrap_err();
    assert_eq!(second.category(), ErrorCategory::ConnectionClosed);
}

#[test]
fn parents_sharing_a_child_observe_the_same_instance() {
    let backend = backend();
    let (alice, _) = seed(&backend);

    // Two addresses belonging to one user, loaded with the user included.
    let addresses = backend
        .find_many::<Address>(QueryArgs {
            include: vec!["User"],
            ..QueryArgs::default()
        })
        .unwrap();
    assert_eq!(addresses.len(), 2);

    backend.close();
    let first_owner = addresses[0].user().unwrap();
    let second_owner = addresses[1].user().unwrap();
    assert!(Arc::ptr_eq(&first_owner, &second_owner));
    assert_eq!(first_owner.id, alice.id);
}

#[test]
fn unknown_filter_keys_are_rejected() {
    let backend = backend();
    let err = backend
        .find_many::<User>(QueryArgs {
            filter: Some(Filter::eq("nme", "Alice")),
            ..QueryArgs::default()
        })
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidFilter);
}

#[test]
fn schema_drift_surfaces_as_no_such_table() {
    let connection = Connection::open_in_memory().unwrap();
    let backend = Backend::new(
        DATA_SOURCE,
        vec![&USER_VTABLE, &ADDRESS_VTABLE],
        ConnectionSource::Connection(connection),
        false,
    );
    let err = backend.find_many::<User>(QueryArgs::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NoSuchTable);
}

#[test]
fn raw_escape_hatches() {
    let backend = backend();
    seed(&backend);

    let rows = backend
        .query_raw("SELECT COUNT(*) AS n FROM \"user\"", &[])
        .unwrap();
    assert_eq!(rows[0].get("n").unwrap().to_i64().unwrap(), 2);

    let affected = backend
        .execute_raw("DELETE FROM \"address\" WHERE \"location\" = ?", &[Value::from("NYC")])
        .unwrap();
    assert_eq!(affected, 1);
}

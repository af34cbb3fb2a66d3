use crumpet_codegen::inspect;
use crumpet_core::schema::app::FieldTy;
use crumpet_core::schema::Cardinality;
use crumpet_core::stmt::Type;
use crumpet_core::ErrorCategory;

const BLOG: &str = r#"
pub const DATASOURCE: DataSource = DataSource {
    provider: "sqlite",
    url: "sqlite:///:memory:",
    name: None,
};

pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub last_login: DateTime<Utc>,
    #[default(now)]
    pub created_at: DateTime<Utc>,
    pub addresses: Vec<Address>,
}

impl User {
    fn index(&self) { self.name }
    fn unique(&self) { self.email }
}

pub struct Address {
    pub id: i64,
    pub location: String,
    pub user_id: i64,
    pub user: User,
}

impl Address {
    fn foreign_key(&self) {
        (self.user.id == self.user_id, User::addresses)
    }
}
"#;

#[test]
fn tables_are_lowercased_model_names() {
    let schema = inspect(&[BLOG]).unwrap();
    let user = schema.model_by_name("User").unwrap();
    assert_eq!(user.table_name, "user");
    assert_eq!(schema.model_by_name("Address").unwrap().table_name, "address");
}

#[test]
fn implicit_integer_id_becomes_the_auto_increment_key() {
    let schema = inspect(&[BLOG]).unwrap();
    let user = schema.model_by_name("User").unwrap();
    assert!(user.primary_key.auto_increment);
    assert_eq!(user.primary_key_columns(), vec!["id"]);
    assert!(user.fields[0].expect_column().auto_increment);
}

#[test]
fn explicit_primary_key_method_overrides_the_id_rule() {
    let source = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///:memory:", name: None };

pub struct Membership {
    pub org_id: i64,
    pub user_id: i64,
    pub id: i64,
}

impl Membership {
    fn primary_key(&self) { (self.org_id, self.user_id) }
}
"#;
    let schema = inspect(&[source]).unwrap();
    let membership = schema.model_by_name("Membership").unwrap();
    assert!(!membership.primary_key.auto_increment);
    assert_eq!(membership.primary_key_columns(), vec!["org_id", "user_id"]);
    assert!(!membership.fields[2].expect_column().auto_increment);
}

#[test]
fn columns_keep_declaration_order_and_types() {
    let schema = inspect(&[BLOG]).unwrap();
    let user = schema.model_by_name("User").unwrap();
    let columns: Vec<(&str, Type, bool)> = user
        .columns()
        .map(|field| {
            let column = field.expect_column();
            (field.name.as_str(), column.ty, column.nullable)
        })
        .collect();
    assert_eq!(
        columns,
        vec![
            ("id", Type::I64, false),
            ("name", Type::String, false),
            ("email", Type::String, true),
            ("last_login", Type::DateTime, false),
            ("created_at", Type::DateTime, false),
        ]
    );
}

#[test]
fn foreign_key_comparison_binds_column_pairs() {
    let schema = inspect(&[BLOG]).unwrap();
    let address = schema.model_by_name("Address").unwrap();

    assert_eq!(address.foreign_keys.len(), 1);
    let fk = &address.foreign_keys[0];
    assert_eq!(fk.source_columns(&schema), vec!["user_id"]);
    assert_eq!(fk.target_columns(&schema), vec!["id"]);
    assert_eq!(fk.remote_attr.as_deref(), Some("addresses"));
    assert_eq!(schema.model(fk.target).name, "User");
}

#[test]
fn relations_resolve_forward_references_both_ways() {
    // `User.addresses` names `Address` before it is declared.
    let schema = inspect(&[BLOG]).unwrap();

    let user = schema.model_by_name("User").unwrap();
    let addresses = user.field_by_name("addresses").unwrap().expect_relation();
    assert_eq!(addresses.cardinality, Cardinality::Many);
    assert!(addresses.remote_fk.is_some());

    let address = schema.model_by_name("Address").unwrap();
    let owner = address.field_by_name("user").unwrap().expect_relation();
    assert_eq!(owner.cardinality, Cardinality::One);
    assert_eq!(owner.local_fk, Some(0));
}

#[test]
fn indexes_follow_yield_order() {
    let schema = inspect(&[BLOG]).unwrap();
    let user = schema.model_by_name("User").unwrap();
    assert_eq!(user.indexes.len(), 2);
    assert!(!user.indexes[0].unique);
    assert_eq!(user.fields[user.indexes[0].fields[0]].name, "name");
    assert!(user.indexes[1].unique);
    assert_eq!(user.fields[user.indexes[1].fields[0]].name, "email");
}

#[test]
fn unknown_relation_target_is_reported() {
    let source = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///:memory:", name: None };

pub struct Post {
    pub id: i64,
    pub author: Author,
}
"#;
    let err = inspect(&[source]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnknownModelReference);
    assert!(err.to_string().contains("Author"), "{err}");
}

#[test]
fn unsupported_scalar_annotation_is_an_inference_failure() {
    let source = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///:memory:", name: None };

pub struct Reading {
    pub id: i64,
    pub samples: Vec<f64>,
}
"#;
    let err = inspect(&[source]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::SchemaInference);
}

#[test]
fn missing_primary_key_is_reported() {
    let source = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///:memory:", name: None };

pub struct Log {
    pub message: String,
}
"#;
    let err = inspect(&[source]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::MissingPrimaryKey);
}

#[test]
fn duplicate_tables_within_one_datasource_are_rejected() {
    let source = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///:memory:", name: None };

pub struct Thing { pub id: i64 }
pub struct THING { pub id: i64 }
"#;
    let err = inspect(&[source]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::DuplicateTable);
}

#[test]
fn same_table_in_different_datasources_is_allowed() {
    let first = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///a.db", name: Some("a") };
pub struct Thing { pub id: i64 }
"#;
    let second = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///b.db", name: Some("b") };
pub struct Thing { pub id: i64 }
"#;
    let schema = inspect(&[first, second]).unwrap();
    assert_eq!(schema.models.len(), 2);
    assert_eq!(schema.data_sources.len(), 2);
}

#[test]
fn many_relation_without_a_foreign_key_is_unresolved() {
    let source = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///:memory:", name: None };

pub struct User {
    pub id: i64,
    pub addresses: Vec<Address>,
}

pub struct Address {
    pub id: i64,
    pub user_id: i64,
}
"#;
    let err = inspect(&[source]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnresolvedRelation);
}

#[test]
fn overlapping_foreign_keys_without_backrefs_are_ambiguous() {
    let source = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///:memory:", name: None };

pub struct User {
    pub id: i64,
}

pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author: User,
    pub reviewer: User,
}

impl Post {
    fn foreign_key(&self) {
        [
            self.author.id == self.author_id,
            self.reviewer.id == self.author_id,
        ]
    }
}
"#;
    let err = inspect(&[source]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AmbiguousForeignKey);
}

#[test]
fn enum_columns_record_their_member_mapping() {
    let source = r#"
pub const DATASOURCE: DataSource = DataSource { provider: "sqlite", url: "sqlite:///:memory:", name: None };

pub enum Role {
    Admin = 1,
    Member = 2,
}

pub struct Account {
    pub id: i64,
    pub role: Role,
}
"#;
    let schema = inspect(&[source]).unwrap();
    let account = schema.model_by_name("Account").unwrap();
    let role = account.field_by_name("role").unwrap().expect_column();
    let Type::Enum(id) = role.ty else {
        panic!("expected enum column");
    };
    let def = schema.enum_def(id);
    assert_eq!(def.name, "Role");
    assert_eq!(def.variants[0].discriminant, 1);
    assert_eq!(def.variants[1].discriminant, 2);
}

#[test]
fn relation_fields_are_not_columns() {
    let schema = inspect(&[BLOG]).unwrap();
    let user = schema.model_by_name("User").unwrap();
    assert!(matches!(
        user.field_by_name("addresses").unwrap().ty,
        FieldTy::Relation(_)
    ));
    assert_eq!(user.columns().count(), 5);
}

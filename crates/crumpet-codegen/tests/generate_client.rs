use crumpet_codegen::generate;

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
fn identical_inspection_output_yields_identical_text() {
    let first = generate(&[BLOG]).unwrap();
    let second = generate(&[BLOG]).unwrap();
    assert_eq!(first.code, second.code);
    assert_eq!(first.model_names, vec!["Address", "User"]);
}

#[test]
fn module_carries_the_generated_marker() {
    let module = generate(&[BLOG]).unwrap();
    assert!(module.code.starts_with("// Generated by crumpet."));
}

#[test]
fn emits_the_per_model_surface() {
    let code = generate(&[BLOG]).unwrap().code;

    for item in [
        "pub enum UserIncludeCol",
        "pub enum UserSortableCol",
        "pub struct UserInsert",
        "pub struct UserWhere",
        "pub struct UserInclude",
        "pub struct UserQuery",
        "pub struct UserTable",
        "pub fn serialize_user",
        "pub fn deserialize_user",
        "pub struct AddressTable",
        "pub struct Client",
    ] {
        assert!(code.contains(item), "missing `{item}`");
    }
}

#[test]
fn include_union_lists_related_type_names() {
    let code = generate(&[BLOG]).unwrap().code;
    assert!(code.contains("pub enum UserIncludeCol { Address , }"), "{code}");
}

#[test]
fn sortable_union_lists_scalar_columns_in_declaration_order() {
    let code = generate(&[BLOG]).unwrap().code;
    assert!(
        code.contains("pub enum UserSortableCol { Id , Name , Email , LastLogin , CreatedAt , }"),
        "{code}"
    );
}

#[test]
fn auto_increment_key_is_optional_on_the_insert_record() {
    let code = generate(&[BLOG]).unwrap().code;
    assert!(code.contains("pub struct UserInsert { pub id : Option < i64 >"), "{code}");
    // Non-key columns keep their declared types.
    assert!(code.contains("pub email : Option < String >"), "{code}");
    assert!(code.contains("pub last_login : DateTime < Utc >"), "{code}");
}

#[test]
fn insert_constructor_fills_declared_defaults() {
    let code = generate(&[BLOG]).unwrap().code;
    assert!(
        code.contains("pub fn new (name : String , email : Option < String > , last_login : DateTime < Utc >)"),
        "{code}"
    );
    assert!(code.contains("created_at : Utc :: now ()"), "{code}");
}

#[test]
fn table_spec_static_captures_keys_and_relations() {
    let code = generate(&[BLOG]).unwrap().code;
    assert!(code.contains("pub static USER_SPEC : TableSpec"), "{code}");
    assert!(code.contains(r#"auto_increment : Some ("id")"#), "{code}");
    assert!(
        code.contains(r#"RelationSpec { name : "addresses" , target : "Address" , cardinality : Cardinality :: Many , join : & [("id" , "user_id")] , }"#),
        "{code}"
    );
    assert!(
        code.contains(r#"ForeignKeySpec { columns : & ["user_id"] , target_model : "User" , target_columns : & ["id"] , local_attr : Some ("user") , remote_attr : Some ("addresses") , }"#),
        "{code}"
    );
}

#[test]
fn indexes_are_named_after_table_and_columns() {
    let code = generate(&[BLOG]).unwrap().code;
    assert!(
        code.contains(r#"IndexSpec { columns : & ["name"] , unique : false }"#),
        "{code}"
    );
    assert!(
        code.contains(r#"IndexSpec { columns : & ["email"] , unique : true }"#),
        "{code}"
    );
}

#[test]
fn client_exposes_snake_cased_tables() {
    let code = generate(&[BLOG]).unwrap().code;
    assert!(code.contains("pub user : UserTable"), "{code}");
    assert!(code.contains("pub address : AddressTable"), "{code}");
}

#[test]
fn enum_columns_emit_their_stored_mapping() {
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
    let code = generate(&[source]).unwrap().code;
    assert!(code.contains("pub enum Role { Admin = 1 , Member = 2 , }"), "{code}");
    assert!(code.contains("pub fn to_stored (self) -> i64"), "{code}");
    assert!(code.contains("pub fn from_stored (value : i64) -> Result < Role >"), "{code}");
}

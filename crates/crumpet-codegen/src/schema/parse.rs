//! First-stage parse of one model source: collect the datasource
//! descriptor, record structs, enum columns, and key methods, without
//! interpreting anything yet.

use crumpet_core::{Error, Result};

use std::collections::HashMap;

pub(crate) struct RawSource {
    pub(crate) data_source: RawDataSource,
    pub(crate) records: Vec<RawRecord>,
    pub(crate) enums: Vec<RawEnum>,
}

pub(crate) struct RawDataSource {
    pub(crate) provider: String,
    pub(crate) url: String,
    pub(crate) name: Option<String>,
}

pub(crate) struct RawRecord {
    pub(crate) name: String,
    pub(crate) fields: Vec<RawField>,
    /// Key methods from the record's impl blocks, by method name.
    pub(crate) methods: HashMap<String, syn::ImplItemFn>,
}

pub(crate) struct RawField {
    pub(crate) name: String,
    pub(crate) ty: syn::Type,
    pub(crate) default: Option<RawDefault>,
    pub(crate) storage: Option<String>,
}

pub(crate) enum RawDefault {
    Literal(syn::Lit),
    Now,
}

pub(crate) struct RawEnum {
    pub(crate) name: String,
    pub(crate) variants: Vec<(String, i64)>,
}

const KEY_METHODS: &[&str] = &["primary_key", "index", "unique", "foreign_key"];

pub(crate) fn parse(source: &str) -> Result<RawSource> {
    let file = syn::parse_file(source).map_err(|err| Error::model_parse(err.to_string()))?;

    let mut data_source = None;
    let mut records: Vec<RawRecord> = Vec::new();
    let mut enums = Vec::new();
    let mut methods: HashMap<String, HashMap<String, syn::ImplItemFn>> = HashMap::new();

    for item in &file.items {
        match item {
            syn::Item::Struct(item) => records.push(parse_record(item)?),
            syn::Item::Enum(item) => enums.push(parse_enum(item)?),
            syn::Item::Impl(item) => {
                let Some(name) = impl_target(item) else {
                    continue;
                };
                let target = methods.entry(name).or_default();
                for entry in &item.items {
                    if let syn::ImplItem::Fn(method) = entry {
                        let method_name = method.sig.ident.to_string();
                        if KEY_METHODS.contains(&method_name.as_str()) {
                            target.insert(method_name, method.clone());
                        }
                    }
                }
            }
            syn::Item::Const(item) if item.ident == "DATASOURCE" => {
                data_source = Some(parse_data_source(&item.expr)?);
            }
            syn::Item::Static(item) if item.ident == "DATASOURCE" => {
                data_source = Some(parse_data_source(&item.expr)?);
            }
            _ => {}
        }
    }

    let Some(data_source) = data_source else {
        return Err(Error::model_parse(
            "model module does not declare a `DATASOURCE` descriptor",
        ));
    };

    for record in &mut records {
        if let Some(found) = methods.remove(&record.name) {
            record.methods = found;
        }
    }

    Ok(RawSource {
        data_source,
        records,
        enums,
    })
}

fn impl_target(item: &syn::ItemImpl) -> Option<String> {
    if item.trait_.is_some() {
        return None;
    }
    let syn::Type::Path(path) = &*item.self_ty else {
        return None;
    };
    path.path.get_ident().map(|ident| ident.to_string())
}

fn parse_record(item: &syn::ItemStruct) -> Result<RawRecord> {
    let name = item.ident.to_string();

    let syn::Fields::Named(fields) = &item.fields else {
        return Err(Error::model_parse(format!(
            "record `{name}` must have named fields"
        )));
    };

    let mut parsed = Vec::new();
    for field in &fields.named {
        let field_name = field
            .ident
            .as_ref()
            .map(|ident| ident.to_string())
            .unwrap_or_default();

        let mut default = None;
        let mut storage = None;
        for attr in &field.attrs {
            if attr.path().is_ident("default") {
                default = Some(parse_default(&name, &field_name, attr)?);
            } else if attr.path().is_ident("storage") {
                storage = Some(parse_storage(&name, &field_name, attr)?);
            }
        }

        parsed.push(RawField {
            name: field_name,
            ty: field.ty.clone(),
            default,
            storage,
        });
    }

    Ok(RawRecord {
        name,
        fields: parsed,
        methods: HashMap::new(),
    })
}

/// `#[default(<literal>)]` or `#[default(now)]`.
fn parse_default(record: &str, field: &str, attr: &syn::Attribute) -> Result<RawDefault> {
    let expr: syn::Expr = attr
        .parse_args()
        .map_err(|_| bad_attr(record, field, "default"))?;
    match expr {
        syn::Expr::Lit(lit) => Ok(RawDefault::Literal(lit.lit)),
        syn::Expr::Path(path) if path.path.is_ident("now") => Ok(RawDefault::Now),
        _ => Err(bad_attr(record, field, "default")),
    }
}

/// `#[storage("TEXT")]`.
fn parse_storage(record: &str, field: &str, attr: &syn::Attribute) -> Result<String> {
    let lit: syn::LitStr = attr
        .parse_args()
        .map_err(|_| bad_attr(record, field, "storage"))?;
    Ok(lit.value())
}

fn bad_attr(record: &str, field: &str, attr: &str) -> Error {
    Error::model_parse(format!(
        "record `{record}` field `{field}` has a malformed `#[{attr}(…)]` attribute"
    ))
}

fn parse_enum(item: &syn::ItemEnum) -> Result<RawEnum> {
    let name = item.ident.to_string();
    let mut variants = Vec::new();
    let mut next = 0i64;

    for variant in &item.variants {
        if !matches!(variant.fields, syn::Fields::Unit) {
            return Err(Error::model_parse(format!(
                "enum `{name}` variant `{}` must be a unit variant",
                variant.ident
            )));
        }

        let discriminant = match &variant.discriminant {
            Some((_, expr)) => parse_discriminant(&name, expr)?,
            None => next,
        };
        next = discriminant + 1;
        variants.push((variant.ident.to_string(), discriminant));
    }

    Ok(RawEnum { name, variants })
}

fn parse_discriminant(name: &str, expr: &syn::Expr) -> Result<i64> {
    let err = || Error::model_parse(format!("enum `{name}` has a non-integer discriminant"));

    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(lit),
            ..
        }) => lit.base10_parse().map_err(|_| err()),
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => match &**expr {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Int(lit),
                ..
            }) => lit.base10_parse::<i64>().map(|v| -v).map_err(|_| err()),
            _ => Err(err()),
        },
        _ => Err(err()),
    }
}

/// `const DATASOURCE: DataSource = DataSource { provider: "…", url: "…", name: … };`
fn parse_data_source(expr: &syn::Expr) -> Result<RawDataSource> {
    let err = |detail: &str| Error::model_parse(format!("malformed `DATASOURCE`: {detail}"));

    let syn::Expr::Struct(value) = expr else {
        return Err(err("expected a struct literal"));
    };

    let mut provider = None;
    let mut url = None;
    let mut name = None;

    for field in &value.fields {
        let syn::Member::Named(ident) = &field.member else {
            continue;
        };
        match ident.to_string().as_str() {
            "provider" => provider = Some(string_literal(&field.expr).ok_or_else(|| err("`provider` must be a string literal"))?),
            "url" => url = Some(string_literal(&field.expr).ok_or_else(|| err("`url` must be a string literal"))?),
            "name" => name = optional_string(&field.expr).map_err(|_| err("`name` must be `None` or `Some(\"…\")`"))?,
            other => return Err(err(&format!("unknown field `{other}`"))),
        }
    }

    Ok(RawDataSource {
        provider: provider.ok_or_else(|| err("missing `provider`"))?,
        url: url.ok_or_else(|| err("missing `url`"))?,
        name,
    })
}

fn string_literal(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) => Some(lit.value()),
        _ => None,
    }
}

fn optional_string(expr: &syn::Expr) -> Result<Option<String>, ()> {
    match expr {
        syn::Expr::Path(path) if path.path.is_ident("None") => Ok(None),
        syn::Expr::Call(call) => {
            let syn::Expr::Path(func) = &*call.func else {
                return Err(());
            };
            if !func.path.is_ident("Some") || call.args.len() != 1 {
                return Err(());
            }
            string_literal(&call.args[0]).map(Some).ok_or(())
        }
        _ => Err(()),
    }
}

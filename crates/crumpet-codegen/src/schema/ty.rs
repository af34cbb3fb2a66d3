//! Field annotation resolution: native scalar types, enum columns, and
//! model references with their cardinality.

use crumpet_core::schema::Cardinality;
use crumpet_core::stmt::{EnumId, Type};
use crumpet_core::{Error, Result};

use std::collections::HashMap;

pub(crate) enum ResolvedTy {
    Column { ty: Type, nullable: bool },
    Relation {
        target: String,
        cardinality: Cardinality,
    },
}

pub(crate) struct TypeContext<'a> {
    pub(crate) models: &'a [String],
    pub(crate) enums: &'a HashMap<String, EnumId>,
}

enum Base {
    Scalar(Type),
    Model(String),
    /// `Vec<Model>`.
    Many(String),
}

pub(crate) fn resolve(
    cx: &TypeContext<'_>,
    model: &str,
    field: &str,
    ty: &syn::Type,
) -> Result<ResolvedTy> {
    // An unrecognized type-looking name is an unknown record reference; a
    // shape with no mapping at all is an inference failure.
    let unmapped = || match reference_candidate(cx, ty) {
        Some(name) => Error::unknown_model_reference(model, name),
        None => {
            Error::schema_inference(model, field, quote::quote!(#ty).to_string().replace(' ', ""))
        }
    };

    let (ident, argument) = split(ty).ok_or_else(unmapped)?;

    // Cardinality comes straight off the annotation: `Option<T>` is
    // optional, `Vec<Model>` is many, a bare model is one.
    if ident == "Option" {
        let inner = argument.ok_or_else(unmapped)?;
        return match base(cx, inner).ok_or_else(unmapped)? {
            Base::Scalar(ty) => Ok(ResolvedTy::Column { ty, nullable: true }),
            Base::Model(target) => Ok(ResolvedTy::Relation {
                target,
                cardinality: Cardinality::OptionalOne,
            }),
            Base::Many(_) => Err(unmapped()),
        };
    }

    match base(cx, ty).ok_or_else(unmapped)? {
        Base::Scalar(ty) => Ok(ResolvedTy::Column {
            ty,
            nullable: false,
        }),
        Base::Model(target) => Ok(ResolvedTy::Relation {
            target,
            cardinality: Cardinality::One,
        }),
        Base::Many(target) => Ok(ResolvedTy::Relation {
            target,
            cardinality: Cardinality::Many,
        }),
    }
}

fn base(cx: &TypeContext<'_>, ty: &syn::Type) -> Option<Base> {
    let (ident, argument) = split(ty)?;

    match ident.as_str() {
        "Vec" => {
            let (inner, _) = split(argument?)?;
            if inner == "u8" {
                Some(Base::Scalar(Type::Bytes))
            } else if cx.models.contains(&inner) {
                Some(Base::Many(inner))
            } else {
                None
            }
        }
        // The zone parameter of `DateTime<Utc>` is not itself a column type.
        "DateTime" => Some(Base::Scalar(Type::DateTime)),
        "i64" => Some(Base::Scalar(Type::I64)),
        "f64" => Some(Base::Scalar(Type::F64)),
        "bool" => Some(Base::Scalar(Type::Bool)),
        "String" => Some(Base::Scalar(Type::String)),
        "NaiveDate" => Some(Base::Scalar(Type::Date)),
        "NaiveTime" => Some(Base::Scalar(Type::Time)),
        _ if argument.is_none() => {
            if cx.models.contains(&ident) {
                Some(Base::Model(ident))
            } else {
                cx.enums.get(&ident).map(|id| Base::Scalar(Type::Enum(*id)))
            }
        }
        _ => None,
    }
}

/// The capitalized identifier an unmappable annotation was probably meant
/// to reference, looking through `Option`/`Vec` wrappers.
fn reference_candidate(cx: &TypeContext<'_>, ty: &syn::Type) -> Option<String> {
    let (ident, argument) = split(ty)?;
    if matches!(ident.as_str(), "Option" | "Vec") {
        return reference_candidate(cx, argument?);
    }
    let known = matches!(
        ident.as_str(),
        "i64" | "f64" | "bool" | "String" | "DateTime" | "NaiveDate" | "NaiveTime" | "u8"
    ) || cx.models.contains(&ident)
        || cx.enums.contains_key(&ident);
    if known {
        return None;
    }
    ident
        .chars()
        .next()
        .filter(|first| first.is_ascii_uppercase())
        .map(|_| ident)
}

/// Splits a path type into its final identifier and single generic
/// argument, if any. `chrono::DateTime<Utc>` splits the same way as
/// `DateTime<Utc>`.
fn split(ty: &syn::Type) -> Option<(String, Option<&syn::Type>)> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    let ident = segment.ident.to_string();

    let argument = match &segment.arguments {
        syn::PathArguments::None => None,
        syn::PathArguments::AngleBracketed(args) => {
            let mut types = args.args.iter().filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            });
            let first = types.next();
            if types.next().is_some() {
                return None;
            }
            first
        }
        syn::PathArguments::Parenthesized(_) => return None,
    };

    Some((ident, argument))
}

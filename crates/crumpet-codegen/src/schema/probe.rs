//! The fake-self probe: symbolic evaluation of a key method's body.
//!
//! The sentinel receiver resolves `self.a.b` chains into captured paths;
//! equality between two captured paths becomes a foreign-key comparison
//! without ever evaluating to a boolean. Anything else the author writes —
//! arithmetic, literals, method calls — fails early with a probe error.

use crumpet_core::{Error, Result};

/// What a probed expression evaluated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProbeValue {
    /// `self.a` or `self.a.b` — an attribute chain off the sentinel.
    Col(Vec<String>),

    /// `Model::attr` — a reference to an attribute of another record.
    RemoteAttr { model: String, attr: String },

    /// `lhs == rhs` over two attribute chains.
    Cmp {
        left: Vec<String>,
        right: Vec<String>,
    },

    Tuple(Vec<ProbeValue>),
    Array(Vec<ProbeValue>),
}

/// Runs a key method against the sentinel receiver.
///
/// The body must be a single trailing expression; `primary_key` and friends
/// are declarations, not code paths.
pub(crate) fn eval_method(model: &str, method: &syn::ImplItemFn) -> Result<ProbeValue> {
    let name = method.sig.ident.to_string();

    let expr = match &method.block.stmts[..] {
        [syn::Stmt::Expr(expr, None)] => expr,
        _ => {
            return Err(Error::probe(
                model,
                name,
                "body must be a single trailing expression",
            ))
        }
    };

    eval_expr(model, &name, expr)
}

fn eval_expr(model: &str, method: &str, expr: &syn::Expr) -> Result<ProbeValue> {
    match expr {
        syn::Expr::Paren(inner) => eval_expr(model, method, &inner.expr),

        syn::Expr::Field(_) | syn::Expr::Path(_) => eval_reference(model, method, expr),

        syn::Expr::Binary(binary) => match binary.op {
            syn::BinOp::Eq(_) => {
                let left = eval_reference(model, method, &binary.left)?;
                let right = eval_reference(model, method, &binary.right)?;
                match (left, right) {
                    (ProbeValue::Col(left), ProbeValue::Col(right)) => {
                        Ok(ProbeValue::Cmp { left, right })
                    }
                    _ => Err(Error::probe(
                        model,
                        method,
                        "both sides of `==` must be attribute chains on `self`",
                    )),
                }
            }
            _ => Err(Error::probe(
                model,
                method,
                "only `==` comparisons are understood; arithmetic and other operators are not",
            )),
        },

        syn::Expr::Tuple(tuple) => Ok(ProbeValue::Tuple(
            tuple
                .elems
                .iter()
                .map(|elem| eval_expr(model, method, elem))
                .collect::<Result<_>>()?,
        )),

        syn::Expr::Array(array) => Ok(ProbeValue::Array(
            array
                .elems
                .iter()
                .map(|elem| eval_expr(model, method, elem))
                .collect::<Result<_>>()?,
        )),

        other => Err(Error::probe(
            model,
            method,
            format!("unsupported expression `{}`", render(other)),
        )),
    }
}

/// Resolves `self.a.b` chains and `Model::attr` paths.
fn eval_reference(model: &str, method: &str, expr: &syn::Expr) -> Result<ProbeValue> {
    match expr {
        syn::Expr::Paren(inner) => eval_reference(model, method, &inner.expr),

        syn::Expr::Field(field) => {
            let syn::Member::Named(ident) = &field.member else {
                return Err(Error::probe(model, method, "tuple-field access is not an attribute"));
            };
            let mut base = eval_reference(model, method, &field.base)?;
            match &mut base {
                ProbeValue::Col(path) => {
                    path.push(ident.to_string());
                    Ok(base)
                }
                _ => Err(Error::probe(
                    model,
                    method,
                    "attribute access must start from `self`",
                )),
            }
        }

        syn::Expr::Path(path) => {
            let segments: Vec<String> = path
                .path
                .segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect();
            match &segments[..] {
                [receiver] if receiver == "self" => Ok(ProbeValue::Col(Vec::new())),
                [model_name, attr] => Ok(ProbeValue::RemoteAttr {
                    model: model_name.clone(),
                    attr: attr.clone(),
                }),
                _ => Err(Error::probe(
                    model,
                    method,
                    format!("unsupported path `{}`", segments.join("::")),
                )),
            }
        }

        other => Err(Error::probe(
            model,
            method,
            format!("unsupported expression `{}`", render(other)),
        )),
    }
}

fn render(expr: &syn::Expr) -> String {
    quote::quote!(#expr).to_string()
}

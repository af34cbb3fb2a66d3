//! Lowers the nested filter language into SQL conditions.
//!
//! Relation operators become correlated `EXISTS` subqueries whose join
//! predicate comes from the relation's foreign-key pairs; `every` is the
//! vacuously-true form `NOT EXISTS (… AND NOT …)`.

use super::{Formatter, Ident, Qualified, ToSql};

use crumpet_core::schema::spec::{Cardinality, SpecLookup, TableSpec};
use crumpet_core::stmt::{Filter, OrderBy, RelationOp, ScalarOp, Value};
use crumpet_core::{Error, Result};

/// Checks every key of the filter against the model's spec before any SQL
/// is written.
pub(crate) fn validate(
    spec: &'static TableSpec,
    lookup: &dyn SpecLookup,
    filter: &Filter,
) -> Result<()> {
    match filter {
        Filter::Scalar { column, .. } => {
            if spec.column(column).is_none() {
                return Err(Error::invalid_filter(
                    spec.model,
                    column,
                    "unknown column or relation",
                ));
            }
            Ok(())
        }
        Filter::And(operands) | Filter::Or(operands) => {
            for operand in operands {
                validate(spec, lookup, operand)?;
            }
            Ok(())
        }
        Filter::Not(operand) => validate(spec, lookup, operand),
        Filter::Relation { attr, op, filter } => {
            let Some(relation) = spec.relation(attr) else {
                return Err(Error::invalid_filter(
                    spec.model,
                    attr,
                    "unknown column or relation",
                ));
            };

            let many = relation.cardinality == Cardinality::Many;
            if op.requires_many() && !many {
                return Err(Error::invalid_filter(
                    spec.model,
                    attr,
                    format!("`{}` applies only to many relations", op.name()),
                ));
            }
            if !op.requires_many() && many {
                return Err(Error::invalid_filter(
                    spec.model,
                    attr,
                    format!("`{}` does not apply to many relations", op.name()),
                ));
            }

            let Some(target) = lookup.spec(relation.target) else {
                return Err(Error::invalid_filter(
                    spec.model,
                    attr,
                    format!("relation target `{}` is not registered", relation.target),
                ));
            };

            validate(target, lookup, filter)
        }
    }
}

/// Sortable columns are exactly the scalar columns.
pub(crate) fn validate_order_by(spec: &'static TableSpec, order_by: &[OrderBy]) -> Result<()> {
    for order in order_by {
        if spec.column(&order.column).is_none() {
            return Err(Error::invalid_filter(
                spec.model,
                &order.column,
                "unknown sortable column",
            ));
        }
    }
    Ok(())
}

/// Renders a validated filter. Sibling operands of `and`/`or` are each
/// parenthesized; single-operand groups collapse to the operand itself.
pub(crate) fn render(spec: &TableSpec, filter: &Filter, f: &mut Formatter<'_>) {
    match filter {
        Filter::Scalar { column, op } => render_scalar(spec, column, op, f),
        Filter::And(operands) => render_group(spec, operands, " AND ", "1 = 1", f),
        Filter::Or(operands) => render_group(spec, operands, " OR ", "1 = 0", f),
        Filter::Not(operand) => {
            fmt!(f, "NOT (");
            render(spec, operand, f);
            fmt!(f, ")");
        }
        Filter::Relation { attr, op, filter } => render_relation(spec, attr, *op, filter, f),
    }
}

fn render_group(
    spec: &TableSpec,
    operands: &[Filter],
    connective: &str,
    empty: &str,
    f: &mut Formatter<'_>,
) {
    match operands {
        [] => fmt!(f, empty),
        [only] => render(spec, only, f),
        _ => {
            let mut first = true;
            for operand in operands {
                if !first {
                    fmt!(f, connective);
                }
                first = false;
                fmt!(f, "(");
                render(spec, operand, f);
                fmt!(f, ")");
            }
        }
    }
}

fn render_scalar(spec: &TableSpec, column: &str, op: &ScalarOp, f: &mut Formatter<'_>) {
    let col = Qualified(spec.table, column);

    match op {
        // Equality against null folds into the null test.
        ScalarOp::Eq(Value::Null) => fmt!(f, col " IS NULL"),
        ScalarOp::Ne(Value::Null) => fmt!(f, col " IS NOT NULL"),
        ScalarOp::Eq(value) => binary(col, "=", value, f),
        ScalarOp::Ne(value) => binary(col, "<>", value, f),
        ScalarOp::Lt(value) => binary(col, "<", value, f),
        ScalarOp::Lte(value) => binary(col, "<=", value, f),
        ScalarOp::Gt(value) => binary(col, ">", value, f),
        ScalarOp::Gte(value) => binary(col, ">=", value, f),
        ScalarOp::In(values) => in_list(col, values, false, f),
        ScalarOp::NotIn(values) => in_list(col, values, true, f),
        ScalarOp::Contains(text) => like(col, format!("%{text}%"), f),
        ScalarOp::StartsWith(text) => like(col, format!("{text}%"), f),
        ScalarOp::EndsWith(text) => like(col, format!("%{text}"), f),
        ScalarOp::IsNull(true) => fmt!(f, col " IS NULL"),
        ScalarOp::IsNull(false) => fmt!(f, col " IS NOT NULL"),
    }
}

fn binary(col: Qualified<'_>, op: &str, value: &Value, f: &mut Formatter<'_>) {
    fmt!(f, col " " op " ");
    f.param(value);
}

fn in_list(col: Qualified<'_>, values: &[Value], negated: bool, f: &mut Formatter<'_>) {
    if values.is_empty() {
        // An empty list matches nothing; its negation matches everything.
        fmt!(f, if negated { "1 = 1" } else { "1 = 0" });
        return;
    }

    fmt!(f, col);
    if negated {
        fmt!(f, " NOT");
    }
    fmt!(f, " IN (");
    let mut first = true;
    for value in values {
        if !first {
            fmt!(f, ", ");
        }
        first = false;
        f.param(value);
    }
    fmt!(f, ")");
}

fn like(col: Qualified<'_>, pattern: String, f: &mut Formatter<'_>) {
    fmt!(f, col " LIKE ");
    f.param(&Value::String(pattern));
}

fn render_relation(
    spec: &TableSpec,
    attr: &str,
    op: RelationOp,
    filter: &Filter,
    f: &mut Formatter<'_>,
) {
    // Presence checked during validation.
    let relation = spec.relation(attr).unwrap();
    let target = f.lookup.spec(relation.target).unwrap();

    if matches!(op, RelationOp::IsNot | RelationOp::None | RelationOp::Every) {
        fmt!(f, "NOT ");
    }

    fmt!(f, "EXISTS (SELECT 1 FROM " Ident(target.table) " WHERE ");

    for &(own, remote) in relation.join {
        fmt!(f, Qualified(target.table, remote) " = " Qualified(spec.table, own) " AND ");
    }

    if matches!(op, RelationOp::Every) {
        fmt!(f, "NOT ");
    }

    fmt!(f, "(");
    render(target, filter, f);
    fmt!(f, "))");
}

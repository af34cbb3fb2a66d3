use super::Formatter;

use crumpet_core::stmt::Value;

/// Writes each fragment into the formatter, in order.
macro_rules! fmt {
    ( $f:expr, $( $fragments:expr )* ) => {{
        $(
            $fragments.to_sql($f);
        )*
    }};
}

pub(crate) trait ToSql {
    fn to_sql(&self, f: &mut Formatter<'_>);
}

impl ToSql for &str {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        f.dst.push_str(self);
    }
}

impl ToSql for u64 {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        use std::fmt::Write;
        write!(f.dst, "{self}").unwrap();
    }
}

impl ToSql for i64 {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        use std::fmt::Write;
        write!(f.dst, "{self}").unwrap();
    }
}

/// A double-quoted identifier.
pub(crate) struct Ident<'a>(pub &'a str);

impl ToSql for Ident<'_> {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        f.dst.push('"');
        f.dst.push_str(self.0);
        f.dst.push('"');
    }
}

/// A table-qualified column reference.
pub(crate) struct Qualified<'a>(pub &'a str, pub &'a str);

impl ToSql for Qualified<'_> {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        fmt!(f, Ident(self.0) "." Ident(self.1));
    }
}

/// Comma-delimited fragments.
pub(crate) struct Comma<I>(pub I);

impl<I, T> ToSql for Comma<I>
where
    I: Iterator<Item = T> + Clone,
    T: ToSql,
{
    fn to_sql(&self, f: &mut Formatter<'_>) {
        let mut first = true;
        for item in self.0.clone() {
            if !first {
                fmt!(f, ", ");
            }
            first = false;
            item.to_sql(f);
        }
    }
}

impl Formatter<'_> {
    /// Emits a `?` placeholder and records the value in stored form.
    pub(crate) fn param(&mut self, value: &Value) {
        self.dst.push('?');
        self.params.push(value.clone().into_stored());
    }
}

mod filter;
pub use filter::{Filter, RelationOp, ScalarOp};

mod insert_row;
pub use insert_row::InsertRow;

mod order_by;
pub use order_by::{Direction, OrderBy};

mod ty;
pub use ty::{EnumId, Type};

mod value;
pub use value::Value;

mod error;
mod page;
mod record;
mod schema;
mod value;

pub use error::{RecordError, RecordResult};
pub use page::{HeapPage, PageLayout};
pub use record::{RecordId, SlotId, Tuple};
pub use schema::{ColumnDef, TupleSchema};
pub use value::{DEFAULT_STRING_LEN, DataType, MAX_STRING_LEN, Value};

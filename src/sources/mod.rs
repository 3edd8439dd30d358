pub mod catalog;
pub mod descriptor;
pub mod dialect;
pub mod memory;
pub mod traits;
pub mod types;

pub use descriptor::{Dimension, FieldMap, SizeEncoding, SourceDescriptor, SourceKind};
pub use dialect::{AmenityBinding, Dialect, TagDialect, TagStyle};
pub use memory::MemorySource;
pub use traits::ListingSource;
pub use types::{OrderKind, Projection, RawRecord, SourceOrder, SourceQuery, Window};

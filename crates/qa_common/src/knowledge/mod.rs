//! Knowledge Store v0.4.0
//!
//! Per-namespace question/answer storage. Each namespace (chat group) owns
//! one SQLite file; questions are unique inside it and keywords are always
//! derived from the question at write time.
//!
//! v0.2.0: JSON files replaced by SQLite with a UNIQUE question column.
//! v0.3.0: Lazy namespace registry, malformed rows skipped on read.
//! v0.4.0: Import of legacy keyword-grouped JSON files.
//!
//! Schema version: 2

pub mod base;
pub mod legacy;
pub mod schema;
pub mod store;

pub use base::*;
pub use legacy::*;
pub use schema::*;
pub use store::*;

//! Toy records and the document store that holds them.

pub mod error;
pub mod query;
pub mod store;
pub mod surreal;
pub mod types;

pub use error::{Result, StoreError};
pub use query::{ListQuery, SortDirection, SortSpec};
pub use store::ToyStore;
pub use surreal::SurrealToyStore;
pub use types::{DeleteAck, InsertAck, TOYS_TABLE, Toy, ToyId, UpdateAck, strip_identity};

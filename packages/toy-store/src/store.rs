use async_trait::async_trait;

use crate::error::Result;
use crate::query::ListQuery;
use crate::types::{DeleteAck, InsertAck, Toy, ToyId, UpdateAck};

/// A document collection of toys.
///
/// Implementations own consistency for concurrent writes; callers share one
/// handle for the lifetime of the process.
#[async_trait]
pub trait ToyStore: Send + Sync {
    /// Check the backing database answers.
    async fn ping(&self) -> Result<()>;

    /// Every toy matching `query`, in the requested order.
    async fn find(&self, query: &ListQuery) -> Result<Vec<Toy>>;

    async fn find_one(&self, id: &ToyId) -> Result<Option<Toy>>;

    /// Insert a new toy; the store assigns its identifier.
    async fn insert_one(&self, toy: Toy) -> Result<InsertAck>;

    /// Merge `fields` into an existing toy. Never creates one.
    async fn update_one(&self, id: &ToyId, fields: Toy) -> Result<UpdateAck>;

    async fn delete_one(&self, id: &ToyId) -> Result<DeleteAck>;
}

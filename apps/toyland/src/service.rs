//! Toy record operations on top of an injected `ToyStore`.

use std::sync::Arc;
use toy_store::{
    DeleteAck, InsertAck, ListQuery, Result, SortDirection, SortSpec, Toy, ToyId, ToyStore,
    UpdateAck, strip_identity,
};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ToyService {
    store: Arc<dyn ToyStore>,
}

impl ToyService {
    pub fn new(store: Arc<dyn ToyStore>) -> Self {
        Self { store }
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// List toys, optionally filtered by owner email and sorted by
    /// a `<field>:<1|-1>` parameter.
    pub async fn list(&self, email: Option<&str>, sort: Option<&str>) -> Result<Vec<Toy>> {
        let query = ListQuery::from_params(email, sort)?;
        self.store.find(&query).await
    }

    /// `None` when no toy has this id.
    pub async fn get(&self, id: &str) -> Result<Option<Toy>> {
        let id = ToyId::parse(id)?;
        self.store.find_one(&id).await
    }

    pub async fn create(&self, toy: Toy) -> Result<InsertAck> {
        self.store.insert_one(strip_identity(toy)).await
    }

    /// Merge `fields` into the toy. Succeeds whether or not the toy exists.
    pub async fn replace_fields(&self, id: &str, fields: Toy) -> Result<UpdateAck> {
        let id = ToyId::parse(id)?;
        let ack = self.store.update_one(&id, strip_identity(fields)).await?;
        if ack.matched_count == 0 {
            debug!(%id, "Update matched no toy");
        }
        Ok(ack)
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteAck> {
        let id = ToyId::parse(id)?;
        self.store.delete_one(&id).await
    }

    /// Log the catalog ordered by price both ways. Failures are only logged.
    pub async fn log_catalog_snapshot(&self) {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let query = match SortSpec::new("price", direction) {
                Ok(sort) => ListQuery::all().sorted_by(sort),
                Err(e) => {
                    warn!(error = %e, "Cannot build catalog snapshot query");
                    return;
                }
            };

            match self.store.find(&query).await {
                Ok(toys) => {
                    let prices: Vec<_> = toys.iter().filter_map(|t| t.get("price")).collect();
                    debug!(
                        order = direction.as_surql(),
                        count = toys.len(),
                        prices = ?prices,
                        "Catalog by price"
                    );
                }
                Err(e) => warn!(order = direction.as_surql(), error = %e, "Failed to fetch catalog"),
            }
        }
    }
}

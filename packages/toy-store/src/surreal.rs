//! SurrealDB backed `ToyStore`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use surrealdb::types::RecordId;
use surrealdb::{Connection, Surreal};
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::query::ListQuery;
use crate::store::ToyStore;
use crate::types::{DeleteAck, EMAIL_FIELD, ID_FIELD, InsertAck, TOYS_TABLE, Toy, ToyId, UpdateAck};

/// Toy collection stored in the `toys` table.
///
/// Generic over the connection so the same code runs against a remote
/// server and the in-memory engine.
pub struct SurrealToyStore<C: Connection> {
    db: Arc<Surreal<C>>,
}

impl<C: Connection> Clone for SurrealToyStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealToyStore<C> {
    /// Wrap a connection that already has its namespace and database selected.
    pub fn new(db: Arc<Surreal<C>>) -> Self {
        Self { db }
    }

    /// Make sure the table exists and the database answers.
    pub async fn init(&self) -> Result<()> {
        self.db
            .query(format!("DEFINE TABLE IF NOT EXISTS {TOYS_TABLE} SCHEMALESS"))
            .await
            .and_then(|response| response.check())
            .map_err(|e| StoreError::Unavailable {
                message: format!("failed to define table {TOYS_TABLE}: {e}"),
            })?;

        self.ping().await.map_err(|e| StoreError::Unavailable {
            message: e.to_string(),
        })?;

        info!(table = TOYS_TABLE, "Toy store ready");
        Ok(())
    }
}

/// Build the SELECT for a listing. The sort field has been validated as a
/// plain field path by `SortSpec`.
fn select_statement(query: &ListQuery) -> String {
    let mut sql = format!("SELECT *, record::id(id) AS {ID_FIELD} FROM {TOYS_TABLE}");
    if query.email.is_some() {
        sql.push_str(&format!(" WHERE {EMAIL_FIELD} = $email"));
    }
    if let Some(sort) = &query.sort {
        sql.push_str(&format!(" ORDER BY {} {}", sort.field(), sort.direction().as_surql()));
    }
    sql
}

fn record_id(id: &ToyId) -> Result<RecordId> {
    RecordId::parse_simple(&id.qualified())
        .map_err(|e| StoreError::invalid_identifier(id.as_str(), e.to_string()))
}

fn into_toys(rows: Vec<Value>) -> Result<Vec<Toy>> {
    rows.into_iter()
        .map(|row| match row {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Backend {
                message: format!("expected a document, got {other}"),
            }),
        })
        .collect()
}

#[async_trait]
impl<C: Connection> ToyStore for SurrealToyStore<C> {
    async fn ping(&self) -> Result<()> {
        self.db.query("RETURN true").await?.check()?;
        Ok(())
    }

    #[instrument(
        skip(self, query),
        fields(filtered = query.email.is_some(), sort = ?query.sort)
    )]
    async fn find(&self, query: &ListQuery) -> Result<Vec<Toy>> {
        let sql = select_statement(query);
        debug!(%sql, "Listing toys");

        let mut request = self.db.query(sql);
        if let Some(email) = &query.email {
            request = request.bind(("email", email.clone()));
        }

        let rows: Vec<Value> = request.await?.take(0)?;
        into_toys(rows)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_one(&self, id: &ToyId) -> Result<Option<Toy>> {
        let rows: Vec<Value> = self
            .db
            .query(format!("SELECT *, record::id(id) AS {ID_FIELD} FROM $id"))
            .bind(("id", record_id(id)?))
            .await?
            .take(0)?;

        Ok(into_toys(rows)?.into_iter().next())
    }

    #[instrument(skip(self, toy), fields(field_count = toy.len()))]
    async fn insert_one(&self, toy: Toy) -> Result<InsertAck> {
        let rows: Vec<Value> = self
            .db
            .query(format!(
                "CREATE {TOYS_TABLE} CONTENT $data RETURN record::id(id) AS {ID_FIELD}"
            ))
            .bind(("data", Value::Object(toy)))
            .await?
            .take(0)?;

        let raw_id = rows
            .first()
            .and_then(|row| row.get(ID_FIELD))
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Backend {
                message: "insert returned no identifier".to_string(),
            })?;
        let inserted_id = ToyId::parse(raw_id)?;

        debug!(id = %inserted_id, "Inserted toy");
        Ok(InsertAck {
            acknowledged: true,
            inserted_id,
        })
    }

    #[instrument(skip(self, fields), fields(id = %id))]
    async fn update_one(&self, id: &ToyId, fields: Toy) -> Result<UpdateAck> {
        let rows: Vec<Value> = self
            .db
            .query(format!(
                "UPDATE $id MERGE $data RETURN record::id(id) AS {ID_FIELD}"
            ))
            .bind(("id", record_id(id)?))
            .bind(("data", Value::Object(fields)))
            .await?
            .take(0)?;

        debug!(matched = rows.len(), "Merged toy fields");
        Ok(UpdateAck {
            acknowledged: true,
            matched_count: rows.len() as u64,
        })
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_one(&self, id: &ToyId) -> Result<DeleteAck> {
        let rows: Vec<surrealdb::types::Value> = self
            .db
            .query("DELETE $id RETURN BEFORE")
            .bind(("id", record_id(id)?))
            .await?
            .take(0)?;

        debug!(deleted = rows.len(), "Deleted toy");
        Ok(DeleteAck {
            acknowledged: true,
            deleted_count: rows.len() as u64,
        })
    }
}

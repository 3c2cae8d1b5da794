use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Result, StoreError};

/// Table holding every toy record.
pub const TOYS_TABLE: &str = "toys";

/// Field a toy's owner is filtered on.
pub const EMAIL_FIELD: &str = "email";

/// Field carrying the record identifier in serialized toys.
pub const ID_FIELD: &str = "id";

const MAX_KEY_LEN: usize = 64;

/// A schema-less toy document.
pub type Toy = Map<String, Value>;

/// Identifier of a toy record, held in canonical (bare key) form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToyId(String);

impl ToyId {
    /// Parse `<key>` or `toys:<key>`.
    pub fn parse(raw: &str) -> Result<Self> {
        let key = match raw.split_once(':') {
            Some((table, key)) if table == TOYS_TABLE => key,
            Some((table, _)) => {
                return Err(StoreError::invalid_identifier(
                    raw,
                    format!("expected table '{TOYS_TABLE}', got '{table}'"),
                ));
            }
            None => raw,
        };

        if key.is_empty() {
            return Err(StoreError::invalid_identifier(raw, "empty key"));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(StoreError::invalid_identifier(
                raw,
                format!("key longer than {MAX_KEY_LEN} characters"),
            ));
        }
        if let Some(c) = key.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(StoreError::invalid_identifier(
                raw,
                format!("unexpected character '{c}'"),
            ));
        }

        Ok(ToyId(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified `toys:<key>` form.
    pub fn qualified(&self) -> String {
        format!("{}:{}", TOYS_TABLE, self.0)
    }
}

impl fmt::Display for ToyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drop identity keys from a client supplied document.
///
/// Identifiers are assigned by the store and never rewritten afterwards.
pub fn strip_identity(mut toy: Toy) -> Toy {
    toy.remove(ID_FIELD);
    toy.remove("_id");
    toy
}

/// Acknowledgment of an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: ToyId,
}

/// Acknowledgment of a partial update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
}

/// Acknowledgment of a delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_and_qualified_keys_to_the_same_id() {
        let bare = ToyId::parse("k3x9abc").unwrap();
        let qualified = ToyId::parse("toys:k3x9abc").unwrap();
        assert_eq!(bare, qualified);
        assert_eq!(bare.as_str(), "k3x9abc");
        assert_eq!(bare.qualified(), "toys:k3x9abc");
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "toys:", "users:abc", "has space", "semi;colon", "a:b:c", "ü"] {
            let err = ToyId::parse(raw).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidIdentifier { .. }),
                "{raw:?} gave {err:?}"
            );
        }
        assert!(ToyId::parse(&"a".repeat(65)).is_err());
        assert!(ToyId::parse(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn strips_identity_fields_only() {
        let toy = json!({"id": "evil", "_id": "x", "name": "Dragon", "price": 20});
        let Value::Object(map) = toy else { unreachable!() };
        let cleaned = strip_identity(map);
        assert_eq!(Value::Object(cleaned), json!({"name": "Dragon", "price": 20}));
    }

    #[test]
    fn acks_serialize_in_camel_case() {
        let ack = InsertAck {
            acknowledged: true,
            inserted_id: ToyId::parse("abc").unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"acknowledged": true, "insertedId": "abc"})
        );

        let ack = DeleteAck {
            acknowledged: true,
            deleted_count: 1,
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"acknowledged": true, "deletedCount": 1})
        );
    }
}

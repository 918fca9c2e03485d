//! # In-Memory Transport
//!
//! A table store that answers the same request descriptions as the REST backend.
//! Each endpoint is a `Vec` of JSON rows; filters, ordering and windowing are
//! evaluated the way the backend evaluates them, and writes never remove rows,
//! so a soft-deleted row stays in the table with its `deleted_at` stamped.
//!
//! Used by the offline demo and by end-to-end tests of the controller.

use crate::error::TransportError;
use crate::query::{CountRequest, DataRequest, OrderClause, OrderDirection, Predicate, WriteMethod, WriteRequest};
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Default)]
struct Table {
    rows: Vec<Value>,
    next_id: u64,
}

/// Table-backed implementation of [`Transport`].
#[derive(Default)]
pub struct InMemoryTransport {
    tables: Mutex<HashMap<String, Table>>,
    write_failure: Mutex<Option<TransportError>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `rows` to the `endpoint` table.
    ///
    /// Rows without an `id` get the next sequential one.
    pub async fn seed(&self, endpoint: &str, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(endpoint.to_string()).or_default();
        for row in rows {
            let row = table.prepare_insert(row);
            table.rows.push(row);
        }
        info!(endpoint, size = table.rows.len(), "Seeded");
    }

    /// Every row of `endpoint`, soft-deleted ones included.
    pub async fn snapshot(&self, endpoint: &str) -> Vec<Value> {
        self.tables
            .lock()
            .await
            .get(endpoint)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Makes the next write fail with `error` without touching any table.
    pub async fn fail_next_write(&self, error: TransportError) {
        *self.write_failure.lock().await = Some(error);
    }
}

impl Table {
    fn prepare_insert(&mut self, row: Value) -> Value {
        let mut fields = match row {
            Value::Object(fields) => fields,
            other => {
                let mut fields = Map::new();
                fields.insert("value".to_string(), other);
                fields
            }
        };
        match fields.get("id").and_then(Value::as_u64) {
            Some(id) => self.next_id = self.next_id.max(id),
            None => {
                self.next_id += 1;
                fields.insert("id".to_string(), Value::from(self.next_id));
            }
        }
        let now = Value::String(Utc::now().to_rfc3339());
        fields.entry("created_at").or_insert_with(|| now.clone());
        fields.entry("updated_at").or_insert(now);
        fields.entry("deleted_at").or_insert(Value::Null);
        Value::Object(fields)
    }

    fn matching<'a>(&'a self, filters: &'a [Predicate]) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .filter(move |row| filters.iter().all(|p| row_matches(p, row)))
    }
}

/// Evaluates `predicate` against one JSON row.
pub fn row_matches(predicate: &Predicate, row: &Value) -> bool {
    match predicate {
        Predicate::IsNull { field } => row.get(field).map_or(true, Value::is_null),
        Predicate::Eq { field, value } => row
            .get(field)
            .and_then(scalar_text)
            .is_some_and(|text| &text == value),
        Predicate::ILike { field, needle } => row
            .get(field)
            .and_then(scalar_text)
            .is_some_and(|text| ilike(&text, needle)),
        Predicate::AnyOf(items) => items.iter().any(|p| row_matches(p, row)),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Case-insensitive literal substring match.
fn ilike(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn compare(a: &Value, b: &Value, order: &OrderClause) -> Ordering {
    let left = a.get(&order.field).unwrap_or(&Value::Null);
    let right = b.get(&order.field).unwrap_or(&Value::Null);
    // Nulls sort last in both directions.
    let ordering = match (left, right) {
        (Value::Null, Value::Null) => return Ordering::Equal,
        (Value::Null, _) => return Ordering::Greater,
        (_, Value::Null) => return Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (x, y) => x.to_string().cmp(&y.to_string()),
    };
    match order.direction {
        OrderDirection::Asc => ordering,
        OrderDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn fetch_rows(&self, request: &DataRequest) -> Result<Vec<Value>, TransportError> {
        let tables = self.tables.lock().await;
        let Some(table) = tables.get(&request.endpoint) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<Value> = table.matching(&request.filters).cloned().collect();
        rows.sort_by(|a, b| compare(a, b, &request.order));
        let offset = usize::try_from(request.offset).unwrap_or(usize::MAX);
        let window: Vec<Value> = rows
            .into_iter()
            .skip(offset)
            .take(request.limit as usize)
            .collect();
        debug!(endpoint = %request.endpoint, offset, returned = window.len(), "Rows");
        Ok(window)
    }

    async fn fetch_count(&self, request: &CountRequest) -> Result<u64, TransportError> {
        let tables = self.tables.lock().await;
        let total = tables
            .get(&request.endpoint)
            .map_or(0, |t| t.matching(&request.filters).count() as u64);
        debug!(endpoint = %request.endpoint, total, "Count");
        Ok(total)
    }

    async fn write(&self, request: &WriteRequest) -> Result<Vec<Value>, TransportError> {
        if let Some(error) = self.write_failure.lock().await.take() {
            return Err(error);
        }
        let mut tables = self.tables.lock().await;
        let table = tables.entry(request.endpoint.clone()).or_default();
        match request.method {
            WriteMethod::Insert => {
                let rows = match &request.body {
                    Value::Array(rows) => rows.clone(),
                    row => vec![row.clone()],
                };
                let inserted: Vec<Value> = rows
                    .into_iter()
                    .map(|row| table.prepare_insert(row))
                    .collect();
                table.rows.extend(inserted.iter().cloned());
                info!(endpoint = %request.endpoint, inserted = inserted.len(), size = table.rows.len(), "Inserted");
                Ok(inserted)
            }
            WriteMethod::Patch => {
                let Value::Object(changes) = &request.body else {
                    return Err(TransportError::Status {
                        status: 400,
                        message: "patch body must be an object".to_string(),
                    });
                };
                let now = Value::String(Utc::now().to_rfc3339());
                let mut updated = Vec::new();
                for row in table.rows.iter_mut() {
                    if !request.filters.iter().all(|p| row_matches(p, &*row)) {
                        continue;
                    }
                    if let Value::Object(fields) = row {
                        for (key, value) in changes {
                            fields.insert(key.clone(), value.clone());
                        }
                        fields.insert("updated_at".to_string(), now.clone());
                    }
                    updated.push(row.clone());
                }
                info!(endpoint = %request.endpoint, updated = updated.len(), "Patched");
                Ok(updated)
            }
        }
    }
}

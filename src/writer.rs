use anyhow::{Result, bail};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::model::CollectionSummary;
use crate::sanitize::sanitize;
use crate::store::{DocumentStore, PendingWrite};
use crate::util::is_blank;

/// A batch is committed as soon as it holds this many writes.
pub const MAX_BATCH_WRITES: usize = 450;

/// 2^53; floats at or above this are rendered with their full float text.
const MAX_EXACT_FLOAT_INTEGER: f64 = 9_007_199_254_740_992.0;

struct Batch {
    writes: Vec<PendingWrite>,
}

impl Batch {
    fn new() -> Self {
        Self {
            writes: Vec::with_capacity(MAX_BATCH_WRITES),
        }
    }

    fn is_full(&self) -> bool {
        self.writes.len() >= MAX_BATCH_WRITES
    }

    /// Returns `false` without touching the store when nothing is staged.
    fn commit<S: DocumentStore + ?Sized>(&mut self, store: &mut S, collection: &str) -> Result<bool> {
        if self.writes.is_empty() {
            return Ok(false);
        }
        store.commit(collection, &self.writes)?;
        debug!(collection = %collection, writes = self.writes.len(), "committed batch");
        self.writes.clear();
        Ok(true)
    }
}

/// Writes an array-of-objects or object-of-objects payload into `collection`.
pub fn write_collection<S: DocumentStore + ?Sized>(
    store: &mut S,
    collection: &str,
    source: &str,
    payload: &Value,
) -> Result<CollectionSummary> {
    let mut summary = CollectionSummary {
        name: collection.to_string(),
        source: source.to_string(),
        ..CollectionSummary::default()
    };
    let mut batch = Batch::new();

    match payload {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if !item.is_object() {
                    summary.skipped += 1;
                    continue;
                }
                let Some(id) = array_record_id(item, index) else {
                    debug!(collection = %collection, index, "skipping record with blank id");
                    summary.skipped += 1;
                    continue;
                };
                stage_record(store, collection, &mut batch, &mut summary, id, item)?;
            }
        }
        Value::Object(entries) => {
            for (key, value) in entries {
                if is_blank(key) || !value.is_object() {
                    summary.skipped += 1;
                    continue;
                }
                stage_record(store, collection, &mut batch, &mut summary, key.clone(), value)?;
            }
        }
        _ => bail!("unsupported JSON format in {collection}"),
    }

    if batch.commit(store, collection)? {
        summary.batches += 1;
    }

    Ok(summary)
}

fn stage_record<S: DocumentStore + ?Sized>(
    store: &mut S,
    collection: &str,
    batch: &mut Batch,
    summary: &mut CollectionSummary,
    document_id: String,
    record: &Value,
) -> Result<()> {
    let Some(fields) = record_fields(record) else {
        debug!(collection = %collection, document_id = %document_id, "skipping empty record");
        summary.skipped += 1;
        return Ok(());
    };

    batch.writes.push(PendingWrite {
        document_id,
        fields,
    });
    summary.written += 1;

    if batch.is_full() && batch.commit(store, collection)? {
        summary.batches += 1;
    }

    Ok(())
}

/// Sanitizes a record; only a non-empty top-level object is worth writing.
fn record_fields(record: &Value) -> Option<Map<String, Value>> {
    match sanitize(record)? {
        Value::Object(fields) if !fields.is_empty() => Some(fields),
        _ => None,
    }
}

/// Uses the record's own `id` when present, else its position.
///
/// An empty id falls back to the position; a whitespace-only id is a blank
/// key and yields `None`, so the record is dropped.
pub fn array_record_id(item: &Value, index: usize) -> Option<String> {
    let explicit = match item.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(number_id(id)),
        Some(Value::Bool(id)) => Some(id.to_string()),
        _ => None,
    };

    match explicit {
        Some(id) if id.is_empty() => Some(index.to_string()),
        Some(id) if is_blank(&id) => None,
        Some(id) => Some(id),
        None => Some(index.to_string()),
    }
}

/// Integral floats render without a fraction (`1.0` → `"1"`).
fn number_id(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }

    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() < MAX_EXACT_FLOAT_INTEGER => {
            format!("{}", value as i64)
        }
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}

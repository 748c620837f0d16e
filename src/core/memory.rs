//! In-memory backend
//!
//! Keeps records as JSON documents and applies the same acceptance rules as
//! the REST service (unique names, references to existing vendors and
//! filaments, non-empty purchases). Import dry runs submit here, and the
//! tests use it in place of a live service.

use chrono::Utc;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::core::api::{ApiError, Backend, Resource};
use crate::core::inventory::{summarize, InventoryRow};
use crate::entities::{Filament, Purchase, PurchaseItem, Spool, Vendor};

#[derive(Debug, Default)]
struct State {
    tables: HashMap<&'static str, Vec<Value>>,
    next_id: i64,
    requests: Vec<String>,
}

impl State {
    fn rows(&self, path: &str) -> &[Value] {
        self.tables.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    fn has_name(&self, path: &str, key: &str, name: &str) -> bool {
        self.rows(path).iter().any(|row| str_field(row, key) == name)
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn bump_id(&mut self, id: i64) {
        self.next_id = self.next_id.max(id);
    }

    /// Attach a purchase's items the way the service embeds them
    fn with_items(&self, mut purchase: Value) -> Value {
        let id = purchase.get("id").and_then(Value::as_i64);
        let items: Vec<Value> = self
            .rows(PurchaseItem::PATH)
            .iter()
            .filter(|item| item.get("purchase_id").and_then(Value::as_i64) == id)
            .cloned()
            .collect();
        if let Some(obj) = purchase.as_object_mut() {
            obj.insert("items".to_string(), Value::Array(items));
        }
        purchase
    }

    fn present(&self, path: &str, row: Value) -> Value {
        if path == Purchase::PATH {
            self.with_items(row)
        } else {
            row
        }
    }
}

fn str_field<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("")
}

fn id_of(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn as_object(value: Value) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::bad_request(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

fn now() -> Value {
    Value::String(Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
}

/// A self-contained stand-in for the inventory service
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RefCell<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert already-stored records (ids included) without any checks
    pub fn seed<R: Resource>(&self, records: &[R]) -> Result<(), ApiError> {
        let mut state = self.state.borrow_mut();
        for record in records {
            let mut row = as_object(serde_json::to_value(record)?)?;
            if R::PATH == Purchase::PATH {
                if let Some(Value::Array(items)) = row.remove("items") {
                    for item in items {
                        if let Some(id) = id_of(&item) {
                            state.bump_id(id);
                        }
                        state
                            .tables
                            .entry(PurchaseItem::PATH)
                            .or_default()
                            .push(item);
                    }
                }
            }
            state.bump_id(record.id());
            state.tables.entry(R::PATH).or_default().push(Value::Object(row));
        }
        Ok(())
    }

    /// Every request seen so far, as "METHOD /path/"
    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().requests.clone()
    }

    /// Number of create calls issued against a collection
    pub fn create_calls(&self, path: &str) -> usize {
        let needle = format!("POST /{}/", path);
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|r| **r == needle)
            .count()
    }

    fn check_create(state: &State, path: &str, body: &Map<String, Value>) -> Result<(), ApiError> {
        let field = |key: &str| body.get(key).and_then(Value::as_str).unwrap_or("");

        if path == Vendor::PATH {
            if state.has_name(Vendor::PATH, "name", field("name")) {
                return Err(ApiError::bad_request("Vendor already exists"));
            }
        } else if path == Filament::PATH {
            if state.has_name(Filament::PATH, "name", field("name")) {
                return Err(ApiError::bad_request("Filament already exists"));
            }
            let manufacturer = field("manufacturer");
            if !state.has_name(Vendor::PATH, "name", manufacturer) {
                return Err(ApiError::bad_request(format!(
                    "Manufacturer '{}' not found. Please create the vendor first.",
                    manufacturer
                )));
            }
        } else if path == Purchase::PATH {
            let items = body
                .get("items")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if items.is_empty() {
                return Err(ApiError::bad_request("Purchase must contain at least one item"));
            }
            for item in items {
                let name = str_field(item, "filament_name");
                if !state.has_name(Filament::PATH, "name", name) {
                    return Err(ApiError::bad_request(format!("Filament '{}' not found", name)));
                }
            }
        } else if path == Spool::PATH {
            let name = field("filament_name");
            if !state.has_name(Filament::PATH, "name", name) {
                return Err(ApiError::bad_request(format!("Filament '{}' not found", name)));
            }
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn list<R: Resource>(&self) -> Result<Vec<R>, ApiError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(format!("GET /{}/", R::PATH));
        let rows: Vec<Value> = state
            .rows(R::PATH)
            .iter()
            .cloned()
            .map(|row| state.present(R::PATH, row))
            .collect();
        Ok(serde_json::from_value(Value::Array(rows))?)
    }

    fn create<R: Resource>(&self, body: &R::Create) -> Result<R, ApiError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(format!("POST /{}/", R::PATH));

        let mut row = as_object(serde_json::to_value(body)?)?;
        Self::check_create(&state, R::PATH, &row)?;

        let id = state.allocate_id();
        row.insert("id".to_string(), Value::from(id));
        row.insert("created_at".to_string(), now());

        if R::PATH == Purchase::PATH {
            if let Some(Value::Array(items)) = row.remove("items") {
                for item in items {
                    let mut item = as_object(item)?;
                    let item_id = state.allocate_id();
                    item.insert("id".to_string(), Value::from(item_id));
                    item.insert("purchase_id".to_string(), Value::from(id));
                    item.insert("created_at".to_string(), now());
                    state
                        .tables
                        .entry(PurchaseItem::PATH)
                        .or_default()
                        .push(Value::Object(item));
                }
            }
        }

        let row = Value::Object(row);
        state.tables.entry(R::PATH).or_default().push(row.clone());
        Ok(serde_json::from_value(state.present(R::PATH, row))?)
    }

    fn update<R: Resource>(&self, id: i64, body: &R::Update) -> Result<R, ApiError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(format!("PUT /{}/{}", R::PATH, id));

        let patch = as_object(serde_json::to_value(body)?)?;
        let table = state.tables.entry(R::PATH).or_default();
        let row = table
            .iter_mut()
            .find(|row| id_of(row) == Some(id))
            .ok_or_else(|| ApiError::not_found(R::LABEL))?;
        if let Some(obj) = row.as_object_mut() {
            obj.extend(patch);
        }
        let row = row.clone();
        Ok(serde_json::from_value(state.present(R::PATH, row))?)
    }

    fn delete<R: Resource>(&self, id: i64) -> Result<(), ApiError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(format!("DELETE /{}/{}", R::PATH, id));

        let table = state.tables.entry(R::PATH).or_default();
        let before = table.len();
        table.retain(|row| id_of(row) != Some(id));
        if table.len() == before {
            return Err(ApiError::not_found(R::LABEL));
        }
        if R::PATH == Purchase::PATH {
            if let Some(items) = state.tables.get_mut(PurchaseItem::PATH) {
                items.retain(|item| item.get("purchase_id").and_then(Value::as_i64) != Some(id));
            }
        }
        Ok(())
    }

    fn spools_for_filament(&self, filament_name: &str) -> Result<Vec<Spool>, ApiError> {
        let mut state = self.state.borrow_mut();
        state
            .requests
            .push(format!("GET /{}/by-filament/{}", Spool::PATH, filament_name));
        let rows: Vec<Value> = state
            .rows(Spool::PATH)
            .iter()
            .filter(|row| str_field(row, "filament_name") == filament_name)
            .cloned()
            .collect();
        Ok(serde_json::from_value(Value::Array(rows))?)
    }

    fn inventory_summary(&self) -> Result<Vec<InventoryRow>, ApiError> {
        let filaments = self.list::<Filament>()?;
        let items = self.list::<PurchaseItem>()?;
        let spools = self.list::<Spool>()?;
        Ok(summarize(&filaments, &items, &spools))
    }
}

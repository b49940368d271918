//! Inventory records and the pure list operations behind the view
//!
//! Responses from the inventory service arrive as JSON arrays that may be
//! nested (the hub answers with one array per unit). Everything here works on
//! the flattened list: decoding, defensive quantity parsing, locale-aware
//! sorting, filtering by group and the distinct group values.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::{InventoryError, Result};

/// Reserved id of the "new item" placeholder used to stage a shipment
pub const NEW_ITEM_ID: &str = "new_item_placeholder_id";

/// Opaque record identifier, only used as a display key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON field a variant groups its records by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Branch,
    Unit,
}

impl GroupField {
    pub fn field_name(&self) -> &'static str {
        match self {
            GroupField::Branch => "branch",
            GroupField::Unit => "unit",
        }
    }
}

/// One stock line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    pub item_type: String,
    pub quantity: u32,
}

impl InventoryRecord {
    pub fn new(
        id: impl Into<String>,
        group_key: Option<&str>,
        item_type: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            id: RecordId::new(id),
            group_key: group_key.map(str::to_string),
            item_type: item_type.into(),
            quantity,
        }
    }

    /// Decode one flattened leaf of an inventory response.
    ///
    /// `position` is the leaf's index in the flattened response and becomes
    /// the id when the record carries none.
    pub fn from_value(value: &Value, position: usize, group: Option<GroupField>) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            InventoryError::Record(format!("expected an object at position {}, got {}", position, value))
        })?;

        let id = match object.get("id") {
            None | Some(Value::Null) => position.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        let item_type = match object.get("item_type") {
            Some(Value::String(s)) => s.clone(),
            _ => {
                return Err(InventoryError::Record(format!(
                    "record at position {} has no item_type",
                    position
                )))
            }
        };

        let group_key = group.and_then(|field| match object.get(field.field_name()) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        });

        let quantity = object.get("quantity").map(parse_quantity).unwrap_or(0);

        Ok(Self {
            id: RecordId(id),
            group_key,
            item_type,
            quantity,
        })
    }

    /// Wire representation sent to the inventory service, using the variant's group field name
    pub fn to_wire(&self, group: Option<GroupField>) -> Value {
        let mut object = Map::new();
        object.insert("id".to_string(), Value::String(self.id.0.clone()));
        if let (Some(field), Some(key)) = (group, &self.group_key) {
            object.insert(field.field_name().to_string(), Value::String(key.clone()));
        }
        object.insert("item_type".to_string(), Value::String(self.item_type.clone()));
        object.insert("quantity".to_string(), Value::from(self.quantity));
        Value::Object(object)
    }
}

/// Parse a quantity defensively: anything non-numeric becomes zero
pub fn parse_quantity(value: &Value) -> u32 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                u32::try_from(v).unwrap_or(u32::MAX)
            } else if n.as_i64().is_some() {
                // Only negative integers fail as_u64
                0
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f >= 1.0 => {
                        if f >= u32::MAX as f64 {
                            u32::MAX
                        } else {
                            f.trunc() as u32
                        }
                    }
                    _ => 0,
                }
            }
        }
        Value::String(s) => parse_quantity_str(s),
        _ => 0,
    }
}

/// Leading-integer parse of user or wire input: `"12 boxes"` is 12, `"abc"` is 0
pub fn parse_quantity_str(input: &str) -> u32 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];

    if digits.is_empty() || negative {
        return 0;
    }

    digits
        .bytes()
        .fold(0u32, |acc, b| acc.saturating_mul(10).saturating_add(u32::from(b - b'0')))
}

/// Flatten arbitrarily nested JSON arrays into their leaves, depth first
pub fn flatten(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => {
            let mut leaves = Vec::with_capacity(items.len());
            flatten_into(items, &mut leaves);
            Ok(leaves)
        }
        other => Err(InventoryError::Record(format!(
            "expected a JSON array of records, got {}",
            type_name(&other)
        ))),
    }
}

fn flatten_into(items: Vec<Value>, leaves: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(nested) => flatten_into(nested, leaves),
            leaf => leaves.push(leaf),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse an `/inventory` response body into a flat list of records
pub fn decode_records(body: &str, group: Option<GroupField>) -> Result<Vec<InventoryRecord>> {
    let value: Value = serde_json::from_str(body)?;
    flatten(value)?
        .iter()
        .enumerate()
        .map(|(position, leaf)| InventoryRecord::from_value(leaf, position, group))
        .collect()
}

/// Key the displayed list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Keep response order
    None,
    GroupKey,
    ItemType,
    GroupThenItem,
}

/// Base letters only: canonical decomposition with the combining marks dropped, lowercased
fn collation_key(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Locale-aware comparison in three levels: base letters, then accents,
/// then case with lowercase first. `"Éclair"` sorts before `"Fig"`.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

fn group_cmp(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => locale_cmp(a, b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort in place
pub fn sort_records(records: &mut [InventoryRecord], key: SortKey) {
    match key {
        SortKey::None => {}
        SortKey::GroupKey => records.sort_by(|a, b| group_cmp(&a.group_key, &b.group_key)),
        SortKey::ItemType => records.sort_by(|a, b| locale_cmp(&a.item_type, &b.item_type)),
        SortKey::GroupThenItem => records.sort_by(|a, b| {
            group_cmp(&a.group_key, &b.group_key)
                .then_with(|| locale_cmp(&a.item_type, &b.item_type))
        }),
    }
}

/// Records matching the filter; `None` shows everything
pub fn filter_records<'a>(
    records: &'a [InventoryRecord],
    filter: Option<&str>,
) -> Vec<&'a InventoryRecord> {
    match filter {
        None => records.iter().collect(),
        Some(wanted) => records
            .iter()
            .filter(|r| r.group_key.as_deref() == Some(wanted))
            .collect(),
    }
}

/// Distinct group values in first-appearance order
pub fn group_values(records: &[InventoryRecord]) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for key in records.iter().filter_map(|r| r.group_key.as_ref()) {
        if !values.contains(key) {
            values.push(key.clone());
        }
    }
    values
}

/// A record staged for an order or shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedItem {
    record: InventoryRecord,
}

impl SelectedItem {
    /// Stage a copy of an existing record
    pub fn existing(record: InventoryRecord) -> Self {
        Self { record }
    }

    /// Stage the "new item" placeholder
    pub fn new_item() -> Self {
        Self {
            record: InventoryRecord::new(NEW_ITEM_ID, None, "", 0),
        }
    }

    pub fn is_new(&self) -> bool {
        self.record.id.as_str() == NEW_ITEM_ID
    }

    pub fn record(&self) -> &InventoryRecord {
        &self.record
    }

    /// Item type can only be edited on the placeholder
    pub fn set_item_type(&mut self, item_type: impl Into<String>) -> Result<()> {
        if !self.is_new() {
            return Err(InventoryError::InvalidSelection(format!(
                "item type of existing record {} cannot be changed",
                self.record.id
            )));
        }
        self.record.item_type = item_type.into();
        Ok(())
    }

    /// Set the quantity from raw user input
    pub fn set_quantity(&mut self, input: &str) {
        self.record.quantity = parse_quantity_str(input);
    }

    pub fn to_wire(&self, group: Option<GroupField>) -> Value {
        self.record.to_wire(group)
    }
}

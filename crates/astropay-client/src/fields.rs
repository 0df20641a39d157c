//! Loosely-typed field assignment for request objects.
//!
//! Integrations often carry order data around as JSON. [`apply_fields`] maps
//! such a bag onto the closed set of fields a request type declares. Keys are
//! normalized to snake case first, so `invoiceNum`, `InvoiceNum` and
//! `invoice-num` all land on `invoice_num`. Keys that match nothing are
//! never fatal: they are logged and handed back in an [`Unrecognized`] map.

use std::collections::BTreeMap;

use heck::ToSnakeCase;
use serde_json::Value;

/// Input keys that could not be assigned, with their original values.
pub type Unrecognized = BTreeMap<String, Value>;

/// A request type with a closed set of assignable fields.
pub trait FieldTarget {
    /// Snake-case names accepted by [`FieldTarget::assign`].
    const FIELDS: &'static [&'static str];

    /// Set `field` from `value`. Returns `false` when the field is unknown or
    /// the value has a shape the field cannot hold.
    fn assign(&mut self, field: &str, value: &Value) -> bool;
}

/// The error/message pair every request type carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl Annotations {
    pub const FIELDS: &'static [&'static str] = &["error", "message"];

    pub(crate) fn assign(&mut self, field: &str, value: &Value) -> bool {
        match field {
            "error" => set_text(&mut self.error, value),
            "message" => set_text(&mut self.message, value),
            _ => false,
        }
    }
}

/// Assign every entry of `input` onto `target`.
///
/// Returns the entries that were not assigned, keyed by the caller's
/// original spelling.
pub fn apply_fields<T, I>(target: &mut T, input: I) -> Unrecognized
where
    T: FieldTarget,
    I: IntoIterator<Item = (String, Value)>,
{
    let mut unrecognized = Unrecognized::new();
    for (key, value) in input {
        let field = key.to_snake_case();
        let assigned = T::FIELDS.contains(&field.as_str()) && target.assign(&field, &value);
        if !assigned {
            tracing::debug!(field = %field, "unable to assign field, no such attribute");
            unrecognized.insert(key, value);
        }
    }
    unrecognized
}

/// Text form of a scalar JSON value, as it goes on the wire.
///
/// Numbers keep their JSON text (`10.5` stays `"10.5"`). Arrays and objects
/// have no scalar form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Store a scalar into an optional text slot. `null` clears the slot.
pub(crate) fn set_text(slot: &mut Option<String>, value: &Value) -> bool {
    if value.is_null() {
        *slot = None;
        return true;
    }
    match scalar_text(value) {
        Some(text) => {
            *slot = Some(text);
            true
        }
        None => false,
    }
}

/// The value of an optional field, or `None` if it is unset or empty.
pub(crate) fn present(slot: &Option<String>) -> Option<&str> {
    slot.as_deref().filter(|s| !s.is_empty())
}

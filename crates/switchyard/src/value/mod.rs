//! The value capability.
//!
//! Every configurable slot implements [`Value`]: it can be set from text,
//! rendered back to text and reports a stable type tag. Optional
//! capabilities (no-argument defaults, fixed choices, config-file paths,
//! structured encodings) are default methods that concrete types override.
//!
//! # Sharing and identity
//!
//! Options never own their value outright. A [`Shared`] cell is created by
//! the program, a typed clone stays with the program so it can read the
//! resolved value, and an erased [`ValueRef`] is handed to one or more
//! options. Every `Shared` carries a [`ValueId`] assigned at construction;
//! options that hold the same id are aliases of one slot and are resolved
//! as a unit.
//!
//! ```rust
//! use switchyard::{Shared, StringValue, Value};
//!
//! let name = Shared::new(StringValue::default());
//! let handle = name.handle();
//! handle.borrow_mut().set("billie").unwrap();
//!
//! assert_eq!(name.borrow().get(), "billie");
//! assert_eq!(name.id(), handle.id());
//! ```

mod list;
mod scalar;
mod structured;

pub use list::{EnumArray, StringArray};
pub use scalar::{BoolValue, Discard, Enum, Int64Value, StringValue, YamlConfigPath};
pub use structured::Struct;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ParseError;

/// A configurable slot.
pub trait Value: fmt::Display + fmt::Debug {
    /// Parses `raw` into the slot.
    fn set(&mut self, raw: &str) -> Result<(), ParseError>;

    /// Stable type tag used by help and completion.
    fn type_name(&self) -> String;

    /// Value assigned when the flag is present without an argument.
    ///
    /// Flags reporting one never consume the following token.
    fn no_opt_default(&self) -> Option<&str> {
        None
    }

    /// Fixed candidate list for completion.
    fn choices(&self) -> Option<&[String]> {
        None
    }

    /// Path of a config document this value points at, if any.
    fn config_path(&self) -> Option<&str> {
        None
    }

    /// True for list values that accumulate across `set` calls.
    fn is_slice(&self) -> bool {
        false
    }

    /// Clears accumulated state. Only list values need this.
    fn reset(&mut self) {}

    /// Encodes the value as a YAML node.
    fn to_yaml(&self) -> Result<serde_yaml::Value, ParseError> {
        Ok(serde_yaml::Value::String(self.to_string()))
    }

    /// Decodes the value from a YAML node. Scalars go through [`Value::set`].
    fn set_yaml(&mut self, node: &serde_yaml::Value) -> Result<(), ParseError> {
        match yaml_scalar(node) {
            Some(raw) => self.set(&raw),
            None => Err(ParseError::new(format!(
                "expected a scalar, got {}",
                yaml_kind(node)
            ))),
        }
    }

    /// Encodes the value as JSON.
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.to_string())
    }

    /// Decodes the value from JSON. `null` leaves the value untouched.
    fn set_json(&mut self, json: &serde_json::Value) -> Result<(), ParseError> {
        match json {
            serde_json::Value::Null => Ok(()),
            serde_json::Value::String(s) => self.set(s),
            serde_json::Value::Bool(b) => self.set(&b.to_string()),
            serde_json::Value::Number(n) => self.set(&n.to_string()),
            other => Err(ParseError::new(format!(
                "cannot decode {other} into {}",
                self.type_name()
            ))),
        }
    }
}

/// Renders a YAML scalar as text. Returns `None` for sequences and mappings.
pub(crate) fn yaml_scalar(node: &serde_yaml::Value) -> Option<String> {
    match node {
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Tagged(tagged) => yaml_scalar(&tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
    }
}

pub(crate) fn yaml_kind(node: &serde_yaml::Value) -> &'static str {
    match node {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

/// Identity of a shared value slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u64);

impl ValueId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ValueId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A value slot shared between the program and its options.
///
/// Cloning a `Shared` clones the handle, never the value.
pub struct Shared<T: ?Sized> {
    id: ValueId,
    cell: Rc<RefCell<T>>,
}

/// A type-erased shared value, as stored on options and flags.
pub type ValueRef = Shared<dyn Value>;

impl<T: Value + 'static> Shared<T> {
    /// Allocates a new slot with a fresh identity.
    pub fn new(value: T) -> Self {
        Self {
            id: ValueId::next(),
            cell: Rc::new(RefCell::new(value)),
        }
    }

    /// Returns the erased handle for this slot.
    pub fn handle(&self) -> ValueRef {
        let cell: Rc<RefCell<dyn Value>> = self.cell.clone();
        Shared { id: self.id, cell }
    }
}

impl<T: ?Sized> Shared<T> {
    pub fn id(&self) -> ValueId {
        self.id
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.cell.borrow_mut()
    }

    /// Returns true if both handles point at the same slot.
    pub fn same_slot<U: ?Sized>(&self, other: &Shared<U>) -> bool {
        self.id == other.id
    }
}

impl ValueRef {
    /// Creates an erased slot holding [`Discard`].
    pub fn discard() -> Self {
        Shared::new(Discard).handle()
    }

    /// Parses `raw` into the slot.
    pub fn set(&self, raw: &str) -> Result<(), ParseError> {
        self.cell.borrow_mut().set(raw)
    }

    pub fn type_name(&self) -> String {
        self.cell.borrow().type_name()
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("id", &self.id)
            .field("value", &&*self.cell.borrow())
            .finish()
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.cell.borrow(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_share_identity_and_state() {
        let slot = Shared::new(StringValue::default());
        let a = slot.handle();
        let b = slot.handle();
        a.set("x").unwrap();
        assert_eq!(b.to_string(), "x");
        assert!(a.same_slot(&b));
        assert!(slot.same_slot(&a));
    }

    #[test]
    fn test_distinct_slots_have_distinct_ids() {
        let a = Shared::new(StringValue::default());
        let b = Shared::new(StringValue::default());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_default_set_yaml_rejects_mappings() {
        let mut v = StringValue::default();
        let node: serde_yaml::Value = serde_yaml::from_str("a: b").unwrap();
        let err = v.set_yaml(&node).unwrap_err();
        assert_eq!(err.to_string(), "expected a scalar, got mapping");
    }

    #[test]
    fn test_default_set_yaml_accepts_numbers() {
        let mut v = StringValue::default();
        v.set_yaml(&serde_yaml::Value::from(42)).unwrap();
        assert_eq!(v.get(), "42");
    }

    #[test]
    fn test_default_set_json_null_is_noop() {
        let mut v = StringValue::new("keep");
        v.set_json(&serde_json::Value::Null).unwrap();
        assert_eq!(v.get(), "keep");
    }
}

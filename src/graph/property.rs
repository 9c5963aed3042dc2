//! Property values and the per-element property container
//!
//! Every element owns a [`Properties`] container. The id and revision id are
//! stored inside it under reserved key names and can be read like any other
//! property, but never written by callers.

use super::types::{ElementId, RevisionId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Property value type supporting multiple data types
///
/// Supports:
/// - String
/// - Integer (i64)
/// - Float (f64)
/// - Boolean
/// - DateTime (as i64 timestamp)
/// - Array (Vec<PropertyValue>)
/// - Map (BTreeMap<String, PropertyValue>)
///
/// Floats compare and hash by bit pattern so values can key dedup and
/// group-count sets. Ordering is defined within a kind only; `Null` sorts
/// below everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(i64), // Unix timestamp in milliseconds
    Array(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    Null,
}

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get datetime value if this is a datetime
    pub fn as_datetime(&self) -> Option<i64> {
        match self {
            PropertyValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Get array value if this is an array
    pub fn as_array(&self) -> Option<&Vec<PropertyValue>> {
        match self {
            PropertyValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get map value if this is a map
    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Numeric view of integers and floats
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::DateTime(_) => "DateTime",
            PropertyValue::Array(_) => "Array",
            PropertyValue::Map(_) => "Map",
            PropertyValue::Null => "Null",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            PropertyValue::String(_) => 0,
            PropertyValue::Integer(_) => 1,
            PropertyValue::Float(_) => 2,
            PropertyValue::Boolean(_) => 3,
            PropertyValue::DateTime(_) => 4,
            PropertyValue::Array(_) => 5,
            PropertyValue::Map(_) => 6,
            PropertyValue::Null => 7,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a == b,
            (PropertyValue::DateTime(a), PropertyValue::DateTime(b)) => a == b,
            (PropertyValue::Array(a), PropertyValue::Array(b)) => a == b,
            (PropertyValue::Map(a), PropertyValue::Map(b)) => a == b,
            (PropertyValue::Null, PropertyValue::Null) => true,
            _ => false,
        }
    }
}

impl Eq for PropertyValue {}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            PropertyValue::String(s) => s.hash(state),
            PropertyValue::Integer(i) => i.hash(state),
            PropertyValue::Float(f) => f.to_bits().hash(state),
            PropertyValue::Boolean(b) => b.hash(state),
            PropertyValue::DateTime(dt) => dt.hash(state),
            PropertyValue::Array(arr) => arr.hash(state),
            PropertyValue::Map(map) => map.hash(state),
            PropertyValue::Null => {}
        }
    }
}

impl PartialOrd for PropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => Some(Ordering::Equal),
            (PropertyValue::Null, _) => Some(Ordering::Less),
            (_, PropertyValue::Null) => Some(Ordering::Greater),
            (PropertyValue::String(a), PropertyValue::String(b)) => a.partial_cmp(b),
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => a.partial_cmp(b),
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.partial_cmp(b),
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a.partial_cmp(b),
            (PropertyValue::DateTime(a), PropertyValue::DateTime(b)) => a.partial_cmp(b),
            (PropertyValue::Array(a), PropertyValue::Array(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::DateTime(dt) => write!(f, "DateTime({})", dt),
            PropertyValue::Array(arr) => {
                write!(f, "[")?;
                for (i, val) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            PropertyValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, val)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, val)?;
                }
                write!(f, "}}")
            }
            PropertyValue::Null => write!(f, "null"),
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

/// Integers above `i64::MAX` are kept exactly as their decimal text
impl From<u64> for PropertyValue {
    fn from(n: u64) -> Self {
        i64::try_from(n)
            .map(PropertyValue::Integer)
            .unwrap_or_else(|_| PropertyValue::String(n.to_string()))
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(arr: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(arr)
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        PropertyValue::Map(map)
    }
}

impl From<&ElementId> for PropertyValue {
    fn from(id: &ElementId) -> Self {
        match id {
            ElementId::Numeric(n) => PropertyValue::from(*n),
            ElementId::Text(s) => PropertyValue::String(s.clone()),
        }
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropertyValue::Null)
    }
}

/// Insertion-ordered property map used for bulk initialisation
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// Errors raised when a caller writes a reserved property key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    #[error("Property '{0}' holds the element id and cannot be changed")]
    IdentificationChange(String),

    #[error("Property '{0}' holds the revision id and cannot be changed")]
    RevisionIdentificationChange(String),
}

pub type PropertyResult<T> = Result<T, PropertyError>;

/// Names of the reserved id / revision-id keys, shared by all elements of a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedKeys {
    pub id_key: String,
    pub rev_id_key: String,
}

impl ReservedKeys {
    pub fn new(id_key: impl Into<String>, rev_id_key: impl Into<String>) -> Self {
        Self {
            id_key: id_key.into(),
            rev_id_key: rev_id_key.into(),
        }
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        key == self.id_key || key == self.rev_id_key
    }

    fn check(&self, key: &str) -> PropertyResult<()> {
        if key == self.id_key {
            warn!("Rejected write to reserved id key '{}'", key);
            return Err(PropertyError::IdentificationChange(key.to_string()));
        }
        if key == self.rev_id_key {
            warn!("Rejected write to reserved revision key '{}'", key);
            return Err(PropertyError::RevisionIdentificationChange(key.to_string()));
        }
        Ok(())
    }
}

impl Default for ReservedKeys {
    fn default() -> Self {
        Self::new(super::ontology::ID_KEY, super::ontology::REV_ID_KEY)
    }
}

/// Property container owned by a single element
///
/// Iteration follows insertion order; the reserved id and revision entries
/// come first.
#[derive(Debug, Clone)]
pub struct Properties {
    keys: Arc<ReservedKeys>,
    revision: RevisionId,
    map: IndexMap<String, PropertyValue>,
}

impl Properties {
    /// Create a container tagged with the element id and the initial revision
    pub fn new(keys: Arc<ReservedKeys>, id: &ElementId) -> Self {
        let revision = RevisionId::initial();
        let mut map = IndexMap::new();
        map.insert(keys.id_key.clone(), PropertyValue::from(id));
        map.insert(
            keys.rev_id_key.clone(),
            PropertyValue::from(revision.as_u64()),
        );
        Self { keys, revision, map }
    }

    pub fn revision(&self) -> RevisionId {
        self.revision
    }

    pub fn reserved_keys(&self) -> &ReservedKeys {
        &self.keys
    }

    /// Get a property value
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.map.get(key)
    }

    /// Owned lookup for callers that cannot hold a borrow
    pub fn try_get(&self, key: &str) -> Option<PropertyValue> {
        self.map.get(key).cloned()
    }

    /// Set a property value, returning the previous one
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> PropertyResult<Option<PropertyValue>> {
        let key = key.into();
        self.keys.check(&key)?;
        let old = self.map.insert(key, value.into());
        self.bump();
        Ok(old)
    }

    /// Remove a property; the revision only moves when something was removed
    pub fn remove(&mut self, key: &str) -> PropertyResult<Option<PropertyValue>> {
        self.keys.check(key)?;
        let removed = self.map.shift_remove(key);
        if removed.is_some() {
            self.bump();
        }
        Ok(removed)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Linear scan over all values
    pub fn contains_value(&self, value: &PropertyValue) -> bool {
        self.map.values().any(|v| v == value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> + '_ {
        self.map.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &PropertyValue> + '_ {
        self.map.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> + '_ {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Copy of the current map
    pub fn to_map(&self) -> PropertyMap {
        self.map.clone()
    }

    fn bump(&mut self) {
        self.revision = self.revision.next();
        self.map.insert(
            self.keys.rev_id_key.clone(),
            PropertyValue::from(self.revision.as_u64()),
        );
    }
}

//! The property capability shared by every element kind

use super::property::{Properties, PropertyMap, PropertyResult, PropertyValue};
use super::types::{ElementId, ElementKind, Label, RevisionId};
use parking_lot::RwLock;
use serde::Serialize;

/// Anything that carries an id, a label and a property container
///
/// This is the narrow, host-independent property API (`try_get_property` /
/// `set_property`) that serializers and script bridges build on. All
/// accessors take `&self`; the container sits behind the element's own lock
/// so a revision bump and a reserved-key rejection are atomic per element.
pub trait HasProperties {
    fn id(&self) -> &ElementId;

    fn label(&self) -> &Label;

    fn kind(&self) -> ElementKind;

    /// The element's property container
    fn properties(&self) -> &RwLock<Properties>;

    fn rev_id(&self) -> RevisionId {
        self.properties().read().revision()
    }

    /// Look up a property, `None` when absent
    fn try_get_property(&self, key: &str) -> Option<PropertyValue> {
        self.properties().read().try_get(key)
    }

    /// Look up a property, `Null` when absent
    fn property(&self, key: &str) -> PropertyValue {
        self.try_get_property(key).unwrap_or(PropertyValue::Null)
    }

    fn set_property(
        &self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> PropertyResult<Option<PropertyValue>>
    where
        Self: Sized,
    {
        self.properties().write().set(key, value)
    }

    fn remove_property(&self, key: &str) -> PropertyResult<Option<PropertyValue>> {
        self.properties().write().remove(key)
    }

    fn has_property(&self, key: &str) -> bool {
        self.properties().read().contains_key(key)
    }

    fn has_property_value(&self, value: &PropertyValue) -> bool {
        self.properties().read().contains_value(value)
    }

    /// Keys in insertion order, read from the current state
    fn property_keys(&self) -> Vec<String> {
        self.properties().read().keys().cloned().collect()
    }

    fn property_count(&self) -> usize {
        self.properties().read().len()
    }

    fn snapshot(&self) -> ElementSnapshot {
        let props = self.properties().read();
        ElementSnapshot {
            kind: self.kind(),
            id: self.id().clone(),
            label: self.label().clone(),
            rev_id: props.revision(),
            properties: props.to_map(),
        }
    }
}

/// Serializable point-in-time copy of an element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSnapshot {
    pub kind: ElementKind,
    pub id: ElementId,
    pub label: Label,
    pub rev_id: RevisionId,
    pub properties: PropertyMap,
}

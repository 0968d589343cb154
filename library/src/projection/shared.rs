//! Combining the raw properties of one or more selected objects.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::property::{OverlayMap, RawProperty, RawPropertyMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedProperties {
    pub properties: RawPropertyMap,
    /// Overlay whose records were merged over the base records.
    pub overlay_id: Option<String>,
    /// Keys that came from the overlay.
    pub overlay_keys: Vec<String>,
}

/// Merges the raw properties of every selected object.
///
/// A single selection gets its first overlay merged over the base records.
/// Multiple selections keep only the keys present in every selection with
/// the same type and label, and blank out values and memos that differ.
pub fn merge_selection(selections: Vec<(RawPropertyMap, OverlayMap)>) -> MergedProperties {
    let mut selections = selections.into_iter();
    let Some((mut base, overlays)) = selections.next() else {
        return MergedProperties::default();
    };
    let others: Vec<RawPropertyMap> = selections.map(|(props, _)| props).collect();

    if others.is_empty() {
        let mut merged = MergedProperties::default();
        if let Some((overlay_id, records)) = overlays.into_iter().next() {
            merged.overlay_keys = records.keys().cloned().collect();
            merged.overlay_id = Some(overlay_id);
            base.extend(records);
        }
        merged.properties = base;
        return merged;
    }

    let mut shared = BTreeMap::new();
    for (key, prop) in base {
        let matching: Option<Vec<&RawProperty>> = others
            .iter()
            .map(|other| other.get(&key).filter(|o| o.matches(&prop)))
            .collect();
        let Some(matching) = matching else {
            continue;
        };

        let mut merged = prop.clone();
        if matching.iter().any(|o| o.value != prop.value) {
            merged.value = Value::String(String::new());
        }
        if matching.iter().any(|o| o.memo != prop.memo) {
            merged.memo = String::new();
        }
        shared.insert(key, merged);
    }

    MergedProperties {
        properties: shared,
        overlay_id: None,
        overlay_keys: Vec::new(),
    }
}

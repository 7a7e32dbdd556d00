//! Pivot cache model.
//!
//! A pivot cache captures the field definitions, discrete items, optional
//! group definitions, and record stream of one pivot data source. The
//! collection indexes caches by numeric identifier and by their source:
//! either a `(sheet name, range)` pair or a named table.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::types::{ErrorValue, PivotCacheGroupBy, PivotCacheId, Range};

/// A discrete value of a pivot cache field.
#[derive(Debug, Clone, PartialEq)]
pub enum PivotCacheItem {
    Character(String),
    Numeric(f64),
    DateTime(NaiveDateTime),
    Error(ErrorValue),
    Boolean(bool),
}

/// Group definition attached to a field.
///
/// Discrete grouping maps each base item to a group item by index;
/// range grouping buckets values into intervals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotCacheGroupData {
    /// Base-item index to group-item index, in base order. Only populated
    /// for discrete grouping.
    pub base_to_group_indices: Vec<usize>,
    /// Group items of this grouping.
    pub items: Vec<PivotCacheItem>,
    /// Range-grouping mode; `None` for discrete grouping.
    pub group_by: Option<PivotCacheGroupBy>,
    pub auto_start: bool,
    pub auto_end: bool,
    pub start_number: Option<f64>,
    pub end_number: Option<f64>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub interval: Option<f64>,
}

impl PivotCacheGroupData {
    pub fn is_range_grouping(&self) -> bool {
        self.group_by.is_some()
            || self.auto_start
            || self.auto_end
            || self.start_number.is_some()
            || self.end_number.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.interval.is_some()
    }
}

/// One field of a pivot cache.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotCacheField {
    pub name: String,
    pub items: Vec<PivotCacheItem>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    pub group_data: Option<PivotCacheGroupData>,
}

/// One column value of a pivot cache record.
#[derive(Debug, Clone, PartialEq)]
pub enum PivotCacheRecordValue {
    Character(String),
    Numeric(f64),
    DateTime(NaiveDateTime),
    Error(ErrorValue),
    Boolean(bool),
    /// Reference into the corresponding field's shared items.
    SharedItemIndex(usize),
}

/// A record: one value per field.
pub type PivotCacheRecord = Vec<PivotCacheRecordValue>;

/// A complete pivot cache.
#[derive(Debug, Default)]
pub struct PivotCache {
    pub cache_id: PivotCacheId,
    pub fields: Vec<PivotCacheField>,
    pub records: Vec<PivotCacheRecord>,
}

impl PivotCache {
    pub fn new(cache_id: PivotCacheId) -> Self {
        Self {
            cache_id,
            ..Self::default()
        }
    }

    /// Verify that every shared-item reference in the records is in range
    /// for its field's items array.
    pub fn validate_record_indices(&self) -> bool {
        self.records.iter().all(|record| {
            record.iter().enumerate().all(|(field_pos, value)| {
                match value {
                    PivotCacheRecordValue::SharedItemIndex(i) => self
                        .fields
                        .get(field_pos)
                        .is_some_and(|f| *i < f.items.len()),
                    _ => true,
                }
            })
        })
    }
}

/// Source a pivot cache was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceKey {
    Worksheet { sheet: String, range: Range },
    TableName(String),
}

/// Collection of pivot caches, indexed by id and by source.
#[derive(Debug, Default)]
pub struct PivotCollection {
    caches: HashMap<PivotCacheId, PivotCache>,
    sources: HashMap<SourceKey, PivotCacheId>,
}

impl PivotCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cache whose source is a worksheet range. An existing cache
    /// under the same id is replaced.
    pub fn insert_worksheet_cache(&mut self, sheet: &str, range: Range, cache: PivotCache) {
        self.sources.insert(
            SourceKey::Worksheet {
                sheet: sheet.to_string(),
                range,
            },
            cache.cache_id,
        );
        self.caches.insert(cache.cache_id, cache);
    }

    /// Insert a cache that carries no source specification; it remains
    /// reachable by id only.
    pub fn insert_cache(&mut self, cache: PivotCache) {
        self.caches.insert(cache.cache_id, cache);
    }

    /// Insert a cache whose source is a named table.
    pub fn insert_table_cache(&mut self, table_name: &str, cache: PivotCache) {
        self.sources
            .insert(SourceKey::TableName(table_name.to_string()), cache.cache_id);
        self.caches.insert(cache.cache_id, cache);
    }

    pub fn get_cache(&self, id: PivotCacheId) -> Option<&PivotCache> {
        self.caches.get(&id)
    }

    pub fn get_cache_mut(&mut self, id: PivotCacheId) -> Option<&mut PivotCache> {
        self.caches.get_mut(&id)
    }

    pub fn get_cache_by_range(&self, sheet: &str, range: Range) -> Option<&PivotCache> {
        let key = SourceKey::Worksheet {
            sheet: sheet.to_string(),
            range,
        };
        self.sources.get(&key).and_then(|id| self.caches.get(id))
    }

    pub fn get_cache_by_table(&self, table_name: &str) -> Option<&PivotCache> {
        let key = SourceKey::TableName(table_name.to_string());
        self.sources.get(&key).and_then(|id| self.caches.get(id))
    }

    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }

    pub fn clear(&mut self) {
        self.caches.clear();
        self.sources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    fn sample_cache(id: PivotCacheId) -> PivotCache {
        let mut cache = PivotCache::new(id);
        cache.fields.push(PivotCacheField {
            name: "Category".to_string(),
            items: vec![
                PivotCacheItem::Character("A".to_string()),
                PivotCacheItem::Character("B".to_string()),
            ],
            ..PivotCacheField::default()
        });
        cache.fields.push(PivotCacheField {
            name: "Value".to_string(),
            min_value: Some(1.0),
            max_value: Some(9.0),
            ..PivotCacheField::default()
        });
        cache.records.push(vec![
            PivotCacheRecordValue::SharedItemIndex(0),
            PivotCacheRecordValue::Numeric(4.0),
        ]);
        cache.records.push(vec![
            PivotCacheRecordValue::SharedItemIndex(1),
            PivotCacheRecordValue::Numeric(9.0),
        ]);
        cache
    }

    #[test]
    fn test_cache_lookup_by_id() {
        let mut col = PivotCollection::new();
        let range = Range::new(Address::new(0, 0), Address::new(9, 1));
        col.insert_worksheet_cache("Data", range, sample_cache(1));
        assert_eq!(col.cache_count(), 1);
        assert_eq!(col.get_cache(1).unwrap().fields.len(), 2);
        assert!(col.get_cache(2).is_none());
    }

    #[test]
    fn test_cache_lookup_by_range() {
        let mut col = PivotCollection::new();
        let range = Range::new(Address::new(0, 0), Address::new(9, 1));
        col.insert_worksheet_cache("Data", range, sample_cache(1));
        assert!(col.get_cache_by_range("Data", range).is_some());
        assert!(col.get_cache_by_range("Other", range).is_none());
        let other = Range::new(Address::new(0, 0), Address::new(5, 1));
        assert!(col.get_cache_by_range("Data", other).is_none());
    }

    #[test]
    fn test_cache_lookup_by_table() {
        let mut col = PivotCollection::new();
        col.insert_table_cache("SalesTable", sample_cache(7));
        assert_eq!(col.get_cache_by_table("SalesTable").unwrap().cache_id, 7);
        assert!(col.get_cache_by_table("Nope").is_none());
    }

    #[test]
    fn test_record_index_validation() {
        let mut cache = sample_cache(1);
        assert!(cache.validate_record_indices());
        cache
            .records
            .push(vec![PivotCacheRecordValue::SharedItemIndex(5)]);
        assert!(!cache.validate_record_indices());
    }

    #[test]
    fn test_group_data_mode_detection() {
        let mut gd = PivotCacheGroupData::default();
        assert!(!gd.is_range_grouping());
        gd.base_to_group_indices.push(0);
        assert!(!gd.is_range_grouping());
        gd.interval = Some(10.0);
        assert!(gd.is_range_grouping());
    }
}

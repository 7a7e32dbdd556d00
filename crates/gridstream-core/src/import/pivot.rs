//! Pivot cache import builders.
//!
//! The definition builder buffers the source specification, fields, items,
//! and optional group data; its commit stores the cache in the pivot
//! collection under the id given at creation. The records builder streams
//! record values and attaches them to the already-committed cache.

use chrono::NaiveDateTime;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::pivot::{
    PivotCache, PivotCacheField, PivotCacheGroupData, PivotCacheItem, PivotCacheRecord,
    PivotCacheRecordValue,
};
use crate::types::{
    ErrorValue, FormulaRefContext, PivotCacheGroupBy, PivotCacheId,
};

use super::resolver::ReferenceResolver;

enum SourceSpec {
    None,
    Worksheet { sheet: String, range: crate::types::Range },
    Table(String),
}

/// Buffer-then-commit builder for a pivot cache definition.
pub struct ImportPivotCacheDefinition<'a> {
    doc: &'a mut Document,
    cache: PivotCache,
    source: SourceSpec,
    field: PivotCacheField,
    item: Option<PivotCacheItem>,
}

impl<'a> ImportPivotCacheDefinition<'a> {
    pub(crate) fn new(doc: &'a mut Document, cache_id: PivotCacheId) -> Self {
        Self {
            doc,
            cache: PivotCache::new(cache_id),
            source: SourceSpec::None,
            field: PivotCacheField::default(),
            item: None,
        }
    }

    /// Declare a worksheet range as the source of this cache.
    ///
    /// # Errors
    ///
    /// Fails when the range string cannot be resolved.
    pub fn set_worksheet_source(&mut self, ref_str: &str, sheet_name: &str) -> Result<()> {
        let resolver = ReferenceResolver::new(self.doc, FormulaRefContext::Global);
        let range = resolver.resolve_range(ref_str)?.to_range();
        self.source = SourceSpec::Worksheet {
            sheet: sheet_name.to_string(),
            range,
        };
        Ok(())
    }

    /// Declare a named table as the source of this cache.
    pub fn set_table_source(&mut self, table_name: &str) {
        self.source = SourceSpec::Table(table_name.to_string());
    }

    /// Pre-size the field list.
    pub fn set_field_count(&mut self, n: usize) {
        self.cache.fields.reserve(n);
    }

    // ===== field buffer =====

    pub fn set_field_name(&mut self, name: &str) {
        self.field.name = name.to_string();
    }

    pub fn set_field_min_value(&mut self, v: f64) {
        self.field.min_value = Some(v);
    }

    pub fn set_field_max_value(&mut self, v: f64) {
        self.field.max_value = Some(v);
    }

    pub fn set_field_min_date(&mut self, dt: NaiveDateTime) {
        self.field.min_date = Some(dt);
    }

    pub fn set_field_max_date(&mut self, dt: NaiveDateTime) {
        self.field.max_date = Some(dt);
    }

    /// Mark the current field as a group field over the field at
    /// `base_index` and open the group sub-builder.
    pub fn start_field_group(&mut self, base_index: usize) -> ImportPivotFieldGroup<'_> {
        let _ = base_index;
        ImportPivotFieldGroup {
            target: &mut self.field.group_data,
            buffer: PivotCacheGroupData::default(),
            item: None,
        }
    }

    // ===== field item buffer =====

    pub fn set_field_item_string(&mut self, value: &str) {
        self.item = Some(PivotCacheItem::Character(value.to_string()));
    }

    pub fn set_field_item_numeric(&mut self, v: f64) {
        self.item = Some(PivotCacheItem::Numeric(v));
    }

    pub fn set_field_item_date_time(&mut self, dt: NaiveDateTime) {
        self.item = Some(PivotCacheItem::DateTime(dt));
    }

    pub fn set_field_item_error(&mut self, ev: ErrorValue) {
        self.item = Some(PivotCacheItem::Error(ev));
    }

    pub fn set_field_item_boolean(&mut self, b: bool) {
        self.item = Some(PivotCacheItem::Boolean(b));
    }

    /// Fold the buffered item into the current field.
    pub fn commit_field_item(&mut self) {
        if let Some(item) = self.item.take() {
            self.field.items.push(item);
        }
    }

    /// Fold the buffered field into the cache.
    pub fn commit_field(&mut self) {
        self.cache.fields.push(std::mem::take(&mut self.field));
    }

    /// Commit the cache to the pivot collection.
    ///
    /// An existing cache under the same id is replaced.
    pub fn commit(self) -> Result<()> {
        let pivots = self.doc.pivots_mut();
        match self.source {
            SourceSpec::Worksheet { sheet, range } => {
                pivots.insert_worksheet_cache(&sheet, range, self.cache);
            }
            SourceSpec::Table(name) => pivots.insert_table_cache(&name, self.cache),
            SourceSpec::None => pivots.insert_cache(self.cache),
        }
        Ok(())
    }
}

/// Sub-builder for group data of one pivot cache field.
///
/// The grouping mode is implicit: calling any range setter makes the field
/// range-grouped; otherwise the per-base-item index links define a discrete
/// grouping.
pub struct ImportPivotFieldGroup<'a> {
    target: &'a mut Option<PivotCacheGroupData>,
    buffer: PivotCacheGroupData,
    item: Option<PivotCacheItem>,
}

impl ImportPivotFieldGroup<'_> {
    /// Link the next base item (in call order) to a group item index.
    pub fn link_base_to_group_items(&mut self, group_item_index: usize) {
        self.buffer.base_to_group_indices.push(group_item_index);
    }

    pub fn set_field_item_string(&mut self, value: &str) {
        self.item = Some(PivotCacheItem::Character(value.to_string()));
    }

    pub fn set_field_item_numeric(&mut self, v: f64) {
        self.item = Some(PivotCacheItem::Numeric(v));
    }

    /// Fold the buffered item into the group's item list.
    pub fn commit_field_item(&mut self) {
        if let Some(item) = self.item.take() {
            self.buffer.items.push(item);
        }
    }

    // ===== range-grouping setters (any of these selects range mode) =====

    pub fn set_range_grouping_type(&mut self, group_by: PivotCacheGroupBy) {
        self.buffer.group_by = Some(group_by);
    }

    pub fn set_range_auto_start(&mut self, b: bool) {
        self.buffer.auto_start = b;
    }

    pub fn set_range_auto_end(&mut self, b: bool) {
        self.buffer.auto_end = b;
    }

    pub fn set_range_start_number(&mut self, v: f64) {
        self.buffer.start_number = Some(v);
    }

    pub fn set_range_end_number(&mut self, v: f64) {
        self.buffer.end_number = Some(v);
    }

    pub fn set_range_start_date(&mut self, dt: NaiveDateTime) {
        self.buffer.start_date = Some(dt);
    }

    pub fn set_range_end_date(&mut self, dt: NaiveDateTime) {
        self.buffer.end_date = Some(dt);
    }

    /// Interval of the range grouping; days for date ranges.
    pub fn set_range_interval(&mut self, v: f64) {
        self.buffer.interval = Some(v);
    }

    /// Commit the group data to the parent field.
    pub fn commit(self) {
        *self.target = Some(self.buffer);
    }
}

/// Buffer-then-commit builder for a pivot cache record stream.
pub struct ImportPivotCacheRecords<'a> {
    doc: &'a mut Document,
    cache_id: PivotCacheId,
    records: Vec<PivotCacheRecord>,
    current: PivotCacheRecord,
}

impl<'a> ImportPivotCacheRecords<'a> {
    pub(crate) fn new(doc: &'a mut Document, cache_id: PivotCacheId) -> Self {
        Self {
            doc,
            cache_id,
            records: Vec::new(),
            current: PivotCacheRecord::new(),
        }
    }

    /// Pre-size the record list.
    pub fn set_record_count(&mut self, n: usize) {
        self.records.reserve(n);
    }

    pub fn append_record_value_numeric(&mut self, v: f64) {
        self.current.push(PivotCacheRecordValue::Numeric(v));
    }

    pub fn append_record_value_character(&mut self, s: &str) {
        self.current
            .push(PivotCacheRecordValue::Character(s.to_string()));
    }

    pub fn append_record_value_boolean(&mut self, b: bool) {
        self.current.push(PivotCacheRecordValue::Boolean(b));
    }

    pub fn append_record_value_date_time(&mut self, dt: NaiveDateTime) {
        self.current.push(PivotCacheRecordValue::DateTime(dt));
    }

    pub fn append_record_value_error(&mut self, ev: ErrorValue) {
        self.current.push(PivotCacheRecordValue::Error(ev));
    }

    /// Reference into the corresponding field's shared items.
    pub fn append_record_value_shared_item(&mut self, index: usize) {
        self.current
            .push(PivotCacheRecordValue::SharedItemIndex(index));
    }

    /// Close the current record.
    pub fn commit_record(&mut self) {
        self.records.push(std::mem::take(&mut self.current));
    }

    /// Commit the record stream to the cache.
    ///
    /// # Errors
    ///
    /// Fails when no cache exists under the id, or a record references a
    /// shared-item index out of range for its field.
    pub fn commit(self) -> Result<()> {
        let cache = self
            .doc
            .pivots_mut()
            .get_cache_mut(self.cache_id)
            .ok_or_else(|| {
                Error::Structure(format!(
                    "pivot cache records committed for unknown cache id {}",
                    self.cache_id
                ))
            })?;
        cache.records = self.records;
        if !cache.validate_record_indices() {
            return Err(Error::Structure(format!(
                "pivot cache {} has a record referencing a shared item out of range",
                self.cache_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;
    use crate::utils::constants::DEFAULT_SHEET_SIZE;

    fn doc() -> Document {
        let mut doc = Document::new(DEFAULT_SHEET_SIZE);
        doc.append_sheet("Data");
        doc
    }

    fn build_definition(doc: &mut Document) {
        let mut def = ImportPivotCacheDefinition::new(doc, 1);
        def.set_worksheet_source("A1:B5", "Data").unwrap();
        def.set_field_count(2);

        def.set_field_name("Category");
        def.set_field_item_string("A");
        def.commit_field_item();
        def.set_field_item_string("B");
        def.commit_field_item();
        def.commit_field();

        def.set_field_name("Value");
        def.set_field_min_value(1.0);
        def.set_field_max_value(9.0);
        def.commit_field();

        def.commit().unwrap();
    }

    #[test]
    fn test_definition_commit_and_lookup() {
        let mut doc = doc();
        build_definition(&mut doc);

        let cache = doc.pivots().get_cache(1).unwrap();
        assert_eq!(cache.fields.len(), 2);
        assert_eq!(cache.fields[0].items.len(), 2);
        assert_eq!(cache.fields[1].min_value, Some(1.0));

        let range = crate::types::Range::new(Address::new(0, 0), Address::new(4, 1));
        assert!(doc.pivots().get_cache_by_range("Data", range).is_some());
    }

    #[test]
    fn test_table_source_lookup() {
        let mut doc = doc();
        let mut def = ImportPivotCacheDefinition::new(&mut doc, 2);
        def.set_table_source("SalesTable");
        def.set_field_name("F");
        def.commit_field();
        def.commit().unwrap();
        assert!(doc.pivots().get_cache_by_table("SalesTable").is_some());
    }

    #[test]
    fn test_discrete_group() {
        let mut doc = doc();
        let mut def = ImportPivotCacheDefinition::new(&mut doc, 1);
        def.set_field_name("Grouped");
        {
            let mut group = def.start_field_group(0);
            group.set_field_item_string("Low");
            group.commit_field_item();
            group.set_field_item_string("High");
            group.commit_field_item();
            group.link_base_to_group_items(0);
            group.link_base_to_group_items(0);
            group.link_base_to_group_items(1);
            group.commit();
        }
        def.commit_field();
        def.commit().unwrap();

        let cache = doc.pivots().get_cache(1).unwrap();
        let gd = cache.fields[0].group_data.as_ref().unwrap();
        assert!(!gd.is_range_grouping());
        assert_eq!(gd.base_to_group_indices, vec![0, 0, 1]);
        assert_eq!(gd.items.len(), 2);
    }

    #[test]
    fn test_range_group_mode_is_implicit() {
        let mut doc = doc();
        let mut def = ImportPivotCacheDefinition::new(&mut doc, 1);
        def.set_field_name("Bucketed");
        {
            let mut group = def.start_field_group(0);
            group.set_range_grouping_type(PivotCacheGroupBy::Range);
            group.set_range_start_number(0.0);
            group.set_range_end_number(100.0);
            group.set_range_interval(25.0);
            group.commit();
        }
        def.commit_field();
        def.commit().unwrap();

        let cache = doc.pivots().get_cache(1).unwrap();
        let gd = cache.fields[0].group_data.as_ref().unwrap();
        assert!(gd.is_range_grouping());
        assert_eq!(gd.group_by, Some(PivotCacheGroupBy::Range));
        assert_eq!(gd.interval, Some(25.0));
    }

    #[test]
    fn test_records_commit_and_validation() {
        let mut doc = doc();
        build_definition(&mut doc);

        let mut rec = ImportPivotCacheRecords::new(&mut doc, 1);
        rec.set_record_count(2);
        rec.append_record_value_shared_item(0);
        rec.append_record_value_numeric(4.0);
        rec.commit_record();
        rec.append_record_value_shared_item(1);
        rec.append_record_value_numeric(9.0);
        rec.commit_record();
        rec.commit().unwrap();

        assert_eq!(doc.pivots().get_cache(1).unwrap().records.len(), 2);
    }

    #[test]
    fn test_records_out_of_range_index_fails() {
        let mut doc = doc();
        build_definition(&mut doc);

        let mut rec = ImportPivotCacheRecords::new(&mut doc, 1);
        rec.append_record_value_shared_item(5);
        rec.append_record_value_numeric(1.0);
        rec.commit_record();
        assert!(rec.commit().is_err());
    }

    #[test]
    fn test_records_for_unknown_cache_fail() {
        let mut doc = doc();
        let mut rec = ImportPivotCacheRecords::new(&mut doc, 42);
        rec.commit_record();
        assert!(rec.commit().is_err());
    }
}

//! Root-to-leaf descent, whole-tree traversal, and range-bound resolution.
//!
//! `TreeNavigator` owns the collaborators [`PageSearch`](crate::page_search)
//! needs on every page it visits: a [`PageStore`], a [`TableDef`], and a
//! [`KeyComparator`]. It never inspects record bytes itself — that is
//! [`RecordDecoder`](crate::innodb::record_decoder::RecordDecoder)'s job.

use crate::bounds::Bound;
use crate::decode_config::DecodeConfig;
use crate::innodb::field_decode::FieldValue;
use crate::innodb::index_page::{load_index_page, IndexPage};
use crate::innodb::record::walk_compact_records;
use crate::innodb::record_decoder::{LeafRecord, Record, RecordDecoder};
use crate::key_comparator::{KeyComparator, LexicographicComparator};
use crate::page_search::{search_page, SearchOutcome};
use crate::page_store::PageStore;
use crate::table_def::TableDef;
use crate::IdbError;

/// The conventional page number of the first index root in a single-table
/// tablespace: page 0 is the FSP header, 1 the insert-buffer bitmap, 2 the
/// inode page, and 3 is either the clustered index root or, on MySQL 8.0+,
/// the SDI index root immediately preceding it. [`load_index_page`]
/// transparently skips past an SDI page to find the real root.
const DEFAULT_ROOT_PAGE_NUMBER: u32 = 3;

/// Descends an InnoDB clustered index B+Tree to answer point lookups, range
/// queries, and full scans.
pub struct TreeNavigator<S: PageStore, T: TableDef, C: KeyComparator = LexicographicComparator> {
    store: S,
    table: T,
    comparator: C,
    config: DecodeConfig,
    root_page: u32,
    warnings: Vec<String>,
}

impl<S: PageStore, T: TableDef> TreeNavigator<S, T, LexicographicComparator> {
    /// Build a navigator with the default lexicographic comparator and the
    /// conventional root page number.
    pub fn new(store: S, table: T, config: DecodeConfig) -> Self {
        TreeNavigator {
            store,
            table,
            comparator: LexicographicComparator,
            config,
            root_page: DEFAULT_ROOT_PAGE_NUMBER,
            warnings: Vec::new(),
        }
    }
}

impl<S: PageStore, T: TableDef, C: KeyComparator> TreeNavigator<S, T, C> {
    /// Build a navigator with an explicit comparator.
    pub fn with_comparator(store: S, table: T, config: DecodeConfig, comparator: C) -> Self {
        TreeNavigator {
            store,
            table,
            comparator,
            config,
            root_page: DEFAULT_ROOT_PAGE_NUMBER,
            warnings: Vec::new(),
        }
    }

    /// Override the root page number (for tablespaces whose clustered index
    /// root does not live at the conventional location, or in tests).
    pub fn with_root_page(mut self, root_page: u32) -> Self {
        self.root_page = root_page;
        self
    }

    /// Look up the exact row for a composite primary-key value.
    pub fn point_lookup(&mut self, key: &[FieldValue]) -> Result<Option<LeafRecord>, IdbError> {
        validate_key(key, self.table.pk_column_count())?;
        let (_, outcome) = self.descend_to_leaf_for_key(key)?;
        match outcome {
            SearchOutcome::Found(leaf) => Ok(Some(leaf)),
            SearchOutcome::NotFound { .. } => Ok(None),
            SearchOutcome::Descend(_) => unreachable!(
                "descend_to_leaf_for_key only returns an outcome once a leaf page is reached"
            ),
        }
    }

    /// Visit every leaf row in the tree, depth-first from the root. System
    /// records are never surfaced to `visit`.
    pub fn traverse_all<F: FnMut(LeafRecord)>(&mut self, mut visit: F) -> Result<(), IdbError> {
        self.traverse_page(self.root_page, &mut visit)
    }

    /// Resolve a `[lower, upper]` range to the page numbers of the leaves
    /// holding the closest records to each bound. An unbounded side resolves
    /// to the leftmost (lower) or rightmost (upper) leaf page.
    pub fn range_bounds(&mut self, lower: &Bound, upper: &Bound) -> Result<(u32, u32), IdbError> {
        let pk_count = self.table.pk_column_count();
        if !lower.is_unbounded() {
            validate_key(&lower.key, pk_count)?;
        }
        if !upper.is_unbounded() {
            validate_key(&upper.key, pk_count)?;
        }
        if !lower.is_unbounded() && !upper.is_unbounded() {
            let cmp = self.comparator.compare(&lower.key, &upper.key);
            if cmp == std::cmp::Ordering::Greater {
                return Err(IdbError::Argument(format!(
                    "range bounds are inverted: lower key {:?} is greater than upper key {:?}",
                    lower.key, upper.key
                )));
            }
        }
        let start_page = if lower.is_unbounded() {
            self.descend_extreme(true)?
        } else {
            self.descend_to_leaf_for_key(&lower.key)?.0
        };
        let end_page = if upper.is_unbounded() {
            self.descend_extreme(false)?
        } else {
            self.descend_to_leaf_for_key(&upper.key)?.0
        };
        Ok((start_page, end_page))
    }

    /// Give mutable access to the underlying [`PageStore`], for
    /// [`RangeIterator`](crate::range_iterator::RangeIterator) to load pages
    /// with while it walks the leaf-level sibling chain.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn config(&self) -> DecodeConfig {
        self.config
    }

    /// Non-fatal warnings accumulated while walking pages, e.g. a page whose
    /// chained record count disagrees with its index header's declared
    /// count (the chain itself is still trusted).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Record a non-fatal warning, for collaborators (like `RangeIterator`)
    /// that decode pages on this navigator's behalf.
    pub fn push_warning(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    /// Split into independent borrows of the store, table, comparator, and
    /// config, for callers that need to build a [`RecordDecoder`] and compare
    /// keys while still holding a store handle to load further pages with.
    pub fn parts(&mut self) -> (&mut S, &T, &C, DecodeConfig) {
        (&mut self.store, &self.table, &self.comparator, self.config)
    }

    /// Compare two composite keys using this navigator's comparator.
    pub fn compare_keys(&self, a: &[FieldValue], b: &[FieldValue]) -> std::cmp::Ordering {
        self.comparator.compare(a, b)
    }

    fn descend_to_leaf_for_key(
        &mut self,
        key: &[FieldValue],
    ) -> Result<(u32, SearchOutcome), IdbError> {
        let mut current_page_no = self.root_page;
        loop {
            let page = load_index_page(&mut self.store, current_page_no)?;
            let outcome = search_page(
                &mut self.store,
                &page,
                &self.table,
                &self.comparator,
                key,
                self.config,
            )?;
            match outcome {
                SearchOutcome::Descend(child) => current_page_no = child,
                other => return Ok((current_page_no, other)),
            }
        }
    }

    /// Descend via the first (`want_first = true`) or last record on each
    /// non-leaf page, reaching the leftmost or rightmost leaf.
    fn descend_extreme(&mut self, want_first: bool) -> Result<u32, IdbError> {
        let mut current_page_no = self.root_page;
        loop {
            let page = load_index_page(&mut self.store, current_page_no)?;
            if page.is_leaf() {
                return Ok(current_page_no);
            }
            let record_infos = walk_compact_records(page.data());
            self.check_record_count(current_page_no, &page, record_infos.len());
            let chosen = if want_first {
                record_infos.first()
            } else {
                record_infos.last()
            };
            let offset = chosen
                .ok_or_else(|| {
                    IdbError::MalformedRecord("non-leaf page has no records to descend via".into())
                })?
                .offset;

            let next_page_no = {
                let decoder = RecordDecoder::new(&page, &self.table, self.config);
                match decoder.decode(&mut self.store, offset)? {
                    Record::NodePtr(np) => np.child_page_number,
                    other => {
                        return Err(IdbError::MalformedRecord(format!(
                            "expected node-pointer record on non-leaf page, found {:?}",
                            other
                        )))
                    }
                }
            };
            current_page_no = next_page_no;
        }
    }

    fn traverse_page<F: FnMut(LeafRecord)>(
        &mut self,
        page_no: u32,
        visit: &mut F,
    ) -> Result<(), IdbError> {
        let page = load_index_page(&mut self.store, page_no)?;
        let record_infos = walk_compact_records(page.data());
        self.check_record_count(page_no, &page, record_infos.len());

        let mut children = Vec::new();
        {
            let decoder = RecordDecoder::new(&page, &self.table, self.config);
            for info in &record_infos {
                match decoder.decode(&mut self.store, info.offset)? {
                    Record::Leaf(leaf) => visit(leaf),
                    Record::NodePtr(np) => children.push(np.child_page_number),
                    Record::System(..) => {}
                }
            }
        }

        for child in children {
            self.traverse_page(child, visit)?;
        }
        Ok(())
    }

    /// Record a warning when the chained record count disagrees with the
    /// page header's declared count. The chain is still trusted either way.
    fn check_record_count(&mut self, page_no: u32, page: &IndexPage, chained_count: usize) {
        let declared = page.header().n_recs as usize;
        if declared != chained_count {
            self.warnings.push(format!(
                "page {}: chained {} record(s) but index header declares {}",
                page_no, chained_count, declared
            ));
        }
    }
}

/// Validate a search key against the table's primary-key shape before any
/// page is loaded: arity must match, and no component may be `NULL` (an
/// InnoDB clustered index key is never nullable).
pub(crate) fn validate_key(key: &[FieldValue], pk_column_count: usize) -> Result<(), IdbError> {
    if key.len() != pk_column_count {
        return Err(IdbError::Argument(format!(
            "key has {} component(s) but the primary key has {}",
            key.len(),
            pk_column_count
        )));
    }
    if key.iter().any(|v| matches!(v, FieldValue::Null)) {
        return Err(IdbError::Argument(
            "key contains a NULL component; primary-key columns cannot be NULL".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{Bound, Operator};
    use crate::innodb::constants::*;
    use crate::innodb::page_types::PageType;
    use crate::table_def::StaticTableDef;
    use byteorder::{BigEndian, ByteOrder};
    use std::collections::HashMap;

    struct FakeStore {
        pages: HashMap<u32, Vec<u8>>,
    }

    impl PageStore for FakeStore {
        fn load(&mut self, page_no: u32) -> Result<Vec<u8>, IdbError> {
            self.pages
                .get(&page_no)
                .cloned()
                .ok_or_else(|| IdbError::Argument(format!("no such page {}", page_no)))
        }
        fn page_size(&self) -> u32 {
            16384
        }
    }

    fn write_record(page: &mut [u8], origin: usize, rec_type: u8, next_offset: i16) {
        let extra_start = origin - REC_N_NEW_EXTRA_BYTES;
        page[extra_start] = 0;
        BigEndian::write_u16(&mut page[extra_start + 1..], (1u16 << 3) | rec_type as u16);
        BigEndian::write_i16(&mut page[extra_start + 3..], next_offset);
    }

    fn page_skeleton(page_no: u32, level: u16, n_recs: u16) -> Vec<u8> {
        let mut page = vec![0u8; 16384];
        BigEndian::write_u32(&mut page[FIL_PAGE_OFFSET..], page_no);
        BigEndian::write_u32(&mut page[FIL_PAGE_PREV..], FIL_NULL);
        BigEndian::write_u32(&mut page[FIL_PAGE_NEXT..], FIL_NULL);
        BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], PageType::Index.as_u16());
        let base = FIL_PAGE_DATA;
        BigEndian::write_u16(&mut page[base + PAGE_N_DIR_SLOTS..], 2);
        BigEndian::write_u16(&mut page[base + PAGE_LEVEL..], level);
        BigEndian::write_u16(&mut page[base + PAGE_N_HEAP..], 0x8000 | (n_recs + 2));
        BigEndian::write_u16(&mut page[base + PAGE_N_RECS..], n_recs);
        BigEndian::write_u64(&mut page[base + PAGE_INDEX_ID..], 1);
        let trailer_start = page.len() - SIZE_FIL_TRAILER;
        BigEndian::write_u16(&mut page[trailer_start - PAGE_DIR_SLOT_SIZE..], PAGE_NEW_INFIMUM as u16);
        BigEndian::write_u16(
            &mut page[trailer_start - 2 * PAGE_DIR_SLOT_SIZE..],
            PAGE_NEW_SUPREMUM as u16,
        );
        page
    }

    /// A single leaf page holding INT-keyed rows with no payload columns.
    fn build_leaf_page(page_no: u32, keys: &[i32]) -> Vec<u8> {
        let mut page = page_skeleton(page_no, 0, keys.len() as u16);
        let record_stride = 30usize;
        let mut origin = PAGE_NEW_SUPREMUM + record_stride;
        write_record(&mut page, PAGE_NEW_INFIMUM, 2, (origin as i64 - PAGE_NEW_INFIMUM as i64) as i16);
        for (i, &k) in keys.iter().enumerate() {
            let next_origin = if i + 1 < keys.len() {
                origin + record_stride
            } else {
                PAGE_NEW_SUPREMUM
            };
            let rel = next_origin as i64 - origin as i64;
            write_record(&mut page, origin, 0, rel as i16);
            BigEndian::write_u32(&mut page[origin..], (k as u32) ^ 0x8000_0000);
            origin += record_stride;
        }
        page
    }

    /// A non-leaf page whose records route to `children` via separator keys.
    fn build_non_leaf_page(page_no: u32, entries: &[(i32, u32)]) -> Vec<u8> {
        let mut page = page_skeleton(page_no, 1, entries.len() as u16);
        let record_stride = 30usize;
        let mut origin = PAGE_NEW_SUPREMUM + record_stride;
        write_record(&mut page, PAGE_NEW_INFIMUM, 2, (origin as i64 - PAGE_NEW_INFIMUM as i64) as i16);
        for (i, &(k, child)) in entries.iter().enumerate() {
            let next_origin = if i + 1 < entries.len() {
                origin + record_stride
            } else {
                PAGE_NEW_SUPREMUM
            };
            let rel = next_origin as i64 - origin as i64;
            write_record(&mut page, origin, 1, rel as i16);
            BigEndian::write_u32(&mut page[origin..], (k as u32) ^ 0x8000_0000);
            BigEndian::write_u32(&mut page[origin + 4..], child);
            origin += record_stride;
        }
        page
    }

    fn two_level_tree() -> HashMap<u32, Vec<u8>> {
        let mut pages = HashMap::new();
        pages.insert(10, build_leaf_page(10, &[1, 2, 3]));
        pages.insert(11, build_leaf_page(11, &[4, 5, 6]));
        pages.insert(3, build_non_leaf_page(3, &[(3, 10), (6, 11)]));
        pages
    }

    #[test]
    fn test_point_lookup_descends_to_correct_leaf() {
        let store = FakeStore { pages: two_level_tree() };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        let row = nav.point_lookup(&[FieldValue::Int(5)]).unwrap().unwrap();
        assert!(matches!(row.key[0], FieldValue::Int(5)));
    }

    #[test]
    fn test_point_lookup_missing_key_returns_none() {
        let store = FakeStore { pages: two_level_tree() };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        assert!(nav.point_lookup(&[FieldValue::Int(42)]).unwrap().is_none());
    }

    #[test]
    fn test_traverse_all_visits_every_leaf_row_in_order() {
        let store = FakeStore { pages: two_level_tree() };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        let mut seen = Vec::new();
        nav.traverse_all(|rec| {
            if let FieldValue::Int(v) = rec.key[0] {
                seen.push(v);
            }
        })
        .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_range_bounds_unbounded_sides_reach_extremes() {
        let store = FakeStore { pages: two_level_tree() };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        let (start, end) = nav
            .range_bounds(&Bound::unbounded(), &Bound::unbounded())
            .unwrap();
        assert_eq!(start, 10);
        assert_eq!(end, 11);
    }

    #[test]
    fn test_range_bounds_with_explicit_keys() {
        let store = FakeStore { pages: two_level_tree() };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        let lower = Bound::new(Operator::Gte, vec![FieldValue::Int(2)]);
        let upper = Bound::new(Operator::Lte, vec![FieldValue::Int(5)]);
        let (start, end) = nav.range_bounds(&lower, &upper).unwrap();
        assert_eq!(start, 10);
        assert_eq!(end, 11);
    }

    #[test]
    fn test_point_lookup_rejects_wrong_arity_key() {
        let store = FakeStore { pages: two_level_tree() };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        let err = nav
            .point_lookup(&[FieldValue::Int(1), FieldValue::Int(2)])
            .unwrap_err();
        assert!(matches!(err, IdbError::Argument(_)));
    }

    #[test]
    fn test_point_lookup_rejects_null_key_component() {
        let store = FakeStore { pages: two_level_tree() };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        let err = nav.point_lookup(&[FieldValue::Null]).unwrap_err();
        assert!(matches!(err, IdbError::Argument(_)));
    }

    #[test]
    fn test_range_bounds_rejects_inverted_range() {
        let store = FakeStore { pages: two_level_tree() };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        let lower = Bound::new(Operator::Gte, vec![FieldValue::Int(5)]);
        let upper = Bound::new(Operator::Lte, vec![FieldValue::Int(2)]);
        let err = nav.range_bounds(&lower, &upper).unwrap_err();
        assert!(matches!(err, IdbError::Argument(_)));
    }

    #[test]
    fn test_traverse_all_warns_on_record_count_mismatch() {
        let mut pages = two_level_tree();
        // Corrupt leaf 11's declared record count without touching its chain.
        let leaf = pages.get_mut(&11).unwrap();
        BigEndian::write_u16(&mut leaf[FIL_PAGE_DATA + PAGE_N_RECS..], 99);

        let store = FakeStore { pages };
        let table = StaticTableDef::int_primary_key("id");
        let mut nav = TreeNavigator::new(store, table, DecodeConfig::default());

        nav.traverse_all(|_| {}).unwrap();
        let warnings = nav.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("page 11"));
        assert!(warnings[0].contains("declares 99"));
    }
}

//! Full record decoding: null bitmap, variable-length lengths, overflow
//! column assembly, and typed field values.
//!
//! [`crate::innodb::record`] only walks the next-record-offset chain and
//! classifies each record's type; this module materializes the actual
//! columns, reproducing the reverse-order null bitmap and var-len length
//! array stored immediately before a record's origin.

use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;

use crate::decode_config::DecodeConfig;
use crate::innodb::constants::*;
use crate::innodb::field_decode::{decode_field, decode_hex, decode_string, ColumnStorageInfo, FieldValue};
use crate::innodb::index_page::IndexPage;
use crate::innodb::lob::{walk_blob_chain, OverflowPagePointer};
use crate::innodb::record::{CompactRecordHeader, RecordType};
use crate::page_store::PageStore;
use crate::table_def::TableDef;
use crate::IdbError;

/// Maximum BLOB pages followed per overflow column, to bound corrupt chains.
const MAX_BLOB_CHAIN_PAGES: usize = 10_000;

/// Which sentinel a bare system record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemKind {
    Infimum,
    Supremum,
}

/// A decoded leaf-page (ordinary) row.
#[derive(Debug, Clone)]
pub struct LeafRecord {
    /// Primary-key column values, in schema order.
    pub key: Vec<FieldValue>,
    /// Non-PK, non-system column values, in schema order.
    pub values: Vec<FieldValue>,
    /// Absolute byte offset of the next record's origin on this page.
    pub next_record_offset: usize,
}

/// A decoded non-leaf (node-pointer) routing entry.
#[derive(Debug, Clone)]
pub struct NodePtrRecord {
    /// Primary-key prefix carried by this routing entry.
    pub key: Vec<FieldValue>,
    /// Child page this entry routes to.
    pub child_page_number: u32,
    /// Absolute byte offset of the next record's origin on this page.
    pub next_record_offset: usize,
}

/// A decoded record: a user row, a routing entry, or a bare sentinel.
#[derive(Debug, Clone)]
pub enum Record {
    /// An infimum/supremum sentinel, carrying its own next-record offset so
    /// callers can walk past it.
    System(SystemKind, usize),
    Leaf(LeafRecord),
    NodePtr(NodePtrRecord),
}

impl Record {
    /// The primary-key (prefix) values, if this is not a system record.
    pub fn key(&self) -> Option<&[FieldValue]> {
        match self {
            Record::Leaf(r) => Some(&r.key),
            Record::NodePtr(r) => Some(&r.key),
            Record::System(..) => None,
        }
    }

    /// The absolute offset of the next record on this page.
    pub fn next_record_offset(&self) -> usize {
        match self {
            Record::Leaf(r) => r.next_record_offset,
            Record::NodePtr(r) => r.next_record_offset,
            Record::System(_, next) => *next,
        }
    }
}

/// Decodes individual records out of one [`IndexPage`]'s bytes.
pub struct RecordDecoder<'a, T: TableDef> {
    page: &'a IndexPage,
    table: &'a T,
    config: DecodeConfig,
}

impl<'a, T: TableDef> RecordDecoder<'a, T> {
    pub fn new(page: &'a IndexPage, table: &'a T, config: DecodeConfig) -> Self {
        RecordDecoder { page, table, config }
    }

    /// Decode the record whose origin (the byte immediately after its
    /// 5-byte extra header) is `record_origin`.
    pub fn decode<S: PageStore>(
        &self,
        store: &mut S,
        record_origin: usize,
    ) -> Result<Record, IdbError> {
        let data = self.page.data();
        let page_size = data.len();

        if record_origin < REC_N_NEW_EXTRA_BYTES || record_origin > page_size {
            return Err(IdbError::MalformedRecord(format!(
                "record origin {} out of page bounds",
                record_origin
            )));
        }
        let header = CompactRecordHeader::parse(&data[record_origin - REC_N_NEW_EXTRA_BYTES..])
            .ok_or_else(|| IdbError::MalformedRecord("truncated record header".into()))?;

        let next_record_offset = resolve_next_offset(record_origin, header.next_offset, page_size);
        match header.rec_type {
            RecordType::Infimum => {
                return Ok(Record::System(SystemKind::Infimum, next_record_offset))
            }
            RecordType::Supremum => {
                return Ok(Record::System(SystemKind::Supremum, next_record_offset))
            }
            _ => {}
        }

        let is_leaf = self.page.is_leaf();
        let pk_count = self.table.pk_column_count();
        if pk_count > self.table.columns().len() {
            return Err(IdbError::SchemaMismatch(format!(
                "table declares {} primary-key column(s) but only {} column(s) total",
                pk_count,
                self.table.columns().len()
            )));
        }
        let cols: Vec<ColumnStorageInfo> = if is_leaf {
            self.table.columns().to_vec()
        } else {
            self.table.pk_columns().to_vec()
        };

        self.check_shape(&cols, is_leaf)?;

        let null_by_index = self.read_null_bitmap(data, record_origin, &cols, is_leaf)?;
        let lengths = self.read_var_len_array(data, record_origin, &cols, &null_by_index)?;

        // Seek to pk_pos and decode the PK columns forward.
        let mut pos = record_origin;
        let mut key = Vec::with_capacity(pk_count);
        for (i, col) in cols.iter().enumerate().take(pk_count) {
            let (value, consumed) =
                self.decode_one(store, data, pos, i, col, &null_by_index, &lengths)?;
            key.push(value);
            pos += consumed;
        }

        if is_leaf {
            pos += DATA_TRX_ID_LEN + DATA_ROLL_PTR_LEN;
            let mut values = Vec::new();
            for (i, col) in cols.iter().enumerate().skip(pk_count) {
                if col.is_system_column {
                    continue;
                }
                if null_by_index[i] {
                    values.push(FieldValue::Null);
                    continue;
                }
                let (value, consumed) =
                    self.decode_one(store, data, pos, i, col, &null_by_index, &lengths)?;
                values.push(value);
                pos += consumed;
            }
            Ok(Record::Leaf(LeafRecord {
                key,
                values,
                next_record_offset,
            }))
        } else {
            if pos + 4 > page_size {
                return Err(IdbError::MalformedRecord(
                    "node pointer child page number truncated".into(),
                ));
            }
            let child_page_number = BigEndian::read_u32(&data[pos..pos + 4]);
            Ok(Record::NodePtr(NodePtrRecord {
                key,
                child_page_number,
                next_record_offset,
            }))
        }
    }

    /// Confirms the table's declared column layout can actually back the
    /// byte offsets this decoder is about to compute: a leaf page's row
    /// must carry the `DB_TRX_ID`/`DB_ROLL_PTR` system columns immediately
    /// after the primary key. A `TableDef` that disagrees with the row's
    /// real shape is fatal — there is no well-defined way to decode further.
    fn check_shape(&self, cols: &[ColumnStorageInfo], is_leaf: bool) -> Result<(), IdbError> {
        let pk_count = self.table.pk_column_count();
        if is_leaf {
            if cols.len() < pk_count + 2 {
                return Err(IdbError::SchemaMismatch(format!(
                    "leaf row expects DB_TRX_ID/DB_ROLL_PTR after {} primary-key column(s) but table has only {} column(s)",
                    pk_count,
                    cols.len()
                )));
            }
            if !cols[pk_count].is_system_column || !cols[pk_count + 1].is_system_column {
                return Err(IdbError::SchemaMismatch(
                    "expected DB_TRX_ID/DB_ROLL_PTR system columns immediately after the primary key"
                        .into(),
                ));
            }
        }
        Ok(())
    }

    /// Null bitmap: one bit per nullable column, little-endian across bytes,
    /// stored immediately before the record's 5-byte extra header. Non-leaf
    /// pages carry no null bitmap — every PK column is non-null there.
    fn read_null_bitmap(
        &self,
        data: &[u8],
        record_origin: usize,
        cols: &[ColumnStorageInfo],
        is_leaf: bool,
    ) -> Result<Vec<bool>, IdbError> {
        let mut null_by_index = vec![false; cols.len()];
        if !is_leaf {
            return Ok(null_by_index);
        }

        let nullable_count = cols.iter().filter(|c| c.is_nullable).count();
        let null_bytes = nullable_count.div_ceil(8);
        if null_bytes == 0 {
            return Ok(null_by_index);
        }

        let bitmap_end = record_origin - REC_N_NEW_EXTRA_BYTES;
        if bitmap_end < null_bytes {
            return Err(IdbError::MalformedRecord(
                "null bitmap underflows page start".into(),
            ));
        }
        let bitmap = &data[bitmap_end - null_bytes..bitmap_end];

        let mut nullable_idx = 0usize;
        for (i, col) in cols.iter().enumerate() {
            if col.is_nullable {
                let byte = bitmap[nullable_idx / 8];
                let bit = nullable_idx % 8;
                null_by_index[i] = (byte & (1 << bit)) != 0;
                nullable_idx += 1;
            }
        }
        Ok(null_by_index)
    }

    /// Variable-length column lengths, walked in reverse schema order,
    /// reading backward from the byte immediately before the null bitmap.
    /// Non-leaf pages only carry lengths for the PK's variable-length subset.
    fn read_var_len_array(
        &self,
        data: &[u8],
        record_origin: usize,
        cols: &[ColumnStorageInfo],
        null_by_index: &[bool],
    ) -> Result<HashMap<usize, (usize, bool)>, IdbError> {
        let is_leaf = self.page.is_leaf();
        let nullable_count = if is_leaf {
            cols.iter().filter(|c| c.is_nullable).count()
        } else {
            0
        };
        let null_bytes = if is_leaf { nullable_count.div_ceil(8) } else { 0 };

        let varlen_positions: Vec<usize> = cols
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_variable)
            .map(|(i, _)| i)
            .collect();

        let mut cursor = record_origin - REC_N_NEW_EXTRA_BYTES - null_bytes;
        let mut lengths = HashMap::new();
        for &i in varlen_positions.iter().rev() {
            if null_by_index[i] {
                continue;
            }
            let col = &cols[i];
            if cursor < 1 {
                return Err(IdbError::MalformedRecord(
                    "variable-length array underflows page start".into(),
                ));
            }
            let first_byte = data[cursor - 1];
            let needs_two =
                first_byte > 127 && (col.is_blob_family() || col.declared_max_bytes() > 255);
            if needs_two {
                if cursor < 2 {
                    return Err(IdbError::MalformedRecord(
                        "variable-length array underflows page start".into(),
                    ));
                }
                let second_byte = data[cursor - 2];
                let external = (first_byte & 0x40) != 0;
                let length = (((first_byte & 0x3F) as usize) << 8) | second_byte as usize;
                lengths.insert(i, (length, external));
                cursor -= 2;
            } else {
                lengths.insert(i, (first_byte as usize, false));
                cursor -= 1;
            }
        }
        Ok(lengths)
    }

    #[allow(clippy::too_many_arguments)]
    fn decode_one<S: PageStore>(
        &self,
        store: &mut S,
        data: &[u8],
        pos: usize,
        col_index: usize,
        col: &ColumnStorageInfo,
        null_by_index: &[bool],
        lengths: &HashMap<usize, (usize, bool)>,
    ) -> Result<(FieldValue, usize), IdbError> {
        if null_by_index[col_index] {
            return Ok((FieldValue::Null, 0));
        }

        if !col.is_variable {
            if pos + col.fixed_len > data.len() {
                return Err(IdbError::MalformedRecord(format!(
                    "column {} overruns page bounds",
                    col.name
                )));
            }
            return Ok((decode_field(&data[pos..pos + col.fixed_len], col), col.fixed_len));
        }

        let (length, external) = lengths.get(&col_index).copied().unwrap_or((0, false));
        if external {
            return self.decode_overflow_column(store, data, pos, col);
        }
        if pos + length > data.len() {
            return Err(IdbError::MalformedRecord(format!(
                "column {} overruns page bounds",
                col.name
            )));
        }
        let value = if col.is_blob_family() {
            decode_hex(&data[pos..pos + length])
        } else {
            decode_string(&data[pos..pos + length])
        };
        Ok((value, length))
    }

    /// Read the 768-byte on-page prefix and 20-byte overflow pointer, then
    /// assemble the full value by walking the linked BLOB page chain.
    fn decode_overflow_column<S: PageStore>(
        &self,
        store: &mut S,
        data: &[u8],
        pos: usize,
        col: &ColumnStorageInfo,
    ) -> Result<(FieldValue, usize), IdbError> {
        let consumed = REC_ANTELOPE_MAX_INDEX_COL_LEN + BTR_EXTERN_FIELD_REF_SIZE;
        if pos + consumed > data.len() {
            return Err(IdbError::MalformedRecord(format!(
                "overflow column {} truncated on page",
                col.name
            )));
        }
        let prefix = &data[pos..pos + REC_ANTELOPE_MAX_INDEX_COL_LEN];
        let ptr_bytes = &data[pos + REC_ANTELOPE_MAX_INDEX_COL_LEN..pos + consumed];
        let pointer = OverflowPagePointer::parse(ptr_bytes)
            .ok_or_else(|| IdbError::MalformedRecord("truncated overflow pointer".into()))?;

        let chain_result = walk_blob_chain(store, pointer.page_number, MAX_BLOB_CHAIN_PAGES);
        let assembled = match chain_result {
            Ok(chunks) => {
                let mut full = Vec::with_capacity(prefix.len() + chunks.len());
                full.extend_from_slice(prefix);
                full.extend_from_slice(&chunks);
                full
            }
            Err(IdbError::UnsupportedLobFormat(msg)) => {
                if self.config.throw_on_unsupported_new_lob {
                    return Err(IdbError::UnsupportedLobFormat(msg));
                }
                return Ok((FieldValue::Null, consumed));
            }
            Err(e) => return Err(e),
        };

        let value = if col.is_blob_family() && !is_text_like(col) {
            decode_hex(&assembled)
        } else {
            decode_string(&assembled)
        };
        Ok((value, consumed))
    }
}

/// Whether a BLOB-family column should be treated as text rather than raw
/// binary, based on its declared charset width (binary columns report 1).
fn is_text_like(col: &ColumnStorageInfo) -> bool {
    col.charset_max_bytes > 1
}

fn resolve_next_offset(record_origin: usize, signed_next: i16, page_size: usize) -> usize {
    let raw = record_origin as i64 + signed_next as i64;
    raw.rem_euclid(page_size as i64) as usize
}

//! The `TableDef` collaborator: column layout and primary-key shape.

use crate::innodb::field_decode::{build_column_layout, ColumnStorageInfo};
use crate::innodb::schema::DdTable;

/// Describes a table's physical column layout to the query core: the
/// ordered column list (primary key first, then `DB_TRX_ID`/`DB_ROLL_PTR`,
/// then the rest), which leading columns form the primary key, and charset
/// sizing needed for worst-case buffer math.
pub trait TableDef {
    /// All columns in physical storage order.
    fn columns(&self) -> &[ColumnStorageInfo];

    /// Number of leading `columns()` entries that make up the primary key.
    fn pk_column_count(&self) -> usize;

    /// Whether this table has a user-defined primary key. When `false`, the
    /// clustered index key is the internal 6-byte `DB_ROW_ID` column, which
    /// `columns()` still includes as the sole PK column.
    fn has_user_pk(&self) -> bool;

    /// Maximum bytes per character across this table's columns.
    fn max_bytes_per_char(&self) -> usize;

    /// The primary-key columns, in order. Clamped to `columns().len()` so a
    /// `TableDef` whose declared PK count disagrees with its column list
    /// cannot panic here; callers that need to treat the disagreement as
    /// fatal check it explicitly (see `RecordDecoder::decode`).
    fn pk_columns(&self) -> &[ColumnStorageInfo] {
        &self.columns()[..self.pk_column_count().min(self.columns().len())]
    }

    /// Non-PK, non-system payload columns, in schema order.
    fn value_columns(&self) -> Vec<&ColumnStorageInfo> {
        self.columns()
            .iter()
            .skip(self.pk_column_count())
            .filter(|c| !c.is_system_column)
            .collect()
    }

    /// All nullable columns, in the order they appear in `columns()`.
    fn nullable_columns(&self) -> Vec<&ColumnStorageInfo> {
        self.columns().iter().filter(|c| c.is_nullable).collect()
    }

    /// All variable-length columns, in the order they appear in `columns()`.
    fn variable_length_columns(&self) -> Vec<&ColumnStorageInfo> {
        self.columns().iter().filter(|c| c.is_variable).collect()
    }

    /// The subset of `variable_length_columns()` that fall within the
    /// primary key — the only ones a non-leaf (node-pointer) record stores.
    fn pk_variable_length_columns(&self) -> Vec<&ColumnStorageInfo> {
        let pk_count = self.pk_column_count();
        self.columns()
            .iter()
            .enumerate()
            .filter(|(i, c)| *i < pk_count && c.is_variable)
            .map(|(_, c)| c)
            .collect()
    }
}

/// A `TableDef` built from a parsed SDI [`DdTable`].
pub struct SdiTableDef {
    columns: Vec<ColumnStorageInfo>,
    pk_column_count: usize,
    has_user_pk: bool,
    max_bytes_per_char: usize,
}

impl SdiTableDef {
    /// Build a `TableDef` from a table's embedded dictionary definition.
    ///
    /// When the table has no user-defined `PRIMARY` index, InnoDB's
    /// internal 6-byte `DB_ROW_ID` column is prepended as the sole PK
    /// column, matching how the clustered index is actually keyed on disk.
    pub fn from_dd_table(dd_table: &DdTable) -> Self {
        let mut columns = build_column_layout(dd_table);

        let primary_idx = dd_table.indexes.iter().find(|i| i.index_type == 1);
        let has_user_pk = primary_idx
            .map(|i| i.elements.iter().any(|e| !e.hidden))
            .unwrap_or(false);

        let pk_column_count = if has_user_pk {
            primary_idx
                .unwrap()
                .elements
                .iter()
                .filter(|e| !e.hidden)
                .count()
        } else {
            columns.insert(0, row_id_column());
            1
        };

        let max_bytes_per_char = columns.iter().map(|c| c.max_byte_width()).max().unwrap_or(1);

        SdiTableDef {
            columns,
            pk_column_count,
            has_user_pk,
            max_bytes_per_char,
        }
    }
}

impl TableDef for SdiTableDef {
    fn columns(&self) -> &[ColumnStorageInfo] {
        &self.columns
    }

    fn pk_column_count(&self) -> usize {
        self.pk_column_count
    }

    fn has_user_pk(&self) -> bool {
        self.has_user_pk
    }

    fn max_bytes_per_char(&self) -> usize {
        self.max_bytes_per_char
    }
}

fn row_id_column() -> ColumnStorageInfo {
    ColumnStorageInfo {
        name: "DB_ROW_ID".to_string(),
        dd_type: 0,
        column_type: "system".to_string(),
        is_nullable: false,
        is_unsigned: true,
        fixed_len: 6,
        is_variable: false,
        charset_max_bytes: 0,
        datetime_precision: 0,
        is_system_column: true,
        declared_max_length: 6,
    }
}

fn system_column(name: &str, fixed_len: usize) -> ColumnStorageInfo {
    ColumnStorageInfo {
        name: name.to_string(),
        dd_type: 0,
        column_type: "system".to_string(),
        is_nullable: false,
        is_unsigned: true,
        fixed_len,
        is_variable: false,
        charset_max_bytes: 0,
        datetime_precision: 0,
        is_system_column: true,
        declared_max_length: fixed_len,
    }
}

/// An in-memory `TableDef` fixture, for tests and callers that already know
/// their column layout without reading SDI.
pub struct StaticTableDef {
    columns: Vec<ColumnStorageInfo>,
    pk_column_count: usize,
    has_user_pk: bool,
    max_bytes_per_char: usize,
}

impl StaticTableDef {
    /// Build a `TableDef` from an explicit column layout.
    ///
    /// `columns` must already be in physical storage order: PK columns
    /// first, then `DB_TRX_ID`/`DB_ROLL_PTR`, then the rest.
    pub fn new(columns: Vec<ColumnStorageInfo>, pk_column_count: usize, has_user_pk: bool) -> Self {
        let max_bytes_per_char = columns.iter().map(|c| c.max_byte_width()).max().unwrap_or(1);
        StaticTableDef {
            columns,
            pk_column_count,
            has_user_pk,
            max_bytes_per_char,
        }
    }

    /// A single-column `INT` primary key table, with the usual
    /// `DB_TRX_ID`/`DB_ROLL_PTR` system columns and no other payload.
    pub fn int_primary_key(name: &str) -> Self {
        let pk = ColumnStorageInfo {
            name: name.to_string(),
            dd_type: 4, // DD_TYPE_LONG
            column_type: "int".to_string(),
            is_nullable: false,
            is_unsigned: false,
            fixed_len: 4,
            is_variable: false,
            charset_max_bytes: 0,
            datetime_precision: 0,
            is_system_column: false,
            declared_max_length: 0,
        };
        Self::new(
            vec![pk, system_column("DB_TRX_ID", 6), system_column("DB_ROLL_PTR", 7)],
            1,
            true,
        )
    }
}

impl TableDef for StaticTableDef {
    fn columns(&self) -> &[ColumnStorageInfo] {
        &self.columns
    }

    fn pk_column_count(&self) -> usize {
        self.pk_column_count
    }

    fn has_user_pk(&self) -> bool {
        self.has_user_pk
    }

    fn max_bytes_per_char(&self) -> usize {
        self.max_bytes_per_char
    }
}

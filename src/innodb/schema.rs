//! SDI (Serialized Dictionary Information) JSON deserialization structs.
//!
//! MySQL 8.0+ embeds a complete table definition (columns, indexes, foreign
//! keys) as SDI JSON inside every `.ibd` file. This module parses that JSON
//! into typed Rust structs; [`crate::table_def::SdiTableDef`] adapts a parsed
//! [`DdTable`] to the [`crate::table_def::TableDef`] collaborator the query
//! engine depends on.

use serde::Deserialize;

/// Top-level SDI envelope wrapping a dd_object.
#[derive(Debug, Default, Deserialize)]
pub struct SdiEnvelope {
    /// MySQL server version ID (e.g., 90001 for 9.0.1).
    #[serde(default)]
    pub mysqld_version_id: u64,
    /// Object type: "Table" or "Tablespace".
    #[serde(default)]
    pub dd_object_type: String,
    /// The data dictionary object.
    #[serde(default)]
    pub dd_object: DdTable,
}

/// Data dictionary table definition.
#[derive(Debug, Default, Deserialize)]
pub struct DdTable {
    /// Table name.
    #[serde(default)]
    pub name: String,
    /// Schema (database) name.
    #[serde(default)]
    pub schema_ref: String,
    /// Storage engine name.
    #[serde(default)]
    pub engine: String,
    /// Default collation ID.
    #[serde(default)]
    pub collation_id: u64,
    /// Row format code (1=FIXED, 2=DYNAMIC, 3=COMPRESSED, etc.).
    #[serde(default)]
    pub row_format: u64,
    /// Table comment.
    #[serde(default)]
    pub comment: String,
    /// Column definitions.
    #[serde(default)]
    pub columns: Vec<DdColumn>,
    /// Index definitions.
    #[serde(default)]
    pub indexes: Vec<DdIndex>,
    /// Foreign key definitions.
    #[serde(default)]
    pub foreign_keys: Vec<DdForeignKey>,
    /// MySQL server version ID.
    #[serde(default)]
    pub mysql_version_id: u64,
    /// Table hidden flag (1=visible for tables).
    #[serde(default)]
    pub hidden: u64,
}

/// Data dictionary column definition.
#[derive(Debug, Default, Deserialize)]
pub struct DdColumn {
    /// Column name.
    #[serde(default)]
    pub name: String,
    /// dd_type code (internal MySQL type enumeration).
    #[serde(rename = "type", default)]
    pub dd_type: u64,
    /// SQL type string from MySQL (e.g., "varchar(255)", "int unsigned").
    #[serde(default)]
    pub column_type_utf8: String,
    /// Position in the column list (1-based).
    #[serde(default)]
    pub ordinal_position: u64,
    /// Hidden flag: 1=visible, 2=SE-hidden (DB_TRX_ID, DB_ROLL_PTR, DB_ROW_ID).
    #[serde(default)]
    pub hidden: u64,
    /// Whether the column allows NULL.
    #[serde(default)]
    pub is_nullable: bool,
    /// Whether the column is unsigned.
    #[serde(default)]
    pub is_unsigned: bool,
    /// Whether the column is AUTO_INCREMENT.
    #[serde(default)]
    pub is_auto_increment: bool,
    /// Whether the column is virtual (generated).
    #[serde(default)]
    pub is_virtual: bool,
    /// Character length.
    #[serde(default)]
    pub char_length: u64,
    /// Numeric precision.
    #[serde(default)]
    pub numeric_precision: u64,
    /// Numeric scale.
    #[serde(default)]
    pub numeric_scale: u64,
    /// Datetime fractional seconds precision.
    #[serde(default)]
    pub datetime_precision: u64,
    /// Collation ID for this column.
    #[serde(default)]
    pub collation_id: u64,
    /// Default value as UTF-8 string.
    #[serde(default)]
    pub default_value_utf8: String,
    /// Whether default_value_utf8 is NULL.
    #[serde(default)]
    pub default_value_utf8_null: bool,
    /// Whether the column has no default.
    #[serde(default)]
    pub has_no_default: bool,
    /// Default option (e.g., "CURRENT_TIMESTAMP").
    #[serde(default)]
    pub default_option: String,
    /// Update option (e.g., "CURRENT_TIMESTAMP").
    #[serde(default)]
    pub update_option: String,
    /// Generation expression (raw).
    #[serde(default)]
    pub generation_expression: String,
    /// Generation expression as UTF-8.
    #[serde(default)]
    pub generation_expression_utf8: String,
    /// ENUM/SET value elements.
    #[serde(default)]
    pub elements: Vec<DdColumnElement>,
    /// Column comment.
    #[serde(default)]
    pub comment: String,
    /// Whether the column is zerofill.
    #[serde(default)]
    pub is_zerofill: bool,
}

/// ENUM or SET value element.
#[derive(Debug, Default, Deserialize)]
pub struct DdColumnElement {
    /// The element name (value string).
    #[serde(default)]
    pub name: String,
}

/// Data dictionary index definition.
#[derive(Debug, Default, Deserialize)]
pub struct DdIndex {
    /// Index name.
    #[serde(default)]
    pub name: String,
    /// Index type: 1=PRIMARY, 2=UNIQUE, 3=MULTIPLE (non-unique), 4=FULLTEXT, 5=SPATIAL.
    #[serde(rename = "type", default)]
    pub index_type: u64,
    /// Algorithm code (1=BTREE default, 2=BTREE explicit, 3=HASH, 4=RTREE, 5=FULLTEXT).
    #[serde(default)]
    pub algorithm: u64,
    /// Whether the index is hidden.
    #[serde(default)]
    pub hidden: bool,
    /// Index elements (columns).
    #[serde(default)]
    pub elements: Vec<DdIndexElement>,
    /// Index comment.
    #[serde(default)]
    pub comment: String,
    /// Whether the index is visible.
    #[serde(default)]
    pub is_visible: bool,
}

/// Data dictionary index element (column reference).
#[derive(Debug, Default, Deserialize)]
pub struct DdIndexElement {
    /// 0-based index into the columns array.
    #[serde(default)]
    pub column_opx: u64,
    /// Prefix length (4294967295 = full column).
    #[serde(default)]
    pub length: u64,
    /// Sort order: 2=ASC, 1=DESC.
    #[serde(default)]
    pub order: u64,
    /// Whether this element is hidden (internal).
    #[serde(default)]
    pub hidden: bool,
}

/// Data dictionary foreign key definition.
#[derive(Debug, Default, Deserialize)]
pub struct DdForeignKey {
    /// Constraint name.
    #[serde(default)]
    pub name: String,
    /// Referenced table's schema name.
    #[serde(default)]
    pub referenced_table_schema_name: String,
    /// Referenced table name.
    #[serde(default)]
    pub referenced_table_name: String,
    /// ON UPDATE rule (0=NO ACTION, 1=RESTRICT, 2=CASCADE, 3=SET NULL, 4=SET DEFAULT).
    #[serde(default)]
    pub update_rule: u64,
    /// ON DELETE rule (same codes as update_rule).
    #[serde(default)]
    pub delete_rule: u64,
    /// Foreign key elements (column mappings).
    #[serde(default)]
    pub elements: Vec<DdForeignKeyElement>,
}

/// Data dictionary foreign key element (column mapping).
#[derive(Debug, Default, Deserialize)]
pub struct DdForeignKeyElement {
    /// 0-based index into the table's columns array.
    #[serde(default)]
    pub column_opx: u64,
    /// Name of the referenced column.
    #[serde(default)]
    pub referenced_column_name: String,
}

/// Map collation ID to its name, for the collations this crate recognizes.
///
/// # Examples
///
/// ```
/// use idb::innodb::schema::collation_name;
///
/// assert_eq!(collation_name(255), Some("utf8mb4_0900_ai_ci"));
/// assert_eq!(collation_name(63), Some("binary"));
/// assert_eq!(collation_name(99999), None);
/// ```
pub fn collation_name(id: u64) -> Option<&'static str> {
    match id {
        2 => Some("latin1_swedish_ci"),
        8 => Some("latin1_swedish_ci"),
        11 => Some("ascii_general_ci"),
        33 => Some("utf8mb3_general_ci"),
        45 => Some("utf8mb4_general_ci"),
        46 => Some("utf8mb4_bin"),
        47 => Some("latin1_bin"),
        48 => Some("latin1_general_ci"),
        63 => Some("binary"),
        83 => Some("utf8mb3_bin"),
        224 => Some("utf8mb4_unicode_ci"),
        255 => Some("utf8mb4_0900_ai_ci"),
        _ => None,
    }
}

/// Map collation ID to character set name.
///
/// # Examples
///
/// ```
/// use idb::innodb::schema::charset_from_collation;
///
/// assert_eq!(charset_from_collation(255), Some("utf8mb4"));
/// assert_eq!(charset_from_collation(63), Some("binary"));
/// assert_eq!(charset_from_collation(8), Some("latin1"));
/// assert_eq!(charset_from_collation(99999), None);
/// ```
pub fn charset_from_collation(id: u64) -> Option<&'static str> {
    match id {
        2 | 8 | 47 | 48 => Some("latin1"),
        11 => Some("ascii"),
        33 | 83 => Some("utf8mb3"),
        45 | 46 | 224 | 255 => Some("utf8mb4"),
        63 => Some("binary"),
        _ => None,
    }
}

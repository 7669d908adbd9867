//! `idxq` binary plumbing: argument parsing (`app`) and subcommand execution
//! (`lookup`, `range`).

pub mod app;
pub mod lookup;
pub mod range;

use crate::innodb::field_decode::FieldValue;
use crate::innodb::record_decoder::LeafRecord;
use crate::innodb::sdi::{extract_sdi_from_pages, find_sdi_pages};
use crate::innodb::tablespace::Tablespace;
use crate::table_def::{SdiTableDef, TableDef};
use crate::IdbError;

/// Locate the SDI record for `table_id` and build a `TableDef` from it.
pub fn load_table_def(ts: &mut Tablespace, table_id: u64) -> Result<SdiTableDef, IdbError> {
    let sdi_pages = find_sdi_pages(ts)?;
    let records = extract_sdi_from_pages(ts, &sdi_pages)?;

    let record = records
        .iter()
        .find(|r| r.sdi_type == 1 && r.sdi_id == table_id)
        .ok_or_else(|| {
            IdbError::Argument(format!("no table SDI record found for table-id {}", table_id))
        })?;

    let envelope: crate::innodb::schema::SdiEnvelope = serde_json::from_str(&record.data)
        .map_err(|e| IdbError::Parse(format!("invalid SDI JSON for table-id {}: {}", table_id, e)))?;

    Ok(SdiTableDef::from_dd_table(&envelope.dd_object))
}

/// Parse one CLI key component into a `FieldValue`. Tries a signed integer
/// first, falling back to a string, matching how most primary keys in
/// practice are either integral or textual.
pub fn parse_key_component(raw: &str) -> FieldValue {
    match raw.parse::<i64>() {
        Ok(v) => FieldValue::Int(v),
        Err(_) => FieldValue::Str(raw.to_string()),
    }
}

pub fn parse_key(raw: &[String]) -> Vec<FieldValue> {
    raw.iter().map(|s| parse_key_component(s)).collect()
}

/// Column names in display order: primary key first, then value columns.
pub struct ColumnNames {
    pub pk: Vec<String>,
    pub values: Vec<String>,
}

impl ColumnNames {
    pub fn from_table<T: TableDef>(table: &T) -> Self {
        ColumnNames {
            pk: table.pk_columns().iter().map(|c| c.name.clone()).collect(),
            values: table.value_columns().iter().map(|c| c.name.clone()).collect(),
        }
    }
}

/// Print one row as `col=value, col=value, ...`, matching `names`' order.
pub fn print_record(names: &ColumnNames, rec: &LeafRecord) {
    let mut parts = Vec::new();
    for (name, val) in names.pk.iter().zip(rec.key.iter()) {
        parts.push(format!("{}={}", name, format_value(val)));
    }
    for (name, val) in names.values.iter().zip(rec.values.iter()) {
        parts.push(format!("{}={}", name, format_value(val)));
    }
    println!("{}", parts.join(", "));
}

fn format_value(val: &FieldValue) -> String {
    match val {
        FieldValue::Null => "NULL".to_string(),
        FieldValue::Int(v) => v.to_string(),
        FieldValue::Uint(v) => v.to_string(),
        FieldValue::Float(v) => v.to_string(),
        FieldValue::Double(v) => v.to_string(),
        FieldValue::Str(v) => v.clone(),
        FieldValue::Hex(v) => v.clone(),
    }
}

//! InnoDB on-disk format parsing: pages, records, schema metadata.

pub mod constants;
pub mod field_decode;
pub mod index;
pub mod index_page;
pub mod lob;
pub mod page;
pub mod page_types;
pub mod record;
pub mod record_decoder;
pub mod schema;
pub mod sdi;
pub mod tablespace;

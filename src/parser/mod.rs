// src/parser/mod.rs
pub mod action;
pub mod alias;
pub mod fields;
pub mod io;
pub mod tables;

pub use action::ParseAction;
pub use alias::{AliasGroup, AliasMap, AliasSequences};
pub use fields::{FieldMap, FieldMapEntry, FieldMapSlice};
pub use io::{
    load_parse_table_bin_bytes,
    load_parse_table_json_bytes,
    parse_table_to_bin,
    save_parse_table_bin,
    save_parse_table_json,
};
pub use tables::{ActionList, ActionListHeader, ActionTable, ParseTable, ParseTableBuilder};

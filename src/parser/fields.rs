// src/parser/fields.rs
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::symbol::FieldId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapEntry {
    pub field_id: FieldId,
    /// 0-based position among the production's children.
    pub child_index: u8,
    /// Promoted from a hidden child rather than declared on the production.
    pub inherited: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapSlice {
    pub index: u16,
    pub length: u16,
}

/// Field names of every production's children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    /// One slice per production id.
    pub slices: Vec<FieldMapSlice>,
    pub entries: Vec<FieldMapEntry>,
}

impl FieldMap {
    /// Empty slice when the production has no named children.
    pub fn fields_for(&self, production_id: u16) -> &[FieldMapEntry] {
        let Some(slice) = self.slices.get(production_id as usize) else {
            return &[];
        };
        let start = slice.index as usize;
        self.entries
            .get(start..start + slice.length as usize)
            .unwrap_or(&[])
    }

    /// Entries of one production that carry `field_id`.
    pub fn children_for_field(
        &self,
        production_id: u16,
        field_id: FieldId,
    ) -> impl Iterator<Item = &FieldMapEntry> + '_ {
        self.fields_for(production_id)
            .iter()
            .filter(move |e| e.field_id == field_id)
    }

    pub fn validate(&self, production_id_count: u32, field_count: u32) -> Result<()> {
        ensure!(
            self.slices.is_empty() || self.slices.len() == production_id_count as usize,
            "field map has {} slices for {} productions",
            self.slices.len(),
            production_id_count
        );
        for (p, s) in self.slices.iter().enumerate() {
            ensure!(
                s.index as usize + s.length as usize <= self.entries.len(),
                "field slice of production {p} runs past the entries"
            );
        }
        for e in &self.entries {
            ensure!(
                e.field_id >= 1 && e.field_id as u32 <= field_count,
                "field map entry names unknown field {}",
                e.field_id
            );
        }
        Ok(())
    }
}

//! The untyped three-section document produced by the parser.

use super::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered key/value pairs of one section.
pub type Section = BTreeMap<String, Value>;

pub const HEADER: &str = "header";
pub const DATA: &str = "data";
pub const FOOTER: &str = "footer";

/// A parsed chainlexeme document.
///
/// `extra_sections` holds any bracketed section other than the three
/// transaction sections. `modules` holds the verbatim body lines of
/// `aln_module "name" { ... }` blocks; the ledger never reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub header: Section,
    pub data: Section,
    pub footer: Section,
    pub extra_sections: BTreeMap<String, Section>,
    pub modules: BTreeMap<String, Vec<String>>,
    /// Parser diagnostics. Non-empty whenever some input was not understood.
    pub diagnostics: Vec<String>,
}

impl ParsedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a named section, including the three transaction sections.
    pub fn section(&self, name: &str) -> Option<&Section> {
        match name {
            HEADER => Some(&self.header),
            DATA => Some(&self.data),
            FOOTER => Some(&self.footer),
            other => self.extra_sections.get(other),
        }
    }

    pub(crate) fn section_mut(&mut self, name: &str) -> &mut Section {
        match name {
            HEADER => &mut self.header,
            DATA => &mut self.data,
            FOOTER => &mut self.footer,
            other => self.extra_sections.entry(other.to_string()).or_default(),
        }
    }

    /// True when no section holds any field.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
            && self.data.is_empty()
            && self.footer.is_empty()
            && self.extra_sections.values().all(|s| s.is_empty())
    }
}

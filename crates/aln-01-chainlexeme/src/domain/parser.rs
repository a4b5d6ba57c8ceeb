//! Line-oriented chainlexeme parser.
//!
//! ```text
//! # comment
//! [header]
//! op_code: transfer
//! from: aln1alice
//!
//! aln_module "policy" {
//!   require: kyc
//! }
//! ```

use super::document::ParsedDocument;
use super::value::Value;

const MODULE_KEYWORD: &str = "aln_module";

/// Parse chainlexeme text.
///
/// Never fails: anything not understood is reported through
/// [`ParsedDocument::diagnostics`] and the affected line is skipped.
pub fn parse(text: &str) -> ParsedDocument {
    let mut doc = ParsedDocument::new();
    let mut current_section: Option<String> = None;
    let mut current_module: Option<(String, usize)> = None;
    let mut saw_section = false;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        if let Some((name, _)) = &current_module {
            if line == "}" {
                current_module = None;
            } else {
                doc.modules
                    .entry(name.clone())
                    .or_default()
                    .push(line.to_string());
            }
            continue;
        }

        if is_module_declaration(line) {
            match module_name(line) {
                Some(name) => {
                    doc.modules.entry(name.clone()).or_default();
                    current_module = Some((name, line_no));
                }
                None => doc
                    .diagnostics
                    .push(format!("line {}: malformed module declaration", line_no)),
            }
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim().to_lowercase();
            if name.is_empty() {
                doc.diagnostics
                    .push(format!("line {}: empty section name", line_no));
                current_section = None;
            } else {
                doc.section_mut(&name);
                current_section = Some(name);
                saw_section = true;
            }
            continue;
        }

        let Some((key, raw_value)) = line.split_once(':') else {
            doc.diagnostics
                .push(format!("line {}: expected `key: value`", line_no));
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            doc.diagnostics
                .push(format!("line {}: missing key before ':'", line_no));
            continue;
        }

        let Some(section) = current_section.as_deref() else {
            doc.diagnostics
                .push(format!("line {}: field `{}` outside any section", line_no, key));
            continue;
        };

        let previous = doc
            .section_mut(section)
            .insert(key.to_string(), Value::parse(raw_value));
        if previous.is_some() {
            doc.diagnostics.push(format!(
                "line {}: duplicate key `{}` in [{}], last value kept",
                line_no, key, section
            ));
        }
    }

    if let Some((name, line_no)) = current_module {
        doc.diagnostics.push(format!(
            "line {}: module `{}` is never closed",
            line_no, name
        ));
    }

    if !saw_section {
        doc.diagnostics
            .push("document contains no sections".to_string());
    }

    doc
}

/// The keyword must stand alone, so keys such as `aln_module_ref` stay fields.
fn is_module_declaration(line: &str) -> bool {
    line.strip_prefix(MODULE_KEYWORD)
        .and_then(|rest| rest.chars().next())
        .map_or(false, char::is_whitespace)
}

/// Extract `name` from `aln_module "name" {`.
fn module_name(line: &str) -> Option<String> {
    let rest = line[MODULE_KEYWORD.len()..].trim();
    let rest = rest.strip_suffix('{')?.trim();
    let name = rest.strip_prefix('"')?.strip_suffix('"')?;
    if name.is_empty() || name.contains('"') {
        return None;
    }
    Some(name.to_string())
}

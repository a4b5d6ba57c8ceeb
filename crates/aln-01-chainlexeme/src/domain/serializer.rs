//! Formatting inverse of the parser.

use super::document::{ParsedDocument, Section, DATA, FOOTER, HEADER};
use std::fmt::Write;

/// Render a document as chainlexeme text.
///
/// The output parses back to the same sections and values. Layout and
/// comments of the original text are not preserved.
pub fn serialize(doc: &ParsedDocument) -> String {
    let mut out = String::new();

    for (name, section) in [(HEADER, &doc.header), (DATA, &doc.data), (FOOTER, &doc.footer)] {
        write_section(&mut out, name, section);
    }
    for (name, section) in &doc.extra_sections {
        write_section(&mut out, name, section);
    }
    for (name, lines) in &doc.modules {
        let _ = writeln!(out, "aln_module \"{}\" {{", name);
        for line in lines {
            let _ = writeln!(out, "  {}", line);
        }
        out.push_str("}\n\n");
    }

    out
}

/// Render one section, or nothing when it is empty.
pub fn serialize_section(name: &str, section: &Section) -> String {
    let mut out = String::new();
    write_section(&mut out, name, section);
    out
}

fn write_section(out: &mut String, name: &str, section: &Section) {
    if section.is_empty() {
        return;
    }
    let _ = writeln!(out, "[{}]", name);
    for (key, value) in section {
        let _ = writeln!(out, "{}: {}", key, value);
    }
    out.push('\n');
}

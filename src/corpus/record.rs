// DocumentRecord parsing — one delimited source line to id, primary text,
// and de-duplicated extra text.

use std::fmt;
use std::ops::Range;

/// Which fields of a delimited line hold the id, the primary text, and the
/// extra fields. `extra_fields` is half-open: `5..9` reads fields 5 to 8.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub delimiter: String,
    pub id_field: usize,
    pub primary_field: usize,
    pub extra_fields: Range<usize>,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            id_field: 0,
            primary_field: 4,
            extra_fields: 5..9,
        }
    }
}

impl FieldSpec {
    /// Highest field index read, plus one.
    pub fn required_fields(&self) -> usize {
        let mut needed = self.id_field.max(self.primary_field) + 1;
        if !self.extra_fields.is_empty() {
            needed = needed.max(self.extra_fields.end);
        }
        needed
    }
}

/// A parsed source line, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub primary_text: String,
    /// Unique extra values in first-seen order, joined by single spaces
    pub extra_text: String,
}

/// Why a line did not produce a record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordRejection {
    TooFewFields { needed: usize, found: usize },
    EmptyId,
    EmptyPrimary,
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRejection::TooFewFields { needed, found } => {
                write!(f, "expected at least {needed} fields, found {found}")
            }
            RecordRejection::EmptyId => write!(f, "empty document id"),
            RecordRejection::EmptyPrimary => write!(f, "empty primary field"),
        }
    }
}

/// Split `line` with `spec` and extract a record.
///
/// Values are trimmed. Extra values that repeat within the range are kept
/// once; blank extra values are dropped.
pub fn parse_record(line: &str, spec: &FieldSpec) -> Result<DocumentRecord, RecordRejection> {
    let values: Vec<&str> = line.split(spec.delimiter.as_str()).collect();

    let needed = spec.required_fields();
    if values.len() < needed {
        return Err(RecordRejection::TooFewFields {
            needed,
            found: values.len(),
        });
    }

    let id = values[spec.id_field].trim();
    if id.is_empty() {
        return Err(RecordRejection::EmptyId);
    }

    let primary_text = values[spec.primary_field].trim();
    if primary_text.is_empty() {
        return Err(RecordRejection::EmptyPrimary);
    }

    let mut extras: Vec<&str> = Vec::new();
    // An inverted range (`5..3`) counts as empty in required_fields, so
    // get() returns None here and the record has no extras
    for value in values.get(spec.extra_fields.clone()).unwrap_or(&[]) {
        let value = value.trim();
        if !value.is_empty() && !extras.contains(&value) {
            extras.push(value);
        }
    }

    Ok(DocumentRecord {
        id: id.to_string(),
        primary_text: primary_text.to_string(),
        extra_text: extras.join(" "),
    })
}

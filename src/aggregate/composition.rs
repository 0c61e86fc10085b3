// Topic-composition records — one document id plus its topic probabilities,
// and the rule that picks the document's topic.
//
// Line shape: `index<D>name<D>p0<D>p1...`. The name field is path-shaped:
// after stripping a fixed-length prefix, its last `/` segment minus a
// `.txt` suffix is the document id.

use anyhow::{Context, Result};

/// Topic number for documents with no usable probabilities.
pub const UNASSIGNED_TOPIC: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct TopicAssignmentRecord {
    pub document_id: String,
    /// The name field after prefix stripping (where the content file lives)
    pub source_path: String,
    pub topic_probabilities: Vec<f64>,
}

impl TopicAssignmentRecord {
    pub fn assigned_topic(&self) -> i32 {
        assigned_topic(&self.topic_probabilities)
    }
}

/// Index of the highest probability, first occurrence winning ties.
///
/// The running best starts at -1 and only a strictly greater value replaces
/// it, so an empty vector yields UNASSIGNED_TOPIC.
pub fn assigned_topic(probabilities: &[f64]) -> i32 {
    let mut best = -1.0f64;
    let mut topic = UNASSIGNED_TOPIC;
    for (i, &p) in probabilities.iter().enumerate() {
        if p > best {
            best = p;
            topic = i as i32;
        }
    }
    topic
}

/// Recover `(path, id)` from a name field: drop the first `prefix_len`
/// characters, take the last path segment, drop a `.txt` suffix.
pub fn document_id_from_name(name: &str, prefix_len: usize) -> Option<(String, String)> {
    let path: String = name.trim().chars().skip(prefix_len).collect();
    let segment = path.rsplit('/').next()?;
    let id = segment.strip_suffix(".txt").unwrap_or(segment);
    if id.is_empty() {
        return None;
    }
    Some((path.clone(), id.to_string()))
}

/// Parse one composition line. Errors mean the record should be skipped.
pub fn parse_composition_line(
    line: &str,
    delimiter: &str,
    prefix_len: usize,
) -> Result<TopicAssignmentRecord> {
    let values: Vec<&str> = line.split(delimiter).collect();
    if values.len() < 2 {
        anyhow::bail!("expected an index and a name field, found {} fields", values.len());
    }

    let (source_path, document_id) = document_id_from_name(values[1], prefix_len)
        .with_context(|| format!("no document id in name field {:?}", values[1]))?;

    let mut topic_probabilities = Vec::with_capacity(values.len() - 2);
    for (i, raw) in values[2..].iter().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let p: f64 = raw
            .parse()
            .with_context(|| format!("unparseable probability {raw:?} for topic {i}"))?;
        if !p.is_finite() {
            anyhow::bail!("non-finite probability {raw:?} for topic {i}");
        }
        topic_probabilities.push(p);
    }

    Ok(TopicAssignmentRecord {
        document_id,
        source_path,
        topic_probabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_topic_picks_maximum() {
        assert_eq!(assigned_topic(&[0.1, 0.7, 0.2]), 1);
    }

    #[test]
    fn test_assigned_topic_ties_go_to_first() {
        assert_eq!(assigned_topic(&[0.3, 0.3, 0.3]), 0);
        assert_eq!(assigned_topic(&[0.1, 0.45, 0.45]), 1);
    }

    #[test]
    fn test_assigned_topic_empty_is_unassigned() {
        assert_eq!(assigned_topic(&[]), UNASSIGNED_TOPIC);
    }

    #[test]
    fn test_document_id_from_prefixed_path() {
        let (path, id) = document_id_from_name("file:/data/docs/1234.txt", 6).unwrap();
        assert_eq!(path, "data/docs/1234.txt");
        assert_eq!(id, "1234");
    }

    #[test]
    fn test_document_id_from_bare_name() {
        let (path, id) = document_id_from_name("e-77", 0).unwrap();
        assert_eq!(path, "e-77");
        assert_eq!(id, "e-77");
        assert!(document_id_from_name("file:", 6).is_none());
    }

    #[test]
    fn test_parse_composition_line() {
        let record = parse_composition_line("3\t42\t0.1\t0.7\t0.2", "\t", 0).unwrap();
        assert_eq!(record.document_id, "42");
        assert_eq!(record.topic_probabilities, vec![0.1, 0.7, 0.2]);
        assert_eq!(record.assigned_topic(), 1);
    }

    #[test]
    fn test_parse_rejects_bad_probability() {
        assert!(parse_composition_line("0\t42\t0.1\tabc", "\t", 0).is_err());
        assert!(parse_composition_line("only-one-field", "\t", 0).is_err());
    }

    #[test]
    fn test_parse_rejects_non_finite_probability() {
        assert!(parse_composition_line("0\tdoc\tNaN\tinf", "\t", 0).is_err());
        assert!(parse_composition_line("0\tdoc\t0.2\tinfinity", "\t", 0).is_err());
        assert!(parse_composition_line("0\tdoc\t-inf\t0.2", "\t", 0).is_err());
    }

    #[test]
    fn test_parse_without_probabilities_is_unassigned() {
        let record = parse_composition_line("0,file:/x/9.txt", ",", 6).unwrap();
        assert_eq!(record.document_id, "9");
        assert_eq!(record.assigned_topic(), UNASSIGNED_TOPIC);
    }
}

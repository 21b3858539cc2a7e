//! # Model Persistence — Versioned JSON Record
//!
//! A model is stored as a JSON object:
//!
//! ```json
//! {
//!   "version": 1,
//!   "emission":   { "Dog": { "N": 1.0, "V": 9.9e-11 }, ... },
//!   "transition": { "<start>": { "N": 0.99, "V": 1e-10 }, "N": { ... }, ... },
//!   "tags": ["<start>", "N", "V"]
//! }
//! ```
//!
//! `tags` is the tag order the decoder enumerates, so it is written and read
//! back verbatim. Object keys are written in tag/word order and read in
//! document order ([`OrderedMap`]), which makes `save → load` reproduce the
//! same ids and the same tables bit for bit.
//!
//! Files without `version` (older tool output) are read as version 1. Those
//! files also carry a `<start>` column inside every row; it is ignored.

use std::fmt;
use std::io::{Read, Write};
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{HmmError, Result};
use crate::model::{HmmModel, Table, START_TAG};
use crate::vocab::Vocabulary;

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

fn legacy_version() -> u32 {
    FORMAT_VERSION
}

/// JSON object whose entries keep their document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry::<String, V>()? {
            entries.push(entry);
        }
        Ok(OrderedMap(entries))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Serialized form of an [`HmmModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(default = "legacy_version")]
    pub version: u32,
    /// word → tag → score
    pub emission: OrderedMap<OrderedMap<f64>>,
    /// previous tag (or `<start>`) → tag → probability
    pub transition: OrderedMap<OrderedMap<f64>>,
    /// Tag order, `<start>` included.
    pub tags: Vec<String>,
}

impl From<&HmmModel> for ModelRecord {
    fn from(model: &HmmModel) -> Self {
        let row = |values: &[f64]| {
            OrderedMap(
                model
                    .tags()
                    .iter()
                    .zip(values)
                    .map(|(tag, &v)| (tag.to_string(), v))
                    .collect(),
            )
        };

        let emission = model
            .words()
            .iter()
            .enumerate()
            .map(|(w, word)| (word.to_string(), row(model.emission_row(w))))
            .collect();

        let transition = model
            .tag_order()
            .into_iter()
            .map(|tag| {
                let values = match model.tag_id(tag) {
                    Some(t) => model.transition_row(t),
                    None => model.start_transition_row(),
                };
                (tag.to_string(), row(values))
            })
            .collect();

        Self {
            version: FORMAT_VERSION,
            emission: OrderedMap(emission),
            transition: OrderedMap(transition),
            tags: model.tag_order().into_iter().map(str::to_string).collect(),
        }
    }
}

/// Fills `row` from `entries`, which must cover every tag exactly once.
fn fill_row(row: &mut [f64], entries: &[(String, f64)], tags: &Vocabulary, context: &str) -> Result<()> {
    let mut seen = vec![false; row.len()];
    for (label, value) in entries {
        if label == START_TAG {
            continue;
        }
        let t = tags
            .get(label)
            .ok_or_else(|| HmmError::InvalidModel(format!("{context}: unknown tag {label:?}")))?;
        if !value.is_finite() || *value < 0.0 {
            return Err(HmmError::InvalidModel(format!(
                "{context}: tag {label:?} has invalid value {value}"
            )));
        }
        if seen[t] {
            return Err(HmmError::InvalidModel(format!(
                "{context}: tag {label:?} listed twice"
            )));
        }
        seen[t] = true;
        row[t] = *value;
    }
    if let Some(t) = seen.iter().position(|s| !s) {
        return Err(HmmError::InvalidModel(format!(
            "{context}: missing tag {:?}",
            tags.label(t)
        )));
    }
    Ok(())
}

impl TryFrom<ModelRecord> for HmmModel {
    type Error = HmmError;

    fn try_from(record: ModelRecord) -> Result<Self> {
        if record.version != FORMAT_VERSION {
            return Err(HmmError::UnsupportedVersion(record.version));
        }

        let mut tags = Vocabulary::new();
        let mut start_position = None;
        for (position, label) in record.tags.iter().enumerate() {
            if label == START_TAG {
                if start_position.replace(position).is_some() {
                    return Err(HmmError::InvalidModel(format!("{START_TAG} listed twice")));
                }
            } else if tags.contains(label) {
                return Err(HmmError::InvalidModel(format!("tag {label:?} listed twice")));
            } else {
                tags.intern(label);
            }
        }
        let start_position = start_position
            .ok_or_else(|| HmmError::InvalidModel(format!("tag list has no {START_TAG}")))?;
        let n_tags = tags.len();

        let mut words = Vocabulary::new();
        let mut emission = Table::filled(record.emission.0.len(), n_tags, 0.0);
        for (word, entries) in &record.emission.0 {
            if words.contains(word) {
                return Err(HmmError::InvalidModel(format!(
                    "emission: word {word:?} listed twice"
                )));
            }
            let w = words.intern(word);
            fill_row(emission.row_mut(w), &entries.0, &tags, &format!("emission[{word:?}]"))?;
        }

        let mut transition = Table::filled(n_tags + 1, n_tags, 0.0);
        let mut seen = vec![false; n_tags + 1];
        for (prev, entries) in &record.transition.0 {
            let r = if prev == START_TAG {
                0
            } else {
                tags.get(prev).map(|t| t + 1).ok_or_else(|| {
                    HmmError::InvalidModel(format!("transition: unknown tag {prev:?}"))
                })?
            };
            if seen[r] {
                return Err(HmmError::InvalidModel(format!(
                    "transition: row {prev:?} listed twice"
                )));
            }
            seen[r] = true;
            fill_row(transition.row_mut(r), &entries.0, &tags, &format!("transition[{prev:?}]"))?;
        }
        if let Some(r) = seen.iter().position(|s| !s) {
            let label = if r == 0 { START_TAG } else { tags.label(r - 1) };
            return Err(HmmError::InvalidModel(format!(
                "transition: missing row {label:?}"
            )));
        }

        debug!(tags = n_tags, words = words.len(), "loaded model record");
        Ok(HmmModel::from_parts(tags, start_position, words, emission, transition))
    }
}

impl HmmModel {
    pub fn to_record(&self) -> ModelRecord {
        ModelRecord::from(self)
    }

    /// Writes the model as JSON.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &self.to_record())?;
        Ok(())
    }

    /// Reads and validates a JSON model.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let record: ModelRecord = serde_json::from_reader(reader)?;
        Self::try_from(record)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let record: ModelRecord = serde_json::from_str(json)?;
        Self::try_from(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::parse_annotated_line;
    use crate::estimator::estimate;
    use crate::viterbi::viterbi_decode;

    fn trained() -> HmmModel {
        let corpus: Vec<_> = [
            "The/DT dog/NN barks/VBZ ./.",
            "The/DT 1/2/CD cup/NN spills/VBZ ./.",
            "Dogs/NNS bark/VBP ./.",
        ]
        .iter()
        .enumerate()
        .map(|(i, l)| parse_annotated_line(l, i + 1).unwrap())
        .collect();
        estimate(&corpus)
    }

    fn invalid(json: serde_json::Value) -> String {
        match HmmModel::from_json_str(&json.to_string()) {
            Err(HmmError::InvalidModel(msg)) => msg,
            other => panic!("expected InvalidModel, got {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let model = trained();
        let mut buf = Vec::new();
        model.save(&mut buf).unwrap();
        let loaded = HmmModel::load(buf.as_slice()).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.tag_order(), model.tag_order());
        assert_eq!(loaded.to_json_string().unwrap(), model.to_json_string().unwrap());
    }

    #[test]
    fn test_record_field_layout() {
        let model = trained();
        let value: serde_json::Value = serde_json::from_str(&model.to_json_string().unwrap()).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["tags"][0], START_TAG);
        assert!(value["emission"]["1/2"]["CD"].as_f64().unwrap() > 0.9);
        assert!(value["transition"][START_TAG]["DT"].as_f64().unwrap() > 0.5);
    }

    #[test]
    fn test_legacy_file_without_version_and_with_start_columns() {
        // Written by the older tool: no version, <start> last, <start> columns everywhere.
        let json = r#"{
            "emission": {"Dog": {"N": 1.0, "<start>": 1e-10, "V": 1e-10}},
            "transition": {
                "N": {"N": 0.1, "V": 0.9, "<start>": 1e-10},
                "V": {"N": 0.5, "V": 0.5, "<start>": 1e-10},
                "<start>": {"N": 0.8, "V": 0.2, "<start>": 1e-10}
            },
            "tags": ["N", "V", "<start>"]
        }"#;
        let model = HmmModel::from_json_str(json).unwrap();
        assert_eq!(model.tag_order(), vec!["N", "V", START_TAG]);
        assert_eq!(model.start_transition(0), 0.8);
        assert_eq!(model.transition(0, 1), 0.9);

        let result = viterbi_decode(&model, &["Dog", "Dog"]).unwrap();
        assert_eq!(result.best_path.len(), 2);
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let mut record = trained().to_record();
        record.version = 7;
        assert!(matches!(
            HmmModel::try_from(record),
            Err(HmmError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_rejects_missing_start() {
        let msg = invalid(serde_json::json!({
            "tags": ["N"],
            "emission": {},
            "transition": {"N": {"N": 1.0}}
        }));
        assert!(msg.contains("<start>"));
    }

    #[test]
    fn test_rejects_missing_transition_row() {
        let msg = invalid(serde_json::json!({
            "tags": ["<start>", "N", "V"],
            "emission": {},
            "transition": {
                "<start>": {"N": 0.5, "V": 0.5},
                "N": {"N": 0.5, "V": 0.5}
            }
        }));
        assert!(msg.contains("missing row \"V\""), "{msg}");
    }

    #[test]
    fn test_rejects_incomplete_emission_row() {
        let msg = invalid(serde_json::json!({
            "tags": ["<start>", "N", "V"],
            "emission": {"Dog": {"N": 1.0}},
            "transition": {
                "<start>": {"N": 0.5, "V": 0.5},
                "N": {"N": 0.5, "V": 0.5},
                "V": {"N": 0.5, "V": 0.5}
            }
        }));
        assert!(msg.contains("missing tag \"V\""), "{msg}");
    }

    #[test]
    fn test_rejects_unknown_and_negative_entries() {
        let msg = invalid(serde_json::json!({
            "tags": ["<start>", "N"],
            "emission": {"Dog": {"X": 1.0}},
            "transition": {"<start>": {"N": 1.0}, "N": {"N": 1.0}}
        }));
        assert!(msg.contains("unknown tag \"X\""), "{msg}");

        let msg = invalid(serde_json::json!({
            "tags": ["<start>", "N"],
            "emission": {"Dog": {"N": -1.0}},
            "transition": {"<start>": {"N": 1.0}, "N": {"N": 1.0}}
        }));
        assert!(msg.contains("invalid value"), "{msg}");
    }

    #[test]
    fn test_rejects_duplicate_tags() {
        let msg = invalid(serde_json::json!({
            "tags": ["<start>", "N", "N"],
            "emission": {},
            "transition": {"<start>": {"N": 1.0}, "N": {"N": 1.0}}
        }));
        assert!(msg.contains("listed twice"), "{msg}");
    }

    #[test]
    fn test_degenerate_model_round_trips() {
        let model = estimate(&[]);
        let loaded = HmmModel::from_json_str(&model.to_json_string().unwrap()).unwrap();
        assert_eq!(loaded, model);
        assert!(loaded.is_degenerate());
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        assert!(matches!(
            HmmModel::from_json_str("{\"tags\": 3}"),
            Err(HmmError::Json(_))
        ));
    }
}

use crate::asset::Asset;
use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Trait appended to every record carrying the token ID
pub const TOKEN_ID_TRAIT: &str = "Token ID";

/// Trait appended to every record carrying the raw asset identifier
pub const CODEPOINT_TRAIT: &str = "Unicode Codepoint";

const NAME_FIELD: &str = "name";
const IMAGE_FIELD: &str = "image";
const ATTRIBUTES_FIELD: &str = "attributes";

/// One entry of a record's `attributes` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: Value,
}

/// The shared shape every token record is cloned from
///
/// Field order is preserved, so records serialize in template order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTemplate {
    fields: Map<String, Value>,
}

impl MetadataTemplate {
    /// Validate a parsed template: it must be an object with an `attributes` list
    pub fn from_value(value: Value) -> Result<Self, MetadataError> {
        let Value::Object(fields) = value else {
            return Err(MetadataError::InvalidTemplate(
                "template must be a JSON object".to_string(),
            ));
        };
        match fields.get(ATTRIBUTES_FIELD) {
            Some(Value::Array(_)) => Ok(Self { fields }),
            Some(_) => Err(MetadataError::InvalidTemplate(
                "`attributes` must be a list".to_string(),
            )),
            None => Err(MetadataError::InvalidTemplate(
                "missing `attributes` list".to_string(),
            )),
        }
    }

    /// Read and validate a template file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MetadataError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Self::from_value(serde_json::from_str(&raw)?)
    }

    /// An independent copy of the template as a record
    pub fn instantiate(&self) -> MetadataRecord {
        MetadataRecord(self.fields.clone())
    }

    /// Build the record for one token
    ///
    /// # Parameters
    /// * `token_id` - The token the record describes
    /// * `asset` - The asset assigned to the token
    /// * `name` - The derived display name
    /// * `image_uri` - The (placeholder) image reference
    pub fn build_record(
        &self,
        token_id: u64,
        asset: &Asset,
        name: &str,
        image_uri: String,
    ) -> MetadataRecord {
        let mut record = self.instantiate();
        record.set_name(name);
        record.set_image(image_uri);
        record.push_attribute(TOKEN_ID_TRAIT, token_id.to_string());
        record.push_attribute(CODEPOINT_TRAIT, asset.identifier.clone());
        record
    }
}

/// A per-token metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord(Map<String, Value>);

impl MetadataRecord {
    pub fn name(&self) -> Option<&str> {
        self.0.get(NAME_FIELD).and_then(Value::as_str)
    }

    pub fn set_name(&mut self, name: &str) {
        self.0
            .insert(NAME_FIELD.to_string(), Value::String(name.to_string()));
    }

    /// The raw `image` field; `None` when absent
    pub fn image(&self) -> Option<&Value> {
        self.0.get(IMAGE_FIELD)
    }

    pub fn set_image(&mut self, uri: String) {
        self.0.insert(IMAGE_FIELD.to_string(), Value::String(uri));
    }

    /// Append a `{trait_type, value}` entry, creating the list if needed
    pub fn push_attribute(&mut self, trait_type: &str, value: impl Into<Value>) {
        let value: Value = value.into();
        let entry = serde_json::json!({
            "trait_type": trait_type,
            "value": value,
        });
        let attributes = self
            .0
            .entry(ATTRIBUTES_FIELD.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match attributes {
            Value::Array(list) => list.push(entry),
            other => *other = Value::Array(vec![entry]),
        }
    }

    /// All well-formed attributes, in order
    pub fn attributes(&self) -> Vec<Attribute> {
        self.0
            .get(ATTRIBUTES_FIELD)
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value of the first attribute with the given trait type
    pub fn attribute(&self, trait_type: &str) -> Option<Value> {
        self.attributes()
            .into_iter()
            .find(|attr| attr.trait_type == trait_type)
            .map(|attr| attr.value)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn from_json(raw: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Two-space indented JSON, the on-disk format of a record
    pub fn to_json_pretty(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::asset::tests::asset;
    use serde_json::json;

    pub fn sample_template() -> MetadataTemplate {
        MetadataTemplate::from_value(json!({
            "name": "",
            "description": "One of a kind.",
            "image": "",
            "attributes": [
                { "trait_type": "Collection", "value": "Emoji" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_build_record() {
        let template = sample_template();
        let record = template.build_record(
            0,
            &asset("1F600"),
            "GRINNING FACE",
            "ipfs://<ipfs_hash>/0.png".to_string(),
        );

        assert_eq!(record.name(), Some("GRINNING FACE"));
        assert_eq!(record.image(), Some(&json!("ipfs://<ipfs_hash>/0.png")));
        assert_eq!(
            record.attributes(),
            vec![
                Attribute { trait_type: "Collection".into(), value: json!("Emoji") },
                Attribute { trait_type: TOKEN_ID_TRAIT.into(), value: json!("0") },
                Attribute { trait_type: CODEPOINT_TRAIT.into(), value: json!("1F600") },
            ]
        );
    }

    #[test]
    fn test_template_is_not_mutated() {
        let template = sample_template();
        let before = template.clone();

        let first = template.build_record(0, &asset("1F600"), "A", "a".into());
        let second = template.build_record(1, &asset("1F601"), "B", "b".into());

        assert_eq!(template, before);
        assert_eq!(first.attributes().len(), 3);
        assert_eq!(second.attributes().len(), 3);
        assert_eq!(second.attribute(TOKEN_ID_TRAIT), Some(json!("1")));
    }

    #[test]
    fn test_field_order_preserved() {
        let record = sample_template().build_record(3, &asset("1F600"), "A", "a".into());
        let keys: Vec<_> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "description", "image", "attributes"]);

        let json = record.to_json_pretty().unwrap();
        assert!(json.starts_with("{\n  \"name\": \"A\""));
    }

    #[test]
    fn test_invalid_templates() {
        assert!(matches!(
            MetadataTemplate::from_value(json!([1, 2])),
            Err(MetadataError::InvalidTemplate(_))
        ));
        assert!(matches!(
            MetadataTemplate::from_value(json!({ "name": "x" })),
            Err(MetadataError::InvalidTemplate(_))
        ));
        assert!(matches!(
            MetadataTemplate::from_value(json!({ "attributes": {} })),
            Err(MetadataError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_record_json_roundtrip_keeps_unknown_fields() {
        let raw = r#"{"name":"X","external_url":"https://example.com","image":"ipfs://h/1.png"}"#;
        let record = MetadataRecord::from_json(raw).unwrap();
        assert_eq!(record.fields().get("external_url"), Some(&json!("https://example.com")));
        assert!(record.attributes().is_empty());
    }
}

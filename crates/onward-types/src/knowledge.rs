//! Knowledge-base record types.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// One service entry of the onward-journey knowledge base.
///
/// Every field is optional text in the source data; missing or null values
/// render as empty strings in the chunk. Exported tables often carry ids and
/// phone numbers as numbers, so scalar values are accepted and stringified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeRecord {
    #[serde(deserialize_with = "scalar_text")]
    pub uid: String,
    #[serde(deserialize_with = "scalar_text")]
    pub service_name: String,
    #[serde(deserialize_with = "scalar_text")]
    pub department: String,
    #[serde(deserialize_with = "scalar_text")]
    pub phone_number: String,
    #[serde(deserialize_with = "scalar_text")]
    pub topic: String,
    #[serde(deserialize_with = "scalar_text")]
    pub user_type: String,
    #[serde(deserialize_with = "scalar_text")]
    pub tags: String,
    #[serde(deserialize_with = "scalar_text")]
    pub url: String,
    #[serde(deserialize_with = "scalar_text")]
    pub last_update: String,
    #[serde(deserialize_with = "scalar_text")]
    pub description: String,
}

/// Text from a string, number, boolean or null.
fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarText;

    impl<'de> Visitor<'de> for ScalarText {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        // 3002003300.0 renders as "3002003300".
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<String, D2::Error> {
            d.deserialize_any(ScalarText)
        }
    }

    deserializer.deserialize_any(ScalarText)
}

impl KnowledgeRecord {
    /// Render the record as a single retrievable text chunk.
    pub fn to_chunk(&self) -> String {
        format!(
            "The unique id is {}. The service name is {}. The department is {}. \
             The phone number is {}. The topic is {}. The user type is {}. \
             The tags are {}. The url is {}. The last time the page was updated is {}. \
             The description is {}.",
            self.uid.trim(),
            self.service_name.trim(),
            self.department.trim(),
            self.phone_number.trim(),
            self.topic.trim(),
            self.user_type.trim(),
            self.tags.trim(),
            self.url.trim(),
            self.last_update.trim(),
            self.description.trim(),
        )
    }
}

/// A retrieved chunk and its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub uid: String,
    pub text: String,
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_format() {
        let record = KnowledgeRecord {
            uid: "42".to_string(),
            service_name: "Child Benefit".to_string(),
            department: "HMRC".to_string(),
            phone_number: "0300 200 3100".to_string(),
            topic: "benefits".to_string(),
            user_type: "citizen".to_string(),
            tags: "family;money".to_string(),
            url: "https://www.gov.uk/child-benefit".to_string(),
            last_update: "2024-05-01".to_string(),
            description: " Claim Child Benefit ".to_string(),
        };
        let chunk = record.to_chunk();
        assert!(chunk.starts_with("The unique id is 42. The service name is Child Benefit."));
        assert!(chunk.contains("The phone number is 0300 200 3100."));
        assert!(chunk.ends_with("The description is Claim Child Benefit."));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record: KnowledgeRecord =
            serde_json::from_str(r#"{"uid":"7","service_name":"Passports"}"#).unwrap();
        assert_eq!(record.department, "");
        assert!(record.to_chunk().contains("The department is ."));
        assert!(record.to_chunk().ends_with("The description is ."));
    }

    #[test]
    fn test_numeric_and_null_fields_become_text() {
        let record: KnowledgeRecord = serde_json::from_str(
            r#"{"uid": 17, "phone_number": 3002003300.0, "topic": null,
                "tags": false, "description": "Report a pothole"}"#,
        )
        .unwrap();
        assert_eq!(record.uid, "17");
        assert_eq!(record.phone_number, "3002003300");
        assert_eq!(record.topic, "");
        assert_eq!(record.tags, "false");
        assert_eq!(record.description, "Report a pothole");

        let nested = serde_json::from_str::<KnowledgeRecord>(r#"{"uid": {"id": 1}}"#);
        assert!(nested.is_err());
    }
}

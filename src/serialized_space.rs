//! Codec for the serialized space document.
//!
//! A Genie space stores its tables and sample questions as one opaque JSON
//! string on the remote object. This module converts between that string and
//! the two ordered lists the configuration exposes.
//!
//! ```text
//! {
//!   "version": 1,
//!   "config": {
//!     "sample_questions": [{"id": "<32 hex chars>", "question": ["<text>"]}]
//!   },
//!   "data_sources": {
//!     "tables": [{"identifier": "<catalog.schema.table>"}]
//!   }
//! }
//! ```
//!
//! `config.sample_questions` is omitted when there are no questions, while
//! `data_sources.tables` is always written. Every question gets a freshly
//! generated identifier on each encode; identifiers are never read back.
//!
//! # Example
//!
//! ```
//! use workspace_provider::serialized_space::{decode, encode, SpaceContents};
//!
//! let contents = SpaceContents::default()
//!     .with_tables(["samples.tpch.customer"])
//!     .with_sample_questions(["Show total revenue"]);
//!
//! let raw = encode(&contents).unwrap();
//! assert_eq!(decode(&raw).unwrap(), contents);
//! assert_eq!(decode("").unwrap(), SpaceContents::default());
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ProviderError;

/// The document version written by this crate.
pub const DOCUMENT_VERSION: u32 = 1;

/// The user-facing contents of a space document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpaceContents {
    /// Fully qualified table names, in order.
    pub tables: Vec<String>,
    /// Sample question texts, in order.
    pub sample_questions: Vec<String>,
}

impl SpaceContents {
    /// Replace the table list.
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the sample question list.
    pub fn with_sample_questions<I, S>(mut self, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sample_questions = questions.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SpaceDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    version: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    config: SpaceConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    data_sources: SpaceDataSources,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SpaceConfig {
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    sample_questions: Vec<SampleQuestion>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SpaceDataSources {
    #[serde(default, deserialize_with = "null_as_default")]
    tables: Vec<TableSource>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableSource {
    #[serde(default, deserialize_with = "null_as_default")]
    identifier: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SampleQuestion {
    #[serde(default)]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    question: Vec<String>,
}

/// JSON `null` decodes the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn generate_question_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Encode space contents into a serialized space document.
///
/// The whole document is rebuilt from `contents`; nothing is carried over
/// from a previously stored document.
///
/// # Errors
///
/// Returns [`ProviderError::Encoding`] if JSON encoding fails.
pub fn encode(contents: &SpaceContents) -> Result<String, ProviderError> {
    let document = SpaceDocument {
        version: DOCUMENT_VERSION,
        config: SpaceConfig {
            sample_questions: contents
                .sample_questions
                .iter()
                .map(|text| SampleQuestion {
                    id: generate_question_id(),
                    question: vec![text.clone()],
                })
                .collect(),
        },
        data_sources: SpaceDataSources {
            tables: contents
                .tables
                .iter()
                .map(|identifier| TableSource {
                    identifier: identifier.clone(),
                })
                .collect(),
        },
    };

    serde_json::to_string(&document).map_err(ProviderError::Encoding)
}

/// Decode a serialized space document.
///
/// An empty string means no document was stored and decodes to empty lists.
/// A question whose text list is empty is skipped.
///
/// # Errors
///
/// Returns [`ProviderError::MalformedDocument`] if `raw` is not valid JSON
/// of the expected shape.
pub fn decode(raw: &str) -> Result<SpaceContents, ProviderError> {
    if raw.is_empty() {
        return Ok(SpaceContents::default());
    }

    let document: SpaceDocument =
        serde_json::from_str(raw).map_err(ProviderError::MalformedDocument)?;

    Ok(SpaceContents {
        tables: document
            .data_sources
            .tables
            .into_iter()
            .map(|table| table.identifier)
            .collect(),
        sample_questions: document
            .config
            .sample_questions
            .into_iter()
            .filter_map(|question| question.question.into_iter().next())
            .collect(),
    })
}

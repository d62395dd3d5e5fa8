//! Document loading
//!
//! Parses an exported JSON document from bytes, text, a reader or a file.
//! Object key order is preserved so sanitized output mirrors the input.
//! Nesting depth is not limited; parsing grows the stack on the heap as
//! needed instead of stopping at serde_json's default of 128 levels.

use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::navigator::Document;

/// Loader for exported documents
pub struct Loader;

impl Loader {
    pub fn from_json(json: &str) -> Result<Document> {
        Document::from_value(parse(serde_json::Deserializer::from_str(json))?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Document> {
        Document::from_value(parse(serde_json::Deserializer::from_slice(bytes))?)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Document> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Self::from_slice(&buffer)
    }

    pub fn from_path(path: &Path) -> Result<Document> {
        let bytes = std::fs::read(path)?;
        log::info!("loaded {} ({} bytes)", path.display(), bytes.len());
        Self::from_slice(&bytes)
    }
}

fn parse<'de, R: serde_json::de::Read<'de>>(mut de: serde_json::Deserializer<R>) -> Result<Value> {
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::pipeline::sanitized_sessions;

    #[test]
    fn test_load_object_document() {
        let doc = Loader::from_json(r#"{"GroupHistory": []}"#).unwrap();
        assert!(doc.root().get("GroupHistory").is_some());

        let doc = Loader::from_reader(&br#"{"a": 1}"#[..]).unwrap();
        assert_eq!(doc.root()["a"], 1);
    }

    #[test]
    fn test_invalid_json_and_non_object_root() {
        assert!(matches!(
            Loader::from_json("not json"),
            Err(PipelineError::JsonError(_))
        ));
        assert!(matches!(
            Loader::from_slice(b"[1, 2]"),
            Err(PipelineError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_trailing_characters_rejected() {
        assert!(matches!(
            Loader::from_json(r#"{"a": 1} x"#),
            Err(PipelineError::JsonError(_))
        ));
    }

    #[test]
    fn test_deeply_nested_sessions_load_and_sanitize() {
        let depth = 300;
        let session = format!(
            r#"{{"SessionDate": "a", "Nested": {}{{"SignalPsdValues": [1], "Leaf": true}}{}}}"#,
            "[".repeat(depth),
            "]".repeat(depth)
        );
        let raw = format!(r#"{{"GroupHistory": [{session}]}}"#);

        let doc = Loader::from_json(&raw).unwrap();
        let sessions = sanitized_sessions(&doc).unwrap();

        let mut node = &sessions[0]["Nested"];
        let mut levels = 0;
        while let Some(items) = node.as_array() {
            node = &items[0];
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(node, &serde_json::json!({ "Leaf": true }));

        let doc = Loader::from_slice(raw.as_bytes()).unwrap();
        assert_eq!(doc.root()["GroupHistory"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Loader::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::core::error::ScanError;

/// Serialize a document as JSON, pretty-printed unless `pretty` is false.
pub fn render_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, ScanError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|e| ScanError::Output(e.to_string()))
}

/// Serialize each item onto its own line.
pub fn render_jsonl<T: Serialize>(items: &[T]) -> Result<String, ScanError> {
    let mut lines = String::new();
    for item in items {
        let json = serde_json::to_string(item).map_err(|e| ScanError::Output(e.to_string()))?;
        lines.push_str(&json);
        lines.push('\n');
    }
    Ok(lines)
}

/// Write `contents` to `path`, creating parent directories first.
pub fn write_document(path: &Path, contents: &str) -> Result<(), ScanError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_puts_one_record_per_line() {
        let out = render_jsonl(&[1, 2, 3]).unwrap();
        assert_eq!(out, "1\n2\n3\n");
    }

    #[test]
    fn write_document_creates_parents() {
        let dir = std::env::temp_dir().join(format!("printscope-output-{}", std::process::id()));
        let path = dir.join("nested").join("doc.json");
        write_document(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        let _ = std::fs::remove_dir_all(&dir);
    }
}

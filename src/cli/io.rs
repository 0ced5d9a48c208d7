//! JSON output for the CLI
//!
//! - One JSON object per line
//! - Results wrapped as `{"status":"ok","data":...}`
//! - Errors as `{"status":"error","code":...,"message":...}`
//! - UTF-8 only

use std::io::Write;

use serde_json::{json, Value};

use crate::store::{self, Document};

use super::errors::{CliError, CliResult};

/// Write a success line
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    write_line(out, &json!({ "status": "ok", "data": data }))
}

/// Write an error line
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    write_line(
        out,
        &json!({
            "status": "error",
            "code": code,
            "message": message
        }),
    )
}

fn write_line<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Parse a JSON object argument
pub fn parse_document(arg: &str, raw: &str) -> CliResult<Document> {
    let value: Value = serde_json::from_str(raw).map_err(|e| CliError::invalid_argument(arg, e))?;
    store::document(value).map_err(|e| CliError::invalid_argument(arg, e))
}

/// Parse a JSON array of stages
pub fn parse_pipeline(raw: &str) -> CliResult<Vec<Document>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| CliError::invalid_argument("pipeline", e))?;
    store::documents(value).map_err(|e| CliError::invalid_argument("pipeline", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_line() {
        let mut out = Vec::new();
        write_response(&mut out, json!({"n": 1})).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);

        let line: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(line, json!({"status": "ok", "data": {"n": 1}}));
    }

    #[test]
    fn test_error_line() {
        let mut out = Vec::new();
        write_error(&mut out, "DAILY_INVALID_RANGE", "inverted").unwrap();
        let line: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(line["status"], "error");
        assert_eq!(line["code"], "DAILY_INVALID_RANGE");
    }

    #[test]
    fn test_parse_arguments() {
        let doc = parse_document("filter", r#"{"a": 1}"#).unwrap();
        assert_eq!(doc.get("a"), Some(&json!(1)));

        assert!(parse_document("filter", "[1]").is_err());
        assert!(parse_document("filter", "{").is_err());

        let stages = parse_pipeline(r#"[{"$limit": 1}]"#).unwrap();
        assert_eq!(stages.len(), 1);
        assert!(parse_pipeline(r#"{"$limit": 1}"#).is_err());
    }
}

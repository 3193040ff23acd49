// Tests for output formatting
//
// The writer is pointed at a shared buffer so the exact bytes can be checked.

use super::*;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, Box::new(buffer.clone()));
    (writer, buffer)
}

#[test]
fn test_json_output_is_one_line() {
    let (mut out, buffer) = writer(OutputFormat::Json, false);
    out.data(&json!({"reply": "hello world", "boolean_test": true}))
        .unwrap();
    assert_eq!(
        buffer.contents(),
        "{\"boolean_test\":true,\"reply\":\"hello world\"}\n"
    );
}

#[test]
fn test_yaml_output() {
    let (mut out, buffer) = writer(OutputFormat::Yaml, false);
    out.data(&json!({"tail": {"count": 6}})).unwrap();
    assert_eq!(buffer.contents(), "tail:\n  count: 6\n");
}

#[test]
fn test_messages_only_in_human_format() {
    let (mut out, buffer) = writer(OutputFormat::JsonPretty, false);
    out.info("hidden").unwrap();
    out.section("Response").unwrap();
    out.warning("hidden").unwrap();
    assert_eq!(buffer.contents(), "");

    let (mut out, buffer) = writer(OutputFormat::Human, false);
    out.section("Response").unwrap();
    out.info("shown").unwrap();
    assert_eq!(buffer.contents(), "=== Response ===\nINFO: shown\n");
}

#[test]
fn test_quiet_suppresses_info_but_not_data() {
    let (mut out, buffer) = writer(OutputFormat::Human, true);
    out.info("hidden").unwrap();
    out.success("hidden").unwrap();
    out.data(&json!([1])).unwrap();
    assert_eq!(buffer.contents(), "[\n  1\n]\n");
}

#[test]
fn test_table_alignment() {
    let (mut out, buffer) = writer(OutputFormat::Human, false);
    out.table(
        ["METHOD", "DESCRIPTION"],
        &[
            ("Echo".to_string(), "Return the body".to_string()),
            ("GrowTail".to_string(), "Add one".to_string()),
        ],
    )
    .unwrap();

    assert_eq!(
        buffer.contents(),
        "METHOD    DESCRIPTION\nEcho      Return the body\nGrowTail  Add one\n"
    );
}

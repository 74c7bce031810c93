//! Integration tests for logng
//!
//! Loggers wired to real outputs writing to files and shared buffers.

use chrono::{TimeZone, Utc};
use logng::prelude::*;
use logng::{info, warning};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn text_logger(flags: TextOutputFlags) -> (SharedBuffer, Logger) {
    let buffer = SharedBuffer::default();
    let output = Arc::new(TextOutput::new(buffer.clone(), flags | TextOutputFlags::UTC));
    (buffer, Logger::new(output, Severity::Debug, 0))
}

#[test]
fn test_text_output_to_file() -> logng::Result<()> {
    let temp_dir = TempDir::new()?;
    let log_path = temp_dir.path().join("app.log");

    let output = Arc::new(TextOutput::new(File::create(&log_path)?, TextOutputFlags::DEFAULT));
    let logger = Logger::new(output, Severity::Info, 0);
    logger.info("first");
    logger.debug("filtered");
    logger.with_field_key_vals(["user", "alice"]).warning("second");

    let content = fs::read_to_string(&log_path)?;
    assert!(content.contains("INFO - first\n"));
    assert!(!content.contains("filtered"));
    assert!(content.contains("WARNING - second\n\t\n\t+ \"user\"=\"alice\"\n\t\n"));
    Ok(())
}

#[test]
fn test_json_output_to_file() -> logng::Result<()> {
    let temp_dir = TempDir::new()?;
    let log_path = temp_dir.path().join("app.jsonl");

    let output = Arc::new(JsonOutput::new(File::create(&log_path)?, JsonOutputFlags::DEFAULT));
    let logger = Logger::new(output, Severity::Debug, 0);
    for i in 0..5 {
        logger
            .with_fields([Field::new("iteration", i)])
            .debugf(format_args!("Iteration {}", i));
    }

    let content = fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 5);
    for (i, line) in lines.iter().enumerate() {
        let parsed: serde_json::Value = serde_json::from_str(line)?;
        assert_eq!(parsed["severity"], "DEBUG");
        assert_eq!(parsed["message"], format!("Iteration {}", i));
        assert_eq!(parsed["_iteration"], i as i64);
        assert!(parsed["file"].as_str().unwrap().starts_with("integration_tests.rs:"));
    }
    Ok(())
}

#[test]
fn test_suffix_composition() {
    let (buffer, logger) = text_logger(TextOutputFlags::SEVERITY);
    logger
        .with_suffix(" :suffix1")
        .with_suffix(" :suffix2")
        .info("this is info log.");
    assert_eq!(buffer.contents(), "INFO - this is info log. :suffix2 :suffix1\n");
}

#[test]
fn test_prefix_composition() {
    let (buffer, logger) = text_logger(TextOutputFlags::SEVERITY);
    logger
        .with_prefix("prefix1: ")
        .with_prefix("prefix2: ")
        .info("this is info log.");
    assert_eq!(buffer.contents(), "INFO - prefix1: prefix2: this is info log.\n");
}

#[test]
fn test_duplicate_keys_render_three_entries() {
    let (buffer, logger) = text_logger(TextOutputFlags::FIELDS);
    logger
        .with_field_key_vals(["key1", "val1", "key2", "val2"])
        .with_field_key_vals(["key1", "val1-2"])
        .info("fields");
    assert_eq!(
        buffer.contents(),
        "fields\n\t\n\t+ \"key1\"=\"val1\" \"key2\"=\"val2\" \"key1\"=\"val1-2\"\n\t\n"
    );
}

#[test]
fn test_padding_alignment() {
    let (buffer, logger) = text_logger(TextOutputFlags::DEFAULT);
    let time = Utc.with_ymd_and_hms(2010, 11, 12, 13, 14, 15).unwrap();
    logger.with_time(time).warning("line one\nline two");
    assert_eq!(
        buffer.contents(),
        "2010/11/12 13:14:15 WARNING - line one\n                              line two\n"
    );
}

#[test]
fn test_caller_in_text_output() {
    let (buffer, logger) = text_logger(TextOutputFlags::SHORT_FILE);
    let line = line!() + 1;
    logger.info("located");
    assert_eq!(
        buffer.contents(),
        format!("integration_tests.rs:{} - located\n", line)
    );
}

#[test]
fn test_stack_trace_rendered_for_errors_only() {
    let (buffer, logger) = text_logger(TextOutputFlags::SEVERITY | TextOutputFlags::STACK_TRACE);
    logger.set_stack_trace_severity(Severity::Error);
    logger.error("with stack");
    logger.info("without stack");

    let content = buffer.contents();
    let (error_block, info_block) = content.split_at(content.find("INFO - ").unwrap());
    assert!(error_block.starts_with("ERROR - with stack\n\t\n\t"));
    assert!(error_block.ends_with("\n\t\n"));
    assert_eq!(info_block, "INFO - without stack\n");
}

#[test]
fn test_multi_output_fans_out() {
    let text_buffer = SharedBuffer::default();
    let json_buffer = SharedBuffer::default();
    let multi = MultiOutput::default()
        .with_output(Arc::new(TextOutput::new(text_buffer.clone(), TextOutputFlags::SEVERITY)))
        .with_output(Arc::new(JsonOutput::new(json_buffer.clone(), JsonOutputFlags::SEVERITY)));
    let logger = Logger::new(Arc::new(multi), Severity::Info, 0);

    warning!(logger, "low disk: {}%", 5);

    assert_eq!(text_buffer.contents(), "WARNING - low disk: 5%\n");
    assert_eq!(
        json_buffer.contents(),
        "{\"severity\":\"WARNING\",\"message\":\"low disk: 5%\"}\n"
    );
}

#[test]
fn test_queued_output_end_to_end() -> logng::Result<()> {
    let buffer = SharedBuffer::default();
    let text = Arc::new(TextOutput::new(buffer.clone(), TextOutputFlags::SEVERITY));
    let queued = Arc::new(QueuedOutput::new(text, 8));
    queued.set_blocking(true);
    let logger = Logger::new(queued.clone(), Severity::Info, 0);

    for i in 0..20 {
        info!(logger, "queued {}", i);
    }
    queued.wait_for_empty(Duration::from_secs(5))?;
    queued.close()?;
    logger.info("after close");

    let content = buffer.contents();
    let expected: String = (0..20).map(|i| format!("INFO - queued {}\n", i)).collect();
    assert_eq!(content, expected);
    assert_eq!(queued.state(), QueueState::Closed);
    assert_eq!(queued.metrics().enqueued(), 20);
    assert_eq!(queued.metrics().dropped(), 1);
    Ok(())
}

#[test]
fn test_logger_builder_with_json() {
    let buffer = SharedBuffer::default();
    let output = JsonOutput::new(buffer.clone(), JsonOutputFlags::SEVERITY | JsonOutputFlags::VERBOSITY);
    let logger = Logger::builder()
        .output(Arc::new(output))
        .severity(Severity::Debug)
        .verbose(3)
        .field("service", "billing")
        .build();

    logger.v(2).debug("charged");
    logger.v(4).debug("too verbose");

    assert_eq!(
        buffer.contents(),
        "{\"severity\":\"DEBUG\",\"message\":\"charged\",\"verbosity\":2,\"_service\":\"billing\"}\n"
    );
}

#[test]
fn test_on_error_reports_failed_writes() {
    struct Closed;
    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let output = Arc::new(TextOutput::new(Closed, TextOutputFlags::DEFAULT));
    output.set_on_error(Some(Arc::new(move |e: &LoggerError| {
        sink.lock().push(e.to_string());
    })));

    let logger = Logger::new(output, Severity::Info, 0);
    logger.info("lost");
    logger.error("lost too");
    assert_eq!(errors.lock().len(), 2);
    assert!(errors.lock()[0].contains("pipe closed"));
}

//! Terminal colorizer / writer, grounded on `OutputThread` in
//! `original_source/logfire.py`. Out of the core's scope (spec §1) but
//! needed for a runnable tool.

use std::io::Write;

use console::{style, StyledObject};
use logtail_core::{Level, LogEntry};

pub struct WriterOptions {
    pub collapse: bool,
    pub truncate: Option<usize>,
}

fn color_level(level: Level) -> StyledObject<&'static str> {
    let text = level.as_str();
    match level {
        Level::Fatal => style(text).magenta(),
        Level::Error => style(text).red(),
        Level::Warn => style(text).yellow(),
        Level::Info => style(text).green(),
        Level::Debug | Level::Trace => style(text).cyan(),
    }
}

/// Writes one entry, `name`-prefixed, to `out`.
pub fn write_entry(out: &mut impl Write, name: &str, entry: &LogEntry, opts: &WriterOptions) -> std::io::Result<()> {
    let mut message = entry.message.clone();
    if opts.collapse {
        message = message.replace('\n', "\\n");
    }
    if let Some(max) = opts.truncate {
        if message.len() > max {
            let cut = message[..max].rsplit_once(' ').map(|(head, _)| head).unwrap_or(&message[..max]);
            message = format!("{cut}...");
        }
    }

    writeln!(
        out,
        "{} {} {} {} {} {} {} {}",
        name,
        &entry.timestamp_text[5..],
        color_level(entry.level),
        entry.flow_id.as_deref().unwrap_or("-"),
        entry.thread.as_deref().unwrap_or("-"),
        entry.class_name,
        format_location(entry),
        message,
    )
}

fn format_location(entry: &LogEntry) -> String {
    if entry.source_line >= 0 {
        format!("{}:{}", entry.source_file, entry.source_line)
    } else {
        entry.source_file.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtail_core::entry::Level;

    fn sample_entry() -> LogEntry {
        LogEntry {
            timestamp_text: "2000-01-01 00:00:00,000".to_string(),
            reader_id: 0,
            entry_index: 0,
            flow_id: Some("FlowID".to_string()),
            level: Level::Error,
            thread: Some("Thread".to_string()),
            class_name: "C".to_string(),
            method: "m".to_string(),
            source_file: "C.java".to_string(),
            source_line: 23,
            message: "Error!\nmore".to_string(),
        }
    }

    #[test]
    fn collapses_multiline_message() {
        let mut out = Vec::new();
        let opts = WriterOptions { collapse: true, truncate: None };
        write_entry(&mut out, "APP", &sample_entry(), &opts).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error!\\nmore"));
    }

    #[test]
    fn truncates_long_message_at_word_boundary() {
        let mut entry = sample_entry();
        entry.message = "one two three four five".to_string();
        let mut out = Vec::new();
        let opts = WriterOptions { collapse: false, truncate: Some(10) };
        write_entry(&mut out, "APP", &entry, &opts).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("one two..."));
    }
}

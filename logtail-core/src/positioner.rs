//! Positioner (spec §4.C): seeks to tail-N / first-at-time / checkpointed
//! position using chunked scans over an opaque text file.

use std::io::{BufRead, Seek, SeekFrom};

use crate::parser::is_header_line;

const CHUNK: usize = 1024;

/// Sentinel that compares greater than any real 23-character timestamp
/// string under lexicographic ordering.
pub const SENTINEL_GREATER_THAN_ANY_TIME: &str = "\u{10FFFF}";

/// Position `reader` at the start of the Nth-from-last header line.
/// Continuation lines do not count toward N. If fewer than N headers are
/// found, seeks to 0.
pub fn seek_tail<R: BufRead + Seek>(reader: &mut R, tail_length: u64) -> std::io::Result<()> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    let chunk_count = file_size.div_ceil(CHUNK as u64);

    let mut newline_count: u64 = 0;
    let mut carry: Vec<u8> = Vec::new();

    for iteration in 0..chunk_count {
        let chunk_index = chunk_count - 1 - iteration;
        reader.seek(SeekFrom::Start(chunk_index * CHUNK as u64))?;
        let mut chunk = vec![0u8; CHUNK];
        let n = read_fully(reader, &mut chunk)?;
        chunk.truncate(n);

        let mut combined = chunk;
        combined.extend_from_slice(&carry);

        let mut previous_newline_position: Option<usize> = if iteration == 0 {
            rfind_byte(&combined, b'\n', combined.len())
        } else {
            None
        };

        let mut current_newline_position =
            rfind_byte(&combined, b'\n', previous_newline_position.unwrap_or(combined.len()));

        loop {
            let current = match current_newline_position {
                Some(p) => p,
                None => break,
            };
            let end = previous_newline_position.unwrap_or(combined.len());
            let line = &combined[current + 1..end];
            let line_str = String::from_utf8_lossy(line);

            if !is_continuation_line(&line_str) {
                newline_count += 1;
                if newline_count >= tail_length {
                    let absolute = chunk_index * CHUNK as u64 + current as u64 + 1;
                    reader.seek(SeekFrom::Start(absolute))?;
                    return Ok(());
                }
            }

            previous_newline_position = Some(current);
            current_newline_position = rfind_byte(&combined, b'\n', current);
        }

        // Retain the unconsumed prefix (before whatever newline we stopped
        // at) for stitching onto the next (lower-indexed) chunk.
        carry = combined[..previous_newline_position.unwrap_or(combined.len())].to_vec();
    }

    reader.seek(SeekFrom::Start(0))?;
    Ok(())
}

/// A line is a "continuation line" if it is non-empty and not a header
/// line. (An empty line is neither -- it simply contributes no content.)
fn is_continuation_line(line: &str) -> bool {
    !line.is_empty() && !is_header_line(line)
}

/// Binary-search chunk boundaries for the first header line whose timestamp
/// is `>= target`, then linearly scan from that chunk's start.
pub fn seek_time<R: BufRead + Seek>(reader: &mut R, target: &str) -> std::io::Result<()> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    let chunk_count = file_size.div_ceil(CHUNK as u64);

    let mut lo: u64 = 0;
    let mut hi: u64 = chunk_count + 1;
    while lo + 1 < hi {
        let pivot = (lo + hi) / 2;
        let first_ts = first_timestamp_in_chunk(reader, pivot)?;
        if first_ts.as_str() > target {
            hi = pivot;
        } else {
            lo = pivot;
        }
    }

    scan_forward_from_chunk(reader, lo, target)
}

fn first_timestamp_in_chunk<R: BufRead + Seek>(
    reader: &mut R,
    chunk_index: u64,
) -> std::io::Result<String> {
    reader.seek(SeekFrom::Start(chunk_index * CHUNK as u64))?;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line)?;
        if n == 0 || !line.ends_with('\n') {
            return Ok(SENTINEL_GREATER_THAN_ANY_TIME.to_string());
        }
        let stripped = line.trim_end_matches(['\n', '\r']);
        if is_continuation_line(stripped) {
            continue;
        }
        if !crate::parser::is_header_line(stripped) {
            continue;
        }
        return Ok(crate::parser::extract_timestamp(stripped).to_string());
    }
}

fn scan_forward_from_chunk<R: BufRead + Seek>(
    reader: &mut R,
    chunk_index: u64,
    target: &str,
) -> std::io::Result<()> {
    reader.seek(SeekFrom::Start(chunk_index * CHUNK as u64))?;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line)?;
        if n == 0 || !line.ends_with('\n') {
            reader.seek(SeekFrom::End(0))?;
            return Ok(());
        }
        let stripped = line.trim_end_matches(['\n', '\r']);
        if is_continuation_line(stripped) {
            continue;
        }
        if !crate::parser::is_header_line(stripped) {
            continue;
        }
        if crate::parser::extract_timestamp(stripped) >= target {
            reader.seek(SeekFrom::Current(-(line.len() as i64)))?;
            return Ok(());
        }
    }
}

fn rfind_byte(haystack: &[u8], needle: u8, before: usize) -> Option<usize> {
    let before = before.min(haystack.len());
    haystack[..before].iter().rposition(|&b| b == needle)
}

fn read_fully<R: std::io::Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

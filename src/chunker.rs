/// Transcript chunking.
///
/// Splits raw transcript text into bounded-size segments for embedding.
/// Timestamp-only lines (e.g. "0:02", "12:45") are treated as boundary
/// hints and never become chunk content.
use std::sync::LazyLock;

use regex::Regex;

/// Matches a line that is nothing but a `minutes:seconds` timestamp.
static TIMESTAMP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:\d+$").unwrap());

/// Returns `true` if the line (after trimming) is a bare timestamp.
#[must_use]
pub fn is_timestamp_line(line: &str) -> bool {
    TIMESTAMP_LINE.is_match(line.trim())
}

/// Accumulator for the soft-cap chunking policy.
///
/// Lines are appended to a running buffer, each followed by a single
/// space. The buffer is flushed as soon as its length crosses `max_size`
/// (so a chunk may exceed the cap by up to one line), and optionally at
/// timestamp boundaries when already oversized. Lengths are counted in
/// `char`s, not bytes.
pub struct Chunker {
    max_size: usize,
    buf: String,
    buf_chars: usize,
    chunks: Vec<String>,
}

impl Chunker {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            buf: String::new(),
            buf_chars: 0,
            chunks: Vec::new(),
        }
    }

    /// Feed one transcript line into the accumulator.
    pub fn push_line(&mut self, line: &str) {
        if is_timestamp_line(line) {
            // Boundary hint: flush only if the buffer is already over the
            // cap. The timestamp itself is never content.
            if self.buf_chars > self.max_size {
                self.flush();
            }
            return;
        }

        self.buf.push_str(line);
        self.buf.push(' ');
        self.buf_chars += line.chars().count() + 1;

        if self.buf_chars > self.max_size {
            self.flush();
        }
    }

    /// Emit the buffer as a chunk (trimmed) and reset. Whitespace-only
    /// buffers are discarded.
    fn flush(&mut self) {
        let trimmed = self.buf.trim();
        if !trimmed.is_empty() {
            self.chunks.push(trimmed.to_string());
        }
        self.buf.clear();
        self.buf_chars = 0;
    }

    /// Flush any remaining content and return the finished chunks.
    #[must_use]
    pub fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

/// Splits one transcript into chunks of approximately `max_size` characters.
#[must_use]
pub fn chunk(transcript: &str, max_size: usize) -> Vec<String> {
    let mut chunker = Chunker::new(max_size);
    for line in transcript.lines() {
        chunker.push_line(line);
    }
    chunker.finish()
}

/// Chunks several transcripts in order into one flat sequence.
///
/// No transcript-boundary marker is retained; downstream retrieval sees a
/// single ordered chunk stream.
#[must_use]
pub fn chunk_all<'a, I>(transcripts: I, max_size: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut chunks = Vec::new();
    for transcript in transcripts {
        chunks.extend(chunk(transcript, max_size));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_detection() {
        assert!(is_timestamp_line("0:02"));
        assert!(is_timestamp_line("12:45"));
        assert!(is_timestamp_line("  3:07  "));
        assert!(!is_timestamp_line("0:02 and more"));
        assert!(!is_timestamp_line("price: 40"));
        assert!(!is_timestamp_line(""));
    }

    #[test]
    fn test_short_transcript_single_chunk() {
        let chunks = chunk("Hello there.\nHow are you?", 500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Hello there. How are you?");
    }

    #[test]
    fn test_timestamps_stripped() {
        let chunks = chunk("0:02\nHi, we offer weekly mowing at $40.\n0:05\nWe also do bagging for $10 extra.", 1000);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("weekly mowing at $40"));
        assert!(chunks[0].contains("bagging for $10 extra"));
        assert!(!chunks[0].contains("0:02"));
        assert!(!chunks[0].contains("0:05"));
    }

    #[test]
    fn test_timestamp_alone_does_not_flush_small_buffer() {
        let chunks = chunk("first line\n0:10\nsecond line", 500);
        // Buffer was under the cap at the timestamp, so both lines stay
        // in one chunk.
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "first line second line");
    }

    #[test]
    fn test_timestamp_flushes_oversized_buffer() {
        let long_line = "x".repeat(60);
        let input = format!("{long_line}\n1:00\nafter the break");
        let chunks = chunk(&input, 50);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], long_line);
        assert_eq!(chunks[1], "after the break");
    }

    #[test]
    fn test_flush_on_cross_not_batched() {
        // Three short dialogue lines, a timestamp, then 400+ more chars:
        // with max_size 500 the flush must happen right after the line
        // that crosses the mark.
        let short = "We can start next Tuesday if that works for you."; // 48 chars
        let long = "y".repeat(450);
        let tail = "z".repeat(450);
        let input = format!("{short}\n{short}\n{short}\n0:42\n{long}\n{tail}");
        let chunks = chunk(&input, 500);

        assert_eq!(chunks.len(), 2);
        // First chunk crossed 500 with the `long` line and flushed
        // immediately, so it never absorbed `tail`.
        let first_len = chunks[0].chars().count();
        assert!(first_len > 500, "first chunk should cross the cap, got {first_len}");
        assert!(!chunks[0].contains('z'));
        assert_eq!(chunks[1], tail);
    }

    #[test]
    fn test_chunk_may_exceed_cap_by_last_line_only() {
        let line = "a".repeat(80);
        let input = format!("{line}\n{line}\n{line}");
        let chunks = chunk(&input, 100);
        for c in &chunks {
            let len = c.chars().count();
            // 80-char line + separator on top of a <=100 buffer
            assert!(len <= 100 + 81, "chunk too large: {len}");
        }
    }

    #[test]
    fn test_no_timestamps_chunks_by_size() {
        let line = "word ".repeat(30); // 150 chars
        let input = vec![line.trim_end(); 10].join("\n");
        let chunks = chunk(&input, 300);
        assert!(chunks.len() >= 3);
        for c in &chunks {
            assert!(!c.trim().is_empty());
        }
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(chunk("", 500).is_empty());
        assert!(chunk("   \n\n   \n", 500).is_empty());
        assert!(chunk("0:01\n0:02\n0:03", 500).is_empty());
    }

    #[test]
    fn test_all_chunks_have_nonzero_trimmed_length() {
        let input = "0:01\nalpha\n\n0:02\nbeta\n   \ngamma";
        for c in chunk(input, 10) {
            assert!(!c.trim().is_empty());
            assert_eq!(c, c.trim());
        }
    }

    #[test]
    fn test_content_reconstruction() {
        // Joining the chunks with single spaces must reproduce the
        // timestamp-stripped line stream, in order, nothing lost or
        // duplicated.
        let lines = [
            "The quarterly numbers look strong.",
            "0:15",
            "Can you walk me through the renewal terms?",
            "Sure, the contract renews annually in March.",
            "1:02",
            "And the discount applies to the first year only.",
        ];
        let input = lines.join("\n");
        let chunks = chunk(&input, 40);

        let rebuilt = chunks.join(" ");
        let expected: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| !is_timestamp_line(l))
            .collect();
        assert_eq!(rebuilt, expected.join(" "));
    }

    #[test]
    fn test_chunk_all_preserves_order() {
        let a = "first transcript line";
        let b = "second transcript line";
        let chunks = chunk_all([a, b], 500);
        assert_eq!(chunks, vec![a.to_string(), b.to_string()]);
    }
}

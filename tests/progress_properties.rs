// tests/progress_properties.rs

use proptest::prelude::*;
use render_driver::progress::{LineSplitter, PbrtProgressParser, ProgressParser};

proptest! {
    /// However the byte stream is chunked, the same lines come out.
    #[test]
    fn splitter_is_chunking_independent(
        lines in prop::collection::vec("[a-zA-Z0-9 .:+\\[\\]()|]{0,20}", 1..8),
        terminators in prop::collection::vec(prop::bool::ANY, 8),
        chunk in 1usize..16,
    ) {
        let mut stream = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            stream.extend_from_slice(line.as_bytes());
            stream.push(if terminators[i] { b'\r' } else { b'\n' });
        }

        let mut splitter = LineSplitter::new();
        let mut out = Vec::new();
        for piece in stream.chunks(chunk) {
            splitter.push(piece);
            while let Some(line) = splitter.next_line() {
                out.push(line);
            }
        }

        prop_assert_eq!(out, lines);
        prop_assert_eq!(splitter.finish(), None);
    }

    /// Any well-formed in-progress line parses back to its numbers.
    #[test]
    fn in_progress_lines_round_trip(
        done in 0usize..40,
        todo in 0usize..40,
        elapsed in 0u32..100_000,
        remaining in 0u32..100_000,
    ) {
        let elapsed = f64::from(elapsed) / 10.0;
        let remaining = f64::from(remaining) / 10.0;
        let line = format!(
            "Rendering: [{}{}]  ({elapsed:.1}s|{remaining:.1}s)",
            "+".repeat(done),
            " ".repeat(todo),
        );

        let parsed = PbrtProgressParser.parse_line(&line).expect("line should parse");
        prop_assert!((parsed.elapsed_secs - elapsed).abs() < 1e-9);
        prop_assert!((parsed.remaining_secs - remaining).abs() < 1e-9);
    }

    /// Lines without the `Rendering: [` marker never produce progress.
    #[test]
    fn unrelated_text_never_parses(line in "[^R]{0,60}") {
        prop_assert_eq!(PbrtProgressParser.parse_line(&line), None);
    }
}

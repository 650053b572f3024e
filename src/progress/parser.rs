// src/progress/parser.rs

use once_cell::sync::Lazy;
use regex::Regex;

use super::ProgressSnapshot;

/// Narrow seam between the pipeline and whatever reports render progress.
///
/// Scraping console output is the only implementation today; a structured
/// status channel can replace it without touching the pipeline.
pub trait ProgressParser: Send + Sync {
    /// Parse a single line. `None` means "no progress information here".
    fn parse_line(&self, line: &str) -> Option<ProgressSnapshot>;
}

// Rendering: [++++++              ]  (0.8s|1.1s)
static IN_PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Rendering: \[\+* *\]\s+\((?P<elapsed>[^()|]*)s\|(?P<remaining>[^()|]*)s\)")
        .expect("in-progress pattern is valid")
});

// Rendering: [++++++++++++++++++++]  (2.0s)
static FINISHED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Rendering: \[\+* *\]\s+\((?P<elapsed>[^()|]*)s\)")
        .expect("final pattern is valid")
});

/// Parser for pbrt's `ProgressReporter` console line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PbrtProgressParser;

impl ProgressParser for PbrtProgressParser {
    fn parse_line(&self, line: &str) -> Option<ProgressSnapshot> {
        if let Some(caps) = IN_PROGRESS.captures(line) {
            let elapsed = parse_secs(&caps["elapsed"])?;
            let remaining = parse_secs(&caps["remaining"])?;
            return Some(ProgressSnapshot::new(elapsed, remaining));
        }
        if let Some(caps) = FINISHED.captures(line) {
            let elapsed = parse_secs(&caps["elapsed"])?;
            return Some(ProgressSnapshot::new(elapsed, 0.0));
        }
        None
    }
}

/// Seconds field of a progress line.
///
/// Stricter than a plain float parse: `NaN`, `inf` and negative values parse
/// as `f64` but are rejected too, so published snapshots always hold finite,
/// non-negative seconds that serialize as JSON numbers.
fn parse_secs(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

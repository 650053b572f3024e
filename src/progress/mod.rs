// src/progress/mod.rs

//! Renderer progress extraction.
//!
//! `pbrt` reports progress by redrawing one terminal line with carriage
//! returns. This module turns that byte stream into [`ProgressSnapshot`]s:
//!
//! - [`splitter`] cuts the stream into lines on `\r` or `\n`.
//! - [`parser`] holds the [`ProgressParser`] trait and the regex-based
//!   [`PbrtProgressParser`] that understands pbrt's console format.
//! - [`pump_progress`] drives both, tees raw bytes into the run log, and
//!   publishes each parsed snapshot.
//!
//! Unparseable lines are dropped; they never fail a run.

pub mod parser;
pub mod splitter;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{trace, warn};

pub use parser::{PbrtProgressParser, ProgressParser};
pub use splitter::LineSplitter;

/// Latest elapsed/remaining estimate reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub elapsed_secs: f64,
    pub remaining_secs: f64,
}

impl ProgressSnapshot {
    pub fn new(elapsed_secs: f64, remaining_secs: f64) -> Self {
        Self {
            elapsed_secs,
            remaining_secs,
        }
    }

    /// Fraction of the render done, if it can be estimated.
    pub fn fraction_done(&self) -> Option<f64> {
        let total = self.elapsed_secs + self.remaining_secs;
        (total > 0.0).then(|| self.elapsed_secs / total)
    }
}

const READ_CHUNK: usize = 4096;

/// Read `reader` to EOF, publishing every parsed snapshot into `publish`.
///
/// Each chunk is written verbatim to `tee` (the run log) before parsing. A
/// failing tee is logged and dropped; progress extraction carries on.
pub async fn pump_progress<R, W, P>(
    mut reader: R,
    parser: &P,
    publish: &watch::Sender<Option<ProgressSnapshot>>,
    mut tee: Option<W>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    P: ProgressParser + ?Sized,
{
    let mut buf = [0u8; READ_CHUNK];
    let mut splitter = LineSplitter::new();

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        if let Some(out) = tee.as_mut() {
            if let Err(e) = out.write_all(&buf[..n]).await {
                warn!(error = %e, "failed to tee renderer output into run log; continuing without it");
                tee = None;
            }
        }

        splitter.push(&buf[..n]);
        while let Some(line) = splitter.next_line() {
            apply_line(parser, publish, &line);
        }
    }

    if let Some(rest) = splitter.finish() {
        apply_line(parser, publish, &rest);
    }

    if let Some(mut out) = tee {
        out.flush().await?;
    }
    Ok(())
}

fn apply_line<P>(parser: &P, publish: &watch::Sender<Option<ProgressSnapshot>>, line: &str)
where
    P: ProgressParser + ?Sized,
{
    match parser.parse_line(line) {
        Some(snapshot) => {
            trace!(?snapshot, "renderer progress");
            publish.send_replace(Some(snapshot));
        }
        None => trace!(line, "renderer output without progress"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pump_publishes_latest_snapshot_and_tees_bytes() {
        let stream: &[u8] = b"Parsing scene...\n\
            Rendering: [+++                ]  (1.0s|3.0s)\r\
            Rendering: [++++++++           ]  (2.0s|2.0s)\r\
            Rendering: [+++++++++++++++++++]  (4.5s)\n";
        let (tx, rx) = watch::channel(None);
        let mut log = Vec::new();

        pump_progress(stream, &PbrtProgressParser, &tx, Some(&mut log))
            .await
            .unwrap();

        assert_eq!(*rx.borrow(), Some(ProgressSnapshot::new(4.5, 0.0)));
        assert_eq!(log, stream);
    }

    #[tokio::test]
    async fn unterminated_tail_is_still_parsed() {
        let stream: &[u8] = b"Rendering: [++++    ]  (0.5s|1.5s)";
        let (tx, rx) = watch::channel(None);

        pump_progress(stream, &PbrtProgressParser, &tx, None::<Vec<u8>>)
            .await
            .unwrap();

        assert_eq!(*rx.borrow(), Some(ProgressSnapshot::new(0.5, 1.5)));
    }

    #[tokio::test]
    async fn garbage_leaves_previous_snapshot_in_place() {
        let stream: &[u8] = b"Rendering: [+   ]  (1.0s|9.0s)\rRendering: [++  ]  (xs|ys)\rwarning: something\n";
        let (tx, rx) = watch::channel(None);

        pump_progress(stream, &PbrtProgressParser, &tx, None::<Vec<u8>>)
            .await
            .unwrap();

        assert_eq!(*rx.borrow(), Some(ProgressSnapshot::new(1.0, 9.0)));
    }

    #[test]
    fn fraction_done_handles_zero_total() {
        assert_eq!(ProgressSnapshot::new(0.0, 0.0).fraction_done(), None);
        assert_eq!(ProgressSnapshot::new(1.0, 3.0).fraction_done(), Some(0.25));
    }
}

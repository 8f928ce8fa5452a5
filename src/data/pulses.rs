//! Reading a pulses file back into discrete traces.
//!
//! Parsing is lenient: blank lines are ignored and lines that are not three
//! numeric fields are dropped, but every dropped line is counted in
//! [`PulseSet::skipped_lines`].

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::model::{PulseSet, PulseTrace};

/// First field prefix that opens a new segment.
const MARKER_PREFIX: &str = "start";

#[derive(Debug, thiserror::Error)]
pub enum PulseReadError {
    #[error("failed to open pulses file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read pulses file: {0}")]
    Read(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Line {
    Blank,
    Marker,
    Sample { time: f64, current: f64, voltage: f64 },
    Malformed,
}

/// Classify one record. Fields are already trimmed; empty fields at either
/// end are ignored so `"1\t2\t3\t"` reads like `"1\t2\t3"`.
fn classify<'a>(fields: impl Iterator<Item = &'a str>) -> Line {
    let fields: Vec<&str> = fields.collect();
    let first = fields.iter().position(|f| !f.is_empty());
    let last = fields.iter().rposition(|f| !f.is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Line::Blank;
    };
    let fields = &fields[first..=last];

    if fields[0].starts_with(MARKER_PREFIX) {
        return Line::Marker;
    }
    let [t, i, v] = fields else {
        return Line::Malformed;
    };
    match (t.parse(), i.parse(), v.parse()) {
        (Ok(time), Ok(current), Ok(voltage)) => Line::Sample {
            time,
            current,
            voltage,
        },
        _ => Line::Malformed,
    }
}

// ---------------------------------------------------------------------------
// Segment state machine
// ---------------------------------------------------------------------------

/// Either nothing has been collected since the last marker, or a trace is
/// being filled.
#[derive(Debug)]
enum ParseState {
    Empty,
    Accumulating(PulseTrace),
}

#[derive(Debug)]
struct SegmentParser {
    state: ParseState,
    set: PulseSet,
}

impl SegmentParser {
    fn new() -> Self {
        Self {
            state: ParseState::Empty,
            set: PulseSet::default(),
        }
    }

    fn feed(&mut self, line: Line) {
        match line {
            Line::Blank => {}
            Line::Malformed => self.set.skipped_lines += 1,
            Line::Marker => self.flush(),
            Line::Sample {
                time,
                current,
                voltage,
            } => match &mut self.state {
                ParseState::Accumulating(trace) => trace.push(time, current, voltage),
                ParseState::Empty => {
                    let mut trace = PulseTrace::default();
                    trace.push(time, current, voltage);
                    self.state = ParseState::Accumulating(trace);
                }
            },
        }
    }

    /// Emit the trace under construction, if any, and reset.
    fn flush(&mut self) {
        if let ParseState::Accumulating(trace) = std::mem::replace(&mut self.state, ParseState::Empty) {
            self.set.pulses.push(trace);
        }
    }

    /// End of input: the last segment has no closing marker.
    fn finish(mut self) -> PulseSet {
        self.flush();
        self.set
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read pulses from any TSV source. The first line is the header and is
/// skipped unread.
pub fn read_pulses_from<R: Read>(reader: R) -> Result<PulseSet, PulseReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut parser = SegmentParser::new();
    for result in reader.records() {
        let line = match result {
            Ok(record) => classify(record.iter()),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => Line::Malformed,
            Err(e) => return Err(e.into()),
        };
        parser.feed(line);
    }
    Ok(parser.finish())
}

/// Read pulses from a file on disk.
pub fn read_pulses(path: &Path) -> Result<PulseSet, PulseReadError> {
    let file = File::open(path).map_err(|source| PulseReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_pulses_from(file)
}

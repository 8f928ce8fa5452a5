//! Tab-separated pulses file writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::model::PulseSegment;
use crate::error::{ExtractError, Result};

/// Column names written once at the top of the file.
pub const HEADER: [&str; 3] = ["time", "current", "voltage"];
/// First field of the line that opens every segment.
pub const MARKER: &str = "start";

/// Streams pulse segments into one TSV file.
///
/// ```text
/// time    current voltage
/// start
/// 0.0     12.0    5.2
/// ...
/// ```
pub struct PulseWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl PulseWriter<BufWriter<File>> {
    /// Create (or truncate) the pulses file at `path` and write the header.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| ExtractError::OutputCreate {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> PulseWriter<W> {
    /// Wrap `writer` and emit the header line.
    pub fn new(writer: W) -> Result<Self> {
        let mut inner = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(writer);
        inner.write_record(HEADER)?;
        Ok(Self { inner })
    }

    /// Write one marker line followed by one line per sample.
    ///
    /// Returns the number of sample lines written.
    pub fn write_segment(&mut self, segment: &PulseSegment) -> Result<usize> {
        self.inner.write_record([MARKER, "", ""])?;
        let mut written = 0;
        while let Some(row) = segment.row(written) {
            self.inner.write_record(&row)?;
            written += 1;
        }
        Ok(written)
    }

    /// Flush buffered lines and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| ExtractError::OutputIo(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn finish_to_string(writer: PulseWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn header_only_when_nothing_written() {
        let writer = PulseWriter::new(Vec::new()).unwrap();
        assert_eq!(finish_to_string(writer), "time\tcurrent\tvoltage\n");
    }

    #[test]
    fn segments_follow_marker_lines() {
        let mut writer = PulseWriter::new(Vec::new()).unwrap();
        let first = PulseSegment {
            time: Column::F64(vec![0.0, 0.5]),
            current: Column::Int(vec![12, 13]),
            voltage: Column::F32(vec![1.25, 1.5]),
        };
        let second = PulseSegment {
            time: Column::F64(vec![0.0]),
            current: Column::F64(vec![-3.0]),
            voltage: Column::F64(vec![1e-7]),
        };
        assert_eq!(writer.write_segment(&first).unwrap(), 2);
        assert_eq!(writer.write_segment(&second).unwrap(), 1);

        assert_eq!(
            finish_to_string(writer),
            "time\tcurrent\tvoltage\n\
             start\t\t\n\
             0.0\t12\t1.25\n\
             0.5\t13\t1.5\n\
             start\t\t\n\
             0.0\t-3.0\t1e-07\n"
        );
    }
}

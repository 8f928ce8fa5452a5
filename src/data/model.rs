use std::ops::RangeInclusive;

// ---------------------------------------------------------------------------
// Column – one channel of samples in its stored numeric form
// ---------------------------------------------------------------------------

/// A single channel of samples, kept in the numeric kind it was stored with so
/// that it is written back out in its natural decimal form.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    F64(Vec<f64>),
    F32(Vec<f32>),
    /// Signed and unsigned integer dtypes, widened to `i64`.
    Int(Vec<i64>),
}

impl Column {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Column::F64(v) => v.len(),
            Column::F32(v) => v.len(),
            Column::Int(v) => v.len(),
        }
    }

    /// Whether the column holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample `i` formatted the way it is written to the pulses file:
    /// integers without a fractional part, floats in shortest round-trip form
    /// (always with a decimal point or exponent, e.g. `0.0`, `1.5`, `1e-05`).
    pub fn format_value(&self, i: usize) -> Option<String> {
        match self {
            Column::F64(v) => v.get(i).map(|x| float_repr(format!("{x:?}"))),
            Column::F32(v) => v.get(i).map(|x| float_repr(format!("{x:?}"))),
            Column::Int(v) => v.get(i).map(|x| x.to_string()),
        }
    }

    /// Copy of the samples in `range` (inclusive). The range must lie inside
    /// the column.
    pub fn slice(&self, range: RangeInclusive<usize>) -> Column {
        match self {
            Column::F64(v) => Column::F64(v[range].to_vec()),
            Column::F32(v) => Column::F32(v[range].to_vec()),
            Column::Int(v) => Column::Int(v[range].to_vec()),
        }
    }

    /// Shift every sample so the first one becomes zero.
    ///
    /// 32-bit floats stay 32-bit; integers become 64-bit floats.
    pub fn rebased(&self) -> Column {
        match self {
            Column::F64(v) => {
                let t0 = v.first().copied().unwrap_or(0.0);
                Column::F64(v.iter().map(|&t| t - t0).collect())
            }
            Column::F32(v) => {
                let t0 = v.first().copied().unwrap_or(0.0);
                Column::F32(v.iter().map(|&t| t - t0).collect())
            }
            Column::Int(v) => {
                let t0 = v.first().map(|&t| t as f64).unwrap_or(0.0);
                Column::F64(v.iter().map(|&t| t as f64 - t0).collect())
            }
        }
    }
}

/// Rewrite Rust's shortest float form into NumPy's: signed exponent of at
/// least two digits (`1e-7` -> `1e-07`, `1e16` -> `1e+16`) and lowercase `nan`.
fn float_repr(debug: String) -> String {
    if debug == "NaN" {
        return "nan".to_string();
    }
    let Some((mantissa, exponent)) = debug.split_once('e') else {
        return debug;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

// ---------------------------------------------------------------------------
// Index ranges
// ---------------------------------------------------------------------------

/// An inclusive index range as requested in a selection, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: i64,
    pub end: i64,
}

/// An inclusive index range guaranteed to lie inside `[0, n-1]` with
/// `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Clamp both bounds into `[0, n-1]`.
    ///
    /// Returns `None` when `n == 0` or when the clamped end falls before the
    /// clamped start.
    pub fn clamp(self, n: usize) -> Option<ClampedRange> {
        if n == 0 {
            return None;
        }
        let last = i64::try_from(n - 1).unwrap_or(i64::MAX);
        // Both values are in [0, last] so the conversions cannot fail.
        let start = usize::try_from(self.start.clamp(0, last)).ok()?;
        let end = usize::try_from(self.end.clamp(0, last)).ok()?;
        if end < start {
            return None;
        }
        Some(ClampedRange { start, end })
    }
}

impl ClampedRange {
    /// Number of samples covered by the range.
    pub fn sample_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn as_range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

// ---------------------------------------------------------------------------
// ArrayBundle – the three aligned channels of one source file
// ---------------------------------------------------------------------------

/// The time / voltage / current channels loaded from one source archive.
#[derive(Debug, Clone)]
pub struct ArrayBundle {
    pub time: Column,
    pub voltage: Column,
    pub current: Column,
}

impl ArrayBundle {
    /// Number of samples usable across all three channels.
    pub fn usable_len(&self) -> usize {
        self.time
            .len()
            .min(self.current.len())
            .min(self.voltage.len())
    }

    /// Cut out one pulse over `range` with time rebased to zero.
    ///
    /// `range` must come from [`IndexRange::clamp`] with `n = self.usable_len()`.
    pub fn segment(&self, range: ClampedRange) -> PulseSegment {
        let r = range.as_range();
        PulseSegment {
            time: self.time.slice(r.clone()).rebased(),
            current: self.current.slice(r.clone()),
            voltage: self.voltage.slice(r),
        }
    }
}

// ---------------------------------------------------------------------------
// PulseSegment – one extracted pulse, ready to be written
// ---------------------------------------------------------------------------

/// A sliced pulse with time starting at zero. All three columns have the
/// same length.
#[derive(Debug, Clone)]
pub struct PulseSegment {
    pub time: Column,
    pub current: Column,
    pub voltage: Column,
}

impl PulseSegment {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Row `k` as `[time, current, voltage]` strings.
    pub fn row(&self, k: usize) -> Option<[String; 3]> {
        Some([
            self.time.format_value(k)?,
            self.current.format_value(k)?,
            self.voltage.format_value(k)?,
        ])
    }
}

// ---------------------------------------------------------------------------
// PulseTrace / PulseSet – pulses read back from a pulses file
// ---------------------------------------------------------------------------

/// One pulse reconstructed from a pulses file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PulseTrace {
    pub time: Vec<f64>,
    pub current: Vec<f64>,
    /// Parsed but not plotted unless the viewer asks for it.
    pub voltage: Vec<f64>,
}

impl PulseTrace {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn push(&mut self, time: f64, current: f64, voltage: f64) {
        self.time.push(time);
        self.current.push(current);
        self.voltage.push(voltage);
    }
}

/// All pulses read from one pulses file, in file order.
#[derive(Debug, Clone, Default)]
pub struct PulseSet {
    pub pulses: Vec<PulseTrace>,
    /// Lines that were neither blank, a marker, nor three numeric fields.
    pub skipped_lines: usize,
}

impl PulseSet {
    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> ArrayBundle {
        ArrayBundle {
            time: Column::F64(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
            voltage: Column::F64(vec![5.0, 5.1, 5.2, 5.3, 5.4, 5.5]),
            current: Column::F64(vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]),
        }
    }

    #[test]
    fn floats_use_numpy_exponents() {
        let col = Column::F64(vec![0.0, 12.5, 1e-7, 1e16, -2.5e-5, 1.5e300, f64::NAN]);
        let text: Vec<String> = (0..col.len()).filter_map(|i| col.format_value(i)).collect();
        assert_eq!(
            text,
            ["0.0", "12.5", "1e-07", "1e+16", "-2.5e-05", "1.5e+300", "nan"]
        );
        assert_eq!(Column::F32(vec![1e-7]).format_value(0).as_deref(), Some("1e-07"));
        assert_eq!(Column::Int(vec![-3]).format_value(0).as_deref(), Some("-3"));
    }

    #[test]
    fn clamp_in_range_is_identity() {
        let r = IndexRange::new(2, 4).clamp(6).unwrap();
        assert_eq!(r, ClampedRange { start: 2, end: 4 });
        let again = IndexRange::new(r.start as i64, r.end as i64)
            .clamp(6)
            .unwrap();
        assert_eq!(again, r);
    }

    #[test]
    fn clamp_out_of_bounds_covers_everything() {
        let r = IndexRange::new(-5, 100).clamp(6).unwrap();
        assert_eq!(r, ClampedRange { start: 0, end: 5 });
        assert_eq!(r.sample_count(), 6);
    }

    #[test]
    fn clamp_inverted_is_rejected() {
        assert!(IndexRange::new(4, 2).clamp(6).is_none());
        // Both clamp to 5 -> single sample, not inverted.
        assert_eq!(
            IndexRange::new(10, 7).clamp(6),
            Some(ClampedRange { start: 5, end: 5 })
        );
        assert!(IndexRange::new(0, 0).clamp(0).is_none());
    }

    #[test]
    fn segment_rebases_time() {
        let mut b = bundle();
        b.time = Column::F64(vec![10.0, 10.5, 11.0, 11.5, 12.0, 12.5]);
        let seg = b.segment(IndexRange::new(2, 4).clamp(6).unwrap());
        assert_eq!(seg.len(), 3);
        assert_eq!(seg.time, Column::F64(vec![0.0, 0.5, 1.0]));
        assert_eq!(seg.current, Column::F64(vec![12.0, 13.0, 14.0]));
    }

    #[test]
    fn integer_time_rebases_to_float() {
        let col = Column::Int(vec![7, 8, 10]);
        assert_eq!(col.rebased(), Column::F64(vec![0.0, 1.0, 3.0]));
        assert_eq!(col.format_value(0).as_deref(), Some("7"));
        assert_eq!(col.rebased().format_value(0).as_deref(), Some("0.0"));
    }

    #[test]
    fn f32_stays_single_precision() {
        let col = Column::F32(vec![0.25, 0.5]);
        let rebased = col.rebased();
        assert_eq!(rebased, Column::F32(vec![0.0, 0.25]));
        assert_eq!(rebased.format_value(1).as_deref(), Some("0.25"));
    }

    #[test]
    fn usable_len_is_shortest_channel() {
        let mut b = bundle();
        b.voltage = Column::F64(vec![1.0, 2.0]);
        assert_eq!(b.usable_len(), 2);
    }
}

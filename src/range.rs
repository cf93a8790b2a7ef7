//! Per-bucket index ranges, to find the notes audible around a given time without scanning.

use crate::merge::NoteInterval;

/// The half-open range `[start, end)` of note indices audible during one bucket.
///
/// Empty buckets are reported as `RangeBucket::EMPTY`, that is `(0, 0)`. Since the range is
/// half-open this never aliases a non-empty range: a bucket covered only by note 0 is `(0, 1)`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct RangeBucket {
    pub start: u32,
    pub end: u32,
}
impl RangeBucket {
    pub const EMPTY: RangeBucket = RangeBucket { start: 0, end: 0 };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[inline]
    fn cover(&mut self, idx: u32) {
        if self.is_empty() {
            *self = RangeBucket {
                start: idx,
                end: idx + 1,
            };
        } else {
            self.start = self.start.min(idx);
            self.end = self.end.max(idx + 1);
        }
    }
}

/// Build the range index of `notes`, which must be sorted by start time.
///
/// Bucket `b` covers `[b * bucket, (b + 1) * bucket]` and reports the smallest and largest (plus
/// one) index of the notes audible in it, a note being audible from its start until `release`
/// seconds after its end. There are `ceil(max(time_end + release) / bucket)` buckets, and at
/// least one when there are notes.
pub fn build(notes: &[NoteInterval], bucket: f64, release: f64) -> Vec<RangeBucket> {
    if notes.is_empty() || !(bucket > 0.0) {
        return Vec::new();
    }
    let max_time = notes
        .iter()
        .map(|note| note.time_end + release)
        .fold(notes[0].time_begin, f64::max);
    let count = (max_time / bucket).ceil().max(1.0) as usize;
    let mut ranges = vec![RangeBucket::EMPTY; count];
    for (idx, note) in notes.iter().enumerate() {
        //Candidate buckets, refined below with the exact overlap test
        let first = ((note.time_begin / bucket).floor() as i64 - 1).max(0) as usize;
        let last = ((note.time_end + release) / bucket).floor().max(0.0) as usize;
        for b in first..=last.min(count - 1) {
            let (from, to) = (b as f64 * bucket, (b + 1) as f64 * bucket);
            if note.overlaps(from, to, release) {
                ranges[b].cover(idx as u32);
            }
        }
    }
    ranges
}

//! Bounded validation of table data.
//!
//! A `Sanitizer` is bound to one table blob for the lifetime of one
//! [`ApplyContext`](crate::aat::ApplyContext). Every range check and every
//! state machine step is charged against a fixed operation budget, so a
//! malicious table cannot make an application run forever.

/// The maximum number of operations a single table application may perform.
pub(crate) const MAX_OPS_MAX: i32 = 0x3FFF_FFFF;
/// The smallest budget granted while processing a blob.
pub(crate) const MAX_OPS_MIN: i32 = 16384;
const MAX_OPS_FACTOR: usize = 8;

#[cfg(test)]
std::thread_local! {
    pub(crate) static END_PROCESSING_CALLS: core::cell::Cell<usize> = core::cell::Cell::new(0);
}

#[derive(Clone, Debug)]
pub(crate) struct Sanitizer<'a> {
    blob: &'a [u8],
    num_glyphs: u32,
    max_ops: i32,
    processing: bool,
}

impl<'a> Sanitizer<'a> {
    pub fn new() -> Self {
        Sanitizer {
            blob: &[],
            num_glyphs: 0,
            max_ops: 0,
            processing: false,
        }
    }

    /// Binds the sanitizer to a blob.
    pub fn init(&mut self, blob: &'a [u8]) {
        self.blob = blob;
        self.processing = false;
    }

    pub fn set_num_glyphs(&mut self, n: u32) {
        self.num_glyphs = n;
    }

    pub fn num_glyphs(&self) -> u32 {
        self.num_glyphs
    }

    pub fn start_processing(&mut self) {
        let ops = self.blob.len().saturating_mul(MAX_OPS_FACTOR);
        self.max_ops = i32::try_from(ops)
            .unwrap_or(MAX_OPS_MAX)
            .clamp(MAX_OPS_MIN, MAX_OPS_MAX);
        self.processing = true;
    }

    pub fn end_processing(&mut self) {
        #[cfg(test)]
        END_PROCESSING_CALLS.with(|n| n.set(n.get() + 1));

        self.processing = false;
        self.blob = &[];
    }

    #[inline]
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn set_max_ops(&mut self, n: i32) {
        self.max_ops = n;
    }

    #[inline]
    pub fn max_ops(&self) -> i32 {
        self.max_ops
    }

    /// Charges `n` operations. Returns `false` once the budget is exhausted.
    #[inline]
    pub fn check_ops(&mut self, n: i32) -> bool {
        self.max_ops = self.max_ops.saturating_sub(n);
        self.max_ops > 0
    }

    /// Checks that `data` lies inside the bound blob.
    ///
    /// Contexts created without a blob accept any range.
    pub fn check_range(&mut self, data: &[u8]) -> bool {
        if !self.check_ops(1) {
            return false;
        }

        if self.blob.is_empty() {
            return true;
        }

        let start = self.blob.as_ptr() as usize;
        let end = start + self.blob.len();
        let p = data.as_ptr() as usize;
        start <= p && p <= end && data.len() <= end - p
    }

    /// Checks that a glyph id read from the table exists in the face.
    ///
    /// The deleted glyph marker is always accepted.
    #[inline]
    pub fn check_glyph(&self, glyph_id: u32) -> bool {
        glyph_id < self.num_glyphs || glyph_id == crate::aat::DELETED_GLYPH
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_scales_with_blob() {
        let data = [0u8; 4096];
        let mut s = Sanitizer::new();
        s.init(&data);
        s.start_processing();
        assert_eq!(s.max_ops(), 4096 * 8);
        assert!(s.is_processing());

        s.init(&data[..10]);
        s.start_processing();
        assert_eq!(s.max_ops(), MAX_OPS_MIN);
    }

    #[test]
    fn ops_exhaustion() {
        let mut s = Sanitizer::new();
        s.set_max_ops(3);
        assert!(s.check_ops(1));
        assert!(s.check_ops(1));
        assert!(!s.check_ops(1));
        assert!(!s.check_ops(1));
    }

    #[test]
    fn ranges() {
        let data = [0u8; 16];
        let other = [0u8; 4];
        let mut s = Sanitizer::new();
        s.init(&data);
        s.set_max_ops(MAX_OPS_MAX);

        assert!(s.check_range(&data[4..8]));
        assert!(s.check_range(&data[16..]));
        assert!(!s.check_range(&other));
    }

    #[test]
    fn glyphs() {
        let mut s = Sanitizer::new();
        s.set_num_glyphs(10);
        assert!(s.check_glyph(9));
        assert!(!s.check_glyph(10));
        assert!(s.check_glyph(0xFFFF));
    }
}

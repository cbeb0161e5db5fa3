use crate::buffer::Buffer;
use crate::sanitize::{Sanitizer, MAX_OPS_MAX};
use crate::tables::ankr;
use crate::{Face, Font, ShapePlan};

/// State shared by all subtables of one table application.
///
/// The sanitizer is bound to the table blob while the context is alive and
/// is released exactly once when the context is dropped, including on early
/// returns.
pub(crate) struct ApplyContext<'a> {
    pub plan: &'a ShapePlan,
    pub font: &'a Font<'a>,
    pub face: &'a Face<'a>,
    pub buffer: &'a mut Buffer,
    pub sanitizer: Sanitizer<'a>,
    pub ankr_table: Option<&'a ankr::Table<'a>>,
    pub ankr_end: usize,
    pub lookup_index: u32,
    pub debug_depth: u32,
}

impl<'a> ApplyContext<'a> {
    pub fn new(
        plan: &'a ShapePlan,
        font: &'a Font<'a>,
        buffer: &'a mut Buffer,
        blob: Option<&'a [u8]>,
    ) -> Self {
        let face = font.face();

        let mut sanitizer = Sanitizer::new();
        sanitizer.init(blob.unwrap_or(&[]));
        sanitizer.set_num_glyphs(face.number_of_glyphs());
        sanitizer.start_processing();
        sanitizer.set_max_ops(MAX_OPS_MAX);

        ApplyContext {
            plan,
            font,
            face,
            buffer,
            sanitizer,
            ankr_table: None,
            ankr_end: 0,
            lookup_index: 0,
            debug_depth: 0,
        }
    }

    pub fn set_ankr_table(&mut self, table: Option<&'a ankr::Table<'a>>) {
        self.ankr_table = table;
        self.ankr_end = table.map(|t| t.end()).unwrap_or(0);
    }

    /// Returns the anchor point of a glyph, or the origin when unavailable.
    pub fn anchor(&self, glyph_id: u32, index: u16) -> ankr::Anchor {
        let table = match self.ankr_table {
            Some(v) => v,
            None => return ankr::Anchor::default(),
        };

        u16::try_from(glyph_id)
            .ok()
            .and_then(|glyph| table.anchor(glyph, index, self.ankr_end))
            .unwrap_or_default()
    }
}

impl Drop for ApplyContext<'_> {
    fn drop(&mut self) {
        self.sanitizer.end_processing();
    }
}

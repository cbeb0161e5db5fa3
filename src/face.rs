use ttf_parser::{GlyphId, Tag};

use crate::tables::{ankr, feat, kerx, ltag, morx, trak};


/// Raw AAT table data.
///
/// Used to build a [`Face`] without a complete font file.
#[derive(Clone, Copy, Default, Debug)]
pub struct FaceTables<'a> {
    /// The `morx` table.
    pub morx: Option<&'a [u8]>,
    /// The `mort` table.
    pub mort: Option<&'a [u8]>,
    /// The `kerx` table.
    pub kerx: Option<&'a [u8]>,
    /// The `trak` table.
    pub trak: Option<&'a [u8]>,
    /// The `ankr` table.
    pub ankr: Option<&'a [u8]>,
    /// The `feat` table.
    pub feat: Option<&'a [u8]>,
    /// The `ltag` table.
    pub ltag: Option<&'a [u8]>,
}


/// A font face handle.
///
/// Holds the parsed AAT tables. Tables that fail to parse are treated as absent.
pub struct Face<'a> {
    ttfp_face: Option<ttf_parser::Face<'a>>,
    number_of_glyphs: u32,
    units_per_em: u16,
    pub(crate) raw: FaceTables<'a>,
    pub(crate) morx: Option<morx::Table<'a>>,
    pub(crate) mort: Option<morx::Table<'a>>,
    pub(crate) kerx: Option<kerx::Table<'a>>,
    pub(crate) trak: Option<trak::Table<'a>>,
    pub(crate) ankr: Option<ankr::Table<'a>>,
    pub(crate) feat: Option<feat::Table<'a>>,
    pub(crate) ltag: Option<ltag::Table<'a>>,
}

impl<'a> Face<'a> {
    /// Creates a new `Face` from font data.
    ///
    /// Data will be referenced, not owned.
    pub fn from_slice(data: &'a [u8], face_index: u32) -> Option<Self> {
        let ttfp_face = ttf_parser::Face::parse(data, face_index).ok()?;
        let raw_face = ttfp_face.raw_face();
        let tables = FaceTables {
            morx: raw_face.table(Tag::from_bytes(b"morx")),
            mort: raw_face.table(Tag::from_bytes(b"mort")),
            kerx: raw_face.table(Tag::from_bytes(b"kerx")),
            trak: raw_face.table(Tag::from_bytes(b"trak")),
            ankr: raw_face.table(Tag::from_bytes(b"ankr")),
            feat: raw_face.table(Tag::from_bytes(b"feat")),
            ltag: raw_face.table(Tag::from_bytes(b"ltag")),
        };

        let number_of_glyphs = u32::from(ttfp_face.number_of_glyphs());
        let units_per_em = ttfp_face.units_per_em();
        let mut face = Self::from_tables(number_of_glyphs, units_per_em, tables);
        face.ttfp_face = Some(ttfp_face);
        Some(face)
    }

    /// Creates a new `Face` from separate table data.
    ///
    /// Glyph advances are zero for such a face.
    pub fn from_tables(number_of_glyphs: u32, units_per_em: u16, tables: FaceTables<'a>) -> Self {
        fn parse<'a, T>(
            name: &str,
            data: Option<&'a [u8]>,
            f: impl FnOnce(&'a [u8]) -> Option<T>,
        ) -> Option<T> {
            let data = data?;
            let table = f(data);
            if table.is_none() {
                log::debug!("failed to parse the '{}' table", name);
            }

            table
        }

        let n = number_of_glyphs;
        Face {
            ttfp_face: None,
            number_of_glyphs,
            units_per_em: units_per_em.max(1),
            raw: tables,
            morx: parse("morx", tables.morx, |data| morx::Table::parse(data, n)),
            mort: parse("mort", tables.mort, |data| morx::Table::parse_obsolete(data, n)),
            kerx: parse("kerx", tables.kerx, |data| kerx::Table::parse(data, n)),
            trak: parse("trak", tables.trak, trak::Table::parse),
            ankr: parse("ankr", tables.ankr, |data| ankr::Table::parse(data, n)),
            feat: parse("feat", tables.feat, feat::Table::parse),
            ltag: parse("ltag", tables.ltag, ltag::Table::parse),
        }
    }

    /// Returns the number of glyphs.
    #[inline]
    pub fn number_of_glyphs(&self) -> u32 {
        self.number_of_glyphs
    }

    /// Returns the units per EM.
    #[inline]
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn glyph_advance(&self, glyph: GlyphId, is_vertical: bool) -> i32 {
        let face = match self.ttfp_face {
            Some(ref face) => face,
            None => return 0,
        };

        let advance = if is_vertical {
            face.glyph_ver_advance(glyph)
        } else {
            face.glyph_hor_advance(glyph)
        };

        i32::from(advance.unwrap_or(self.units_per_em))
    }
}


/// A face at a specific size.
pub struct Font<'a> {
    face: &'a Face<'a>,
    ptem: Option<f32>,
    x_scale: i32,
    y_scale: i32,
}

impl<'a> Font<'a> {
    /// Creates a new font with the scale set to the face's units per EM.
    pub fn new(face: &'a Face<'a>) -> Self {
        let upem = i32::from(face.units_per_em());
        Font {
            face,
            ptem: None,
            x_scale: upem,
            y_scale: upem,
        }
    }

    /// Returns the underlying face.
    #[inline]
    pub fn face(&self) -> &'a Face<'a> {
        self.face
    }

    /// Sets point size per EM.
    ///
    /// Used for tracking in Apple fonts.
    ///
    /// `None` by default.
    #[inline]
    pub fn set_points_per_em(&mut self, ptem: Option<f32>) {
        self.ptem = ptem;
    }

    /// Returns point size per EM.
    #[inline]
    pub fn points_per_em(&self) -> Option<f32> {
        self.ptem
    }

    /// Sets the output scale.
    ///
    /// Positions are reported in units of `scale / units_per_em`.
    #[inline]
    pub fn set_scale(&mut self, x_scale: i32, y_scale: i32) {
        self.x_scale = x_scale;
        self.y_scale = y_scale;
    }

    /// Returns the output scale.
    #[inline]
    pub fn scale(&self) -> (i32, i32) {
        (self.x_scale, self.y_scale)
    }

    #[inline]
    pub(crate) fn em_scale_x(&self, v: i32) -> i32 {
        self.em_scalef_x(v as f32)
    }

    #[inline]
    pub(crate) fn em_scale_y(&self, v: i32) -> i32 {
        self.em_scalef_y(v as f32)
    }

    #[inline]
    pub(crate) fn em_scalef_x(&self, v: f32) -> i32 {
        self.em_scalef(v, self.x_scale)
    }

    #[inline]
    pub(crate) fn em_scalef_y(&self, v: f32) -> i32 {
        self.em_scalef(v, self.y_scale)
    }

    fn em_scalef(&self, v: f32, scale: i32) -> i32 {
        crate::round(v * scale as f32 / f32::from(self.face.units_per_em)) as i32
    }

    pub(crate) fn glyph_h_advance(&self, glyph: GlyphId) -> i32 {
        self.em_scale_x(self.face.glyph_advance(glyph, false))
    }

    pub(crate) fn glyph_v_advance(&self, glyph: GlyphId) -> i32 {
        self.em_scale_y(self.face.glyph_advance(glyph, true))
    }
}

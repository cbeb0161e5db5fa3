//! In-memory font construction.

pub trait BeScalar: Copy {
    fn write_be(self, out: &mut Vec<u8>);
}

macro_rules! impl_be_scalar {
    ($($t:ty),+) => {
        $(
            impl BeScalar for $t {
                fn write_be(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_be_bytes());
                }
            }
        )+
    };
}

impl_be_scalar!(u8, i8, u16, i16, u32, i32);

/// Big-endian table data.
#[derive(Clone, Default, Debug)]
pub struct Data(Vec<u8>);

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, item: impl BeScalar) -> Self {
        item.write_be(&mut self.0);
        self
    }

    pub fn extend<T: BeScalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            item.write_be(&mut self.0);
        }
        self
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.0.extend_from_slice(data);
        self
    }

    pub fn len(&self) -> u32 {
        self.0.len() as u32
    }

    /// Overwrites a 32-bit value at a byte offset.
    pub fn patch_u32(mut self, offset: usize, value: u32) -> Self {
        self.0[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        self
    }
}

impl std::ops::Deref for Data {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}


/// A format 6 lookup with 16-bit values.
pub fn single_lookup(pairs: &[(u16, u16)]) -> Data {
    let mut d = Data::new()
        .push(6u16)
        .push(4u16)
        .push(pairs.len() as u16 + 1)
        .extend([0u16; 3]);
    for &(glyph, value) in pairs {
        d = d.push(glyph).push(value);
    }
    d.push(0xFFFFu16).push(0u16)
}

/// An extended state table where glyphs `first..=last` get class 4.
///
/// `extra` offsets follow the header and can be patched
/// with `Data::patch_u32` at `16 + 4 * index`.
pub fn state_table(glyphs: (u16, u16), states: &[u16], entries: &[u16], extra: &[u32]) -> Data {
    let classes = Data::new()
        .push(2u16)
        .push(6u16)
        .push(2u16)
        .extend([0u16; 3])
        .extend([glyphs.1, glyphs.0, 4])
        .extend([0xFFFFu16, 0xFFFF, 0]);
    let header_len = 16 + 4 * extra.len() as u32;
    let states_offset = header_len + classes.len();
    let entries_offset = states_offset + 2 * states.len() as u32;
    Data::new()
        .push(5u32)
        .push(header_len)
        .push(states_offset)
        .push(entries_offset)
        .extend(extra.iter().copied())
        .bytes(&classes)
        .extend(states.iter().copied())
        .extend(entries.iter().copied())
}

/// A `morx` table with one chain of subtables.
///
/// Each subtable is `(coverage, feature flags, data)`.
pub fn morx(default_flags: u32, features: &[(u16, u16, u32, u32)], subtables: &[(u32, u32, &[u8])]) -> Data {
    let mut chain = Data::new();
    for &(kind, setting, enable, disable) in features {
        chain = chain.extend([kind, setting]).extend([enable, disable]);
    }

    for &(coverage, flags, data) in subtables {
        chain = chain.push(12 + data.len() as u32).push(coverage).push(flags).bytes(data);
    }

    Data::new()
        .extend([2u16, 0])
        .push(1u32)
        .push(default_flags)
        .push(16 + chain.len())
        .push(features.len() as u32)
        .push(subtables.len() as u32)
        .bytes(&chain)
}

/// A `kerx` table with one subtable.
pub fn kerx(coverage: u32, data: &[u8]) -> Data {
    Data::new()
        .extend([2u16, 0])
        .push(1u32)
        .push(12 + data.len() as u32)
        .push(coverage)
        .push(0u32)
        .bytes(data)
}

/// A format 0 `kerx` subtable.
pub fn kerx_pairs(pairs: &[(u16, u16, i16)]) -> Data {
    let mut d = Data::new().extend([pairs.len() as u32, 12, 1, 0]);
    for &(left, right, value) in pairs {
        d = d.extend([left, right]).push(value);
    }
    d
}

/// A `trak` table with a single horizontal normal track.
pub fn trak(sizes: &[(i16, i16)]) -> Data {
    let n = sizes.len() as u16;
    // header (12) + track data (8) + one track (8)
    let sizes_offset = 28u32;
    let values_offset = sizes_offset + 4 * u32::from(n);
    let mut d = Data::new()
        .push(0x0001_0000u32)
        .push(0u16)
        .push(12u16)
        .push(0u16)
        .push(0u16)
        .extend([1u16, n])
        .push(sizes_offset)
        .push(0u32)
        .push(256u16)
        .push(values_offset as u16);
    for &(size, _) in sizes {
        d = d.push(i32::from(size) << 16);
    }
    for &(_, value) in sizes {
        d = d.push(value);
    }
    d
}


/// A `feat` table. Each feature is `(type, flags, settings)`,
/// features must be sorted by type.
pub fn feat(features: &[(u16, u16, &[(u16, i16)])]) -> Data {
    let mut names = Data::new();
    let mut settings = Data::new();
    let settings_start = 12 + 12 * features.len() as u32;
    for (i, &(kind, flags, list)) in features.iter().enumerate() {
        names = names
            .extend([kind, list.len() as u16])
            .push(settings_start + settings.len())
            .push(flags)
            .push(256 + i as i16);
        for &(setting, name) in list {
            settings = settings.push(setting).push(name);
        }
    }

    Data::new()
        .push(0x0001_0000u32)
        .push(features.len() as u16)
        .extend([0u16; 3])
        .bytes(&names)
        .bytes(&settings)
}

/// An `ltag` table.
pub fn ltag(tags: &[&str]) -> Data {
    let mut ranges = Data::new();
    let mut strings = Data::new();
    let strings_start = 12 + 4 * tags.len() as u32;
    for tag in tags {
        ranges = ranges
            .push((strings_start + strings.len()) as u16)
            .push(tag.len() as u16);
        strings = strings.bytes(tag.as_bytes());
    }

    Data::new()
        .push(1u32)
        .push(0u32)
        .push(tags.len() as u32)
        .bytes(&ranges)
        .bytes(&strings)
}


/// Builds a TrueType font with horizontal metrics and extra tables.
pub struct FontBuilder {
    units_per_em: u16,
    advances: Vec<u16>,
    tables: Vec<([u8; 4], Vec<u8>)>,
}

impl FontBuilder {
    /// Every glyph gets the same advance.
    pub fn new(number_of_glyphs: u16, advance: u16) -> Self {
        FontBuilder {
            units_per_em: 1000,
            advances: vec![advance; usize::from(number_of_glyphs)],
            tables: Vec::new(),
        }
    }

    pub fn table(mut self, tag: &[u8; 4], data: &[u8]) -> Self {
        self.tables.push((*tag, data.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let num_glyphs = self.advances.len() as u16;

        let head = Data::new()
            .push(0x0001_0000u32) // version
            .push(0x0001_0000u32) // revision
            .push(0u32) // checksum adjustment
            .push(0x5F0F_3CF5u32) // magic
            .push(0u16) // flags
            .push(self.units_per_em)
            .extend([0u32; 4]) // created, modified
            .extend([0i16, 0, 1000, 1000]) // bbox
            .extend([0u16, 8]) // style, lowest ppem
            .push(2i16) // direction hint
            .push(0u16) // index to loc format
            .push(0u16); // glyph data format

        let hhea = Data::new()
            .push(0x0001_0000u32)
            .extend([800i16, -200, 0])
            .push(1000u16) // max advance
            .extend([0i16; 11])
            .push(num_glyphs);

        let maxp = Data::new().push(0x0000_5000u32).push(num_glyphs);

        let mut hmtx = Data::new();
        for advance in &self.advances {
            hmtx = hmtx.push(*advance).push(0i16);
        }

        let mut tables = self.tables;
        tables.push((*b"head", head.0));
        tables.push((*b"hhea", hhea.0));
        tables.push((*b"hmtx", hmtx.0));
        tables.push((*b"maxp", maxp.0));
        // Table records must be sorted for lookups by tag.
        tables.sort_by(|a, b| a.0.cmp(&b.0));

        let count = tables.len() as u16;
        let mut offset = 12 + 16 * u32::from(count);
        let mut directory = Data::new()
            .push(0x0001_0000u32)
            .push(count)
            .extend([0u16; 3]);
        let mut body = Vec::new();
        for (tag, data) in &tables {
            directory = directory
                .bytes(tag)
                .push(0u32)
                .push(offset)
                .push(data.len() as u32);

            body.extend_from_slice(data);
            while body.len() % 4 != 0 {
                body.push(0);
            }
            offset = 12 + 16 * u32::from(count) + body.len() as u32;
        }

        let mut font = directory.0;
        font.extend_from_slice(&body);
        font
    }
}

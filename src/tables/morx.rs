// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6morx.html
// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6mort.html

use ttf_parser::parser::{FromData, LazyArray32, NumFrom, Offset, Offset16, Offset32, Stream};

use crate::Mask;
use crate::tables::aat;


/// A `morx` or `mort` table.
///
/// Both share the same layout, `mort` using narrower counters and
/// the obsolete state tables.
#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    version: u16,
    count: u32,
    chains_data: &'a [u8],
    extended: bool,
    number_of_glyphs: u32,
}

impl<'a> Table<'a> {
    /// Parses a `morx` table.
    pub fn parse(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        Self::parse_impl(data, number_of_glyphs, true)
    }

    /// Parses a `mort` table.
    pub fn parse_obsolete(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        Self::parse_impl(data, number_of_glyphs, false)
    }

    fn parse_impl(data: &'a [u8], number_of_glyphs: u32, extended: bool) -> Option<Self> {
        let mut s = Stream::new(data);

        let version: u16 = s.read()?;
        if version < if extended { 2 } else { 1 } {
            return None;
        }

        s.skip::<u16>(); // reserved
        let count: u32 = s.read()?;

        Some(Table {
            version,
            count,
            chains_data: s.tail()?,
            extended,
            number_of_glyphs,
        })
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        self.version != 0
    }

    #[inline]
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn chains(&self) -> Chains<'a> {
        Chains {
            index: 0,
            len: self.count,
            stream: Stream::new(self.chains_data),
            extended: self.extended,
            number_of_glyphs: self.number_of_glyphs,
        }
    }
}


#[derive(Clone, Copy)]
pub struct Chains<'a> {
    index: u32,
    len: u32,
    stream: Stream<'a>,
    extended: bool,
    number_of_glyphs: u32,
}

impl<'a> Iterator for Chains<'a> {
    type Item = Chain<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.len {
            return None;
        }

        if self.stream.at_end() {
            return None;
        }

        self.index += 1;

        let default_flags: u32 = self.stream.read()?;
        let len: u32 = self.stream.read()?;
        let (features_count, subtables_count, header_len) = if self.extended {
            (self.stream.read::<u32>()?, self.stream.read::<u32>()?, 16)
        } else {
            let features: u16 = self.stream.read()?;
            let subtables: u16 = self.stream.read()?;
            (u32::from(features), u32::from(subtables), 12)
        };

        let features: LazyArray32<Feature> = self.stream.read_array32(features_count)?;

        let len = usize::num_from(len)
            .checked_sub(header_len)?
            .checked_sub(Feature::SIZE * usize::num_from(features_count))?;

        let subtables_data = self.stream.read_bytes(len)?;

        Some(Chain {
            default_flags,
            features,
            subtables_count,
            subtables_data,
            extended: self.extended,
            number_of_glyphs: self.number_of_glyphs,
        })
    }
}


#[derive(Clone, Copy)]
pub struct Chain<'a> {
    default_flags: Mask,
    features: LazyArray32<'a, Feature>,
    subtables_count: u32,
    subtables_data: &'a [u8],
    extended: bool,
    number_of_glyphs: u32,
}

impl<'a> Chain<'a> {
    pub fn default_flags(&self) -> Mask {
        self.default_flags
    }

    pub fn features(&self) -> LazyArray32<'a, Feature> {
        self.features
    }

    pub fn subtables(&self) -> Subtables<'a> {
        Subtables {
            index: 0,
            len: self.subtables_count,
            stream: Stream::new(self.subtables_data),
            extended: self.extended,
            number_of_glyphs: self.number_of_glyphs,
        }
    }
}


#[derive(Clone, Copy, Debug)]
pub struct Feature {
    pub kind: u16,
    pub setting: u16,
    pub enable_flags: u32,
    pub disable_flags: u32,
}

impl FromData for Feature {
    const SIZE: usize = 12;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Feature {
            kind: s.read()?,
            setting: s.read()?,
            enable_flags: s.read()?,
            disable_flags: s.read()?,
        })
    }
}


#[derive(Clone, Copy)]
pub struct Subtables<'a> {
    index: u32,
    len: u32,
    stream: Stream<'a>,
    extended: bool,
    number_of_glyphs: u32,
}

impl<'a> Iterator for Subtables<'a> {
    type Item = Subtable<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.len {
            return None;
        }

        if self.stream.at_end() {
            return None;
        }

        self.index += 1;

        let (len, coverage, kind, header_len) = if self.extended {
            let len: u32 = self.stream.read()?;
            let coverage: u32 = self.stream.read()?;
            (usize::num_from(len), (coverage >> 24) as u8, coverage as u8, 12)
        } else {
            let len: u16 = self.stream.read()?;
            let coverage: u16 = self.stream.read()?;
            (usize::from(len), (coverage >> 8) as u8, coverage as u8, 8)
        };
        let feature_flags: u32 = self.stream.read()?;

        let len = len.checked_sub(header_len)?;
        let data = self.stream.read_bytes(len)?;

        // A subtable we can't parse is skipped, the rest of the chain still applies.
        let parsed = SubtableKind::parse(kind, data, self.extended, self.number_of_glyphs);
        if parsed.is_none() {
            log::debug!("skipping malformed or unsupported subtable of type {}", kind);
        }

        Some(Subtable {
            kind: parsed,
            data,
            coverage,
            feature_flags,
        })
    }
}

pub struct Subtable<'a> {
    /// `None` for unknown or malformed subtables.
    pub kind: Option<SubtableKind<'a>>,
    pub data: &'a [u8],
    pub coverage: u8,
    pub feature_flags: u32,
}

impl Subtable<'_> {
    pub fn is_logical(&self) -> bool {
        self.coverage & 0x10 != 0
    }

    pub fn is_all_directions(&self) -> bool {
        self.coverage & 0x20 != 0
    }

    pub fn is_backwards(&self) -> bool {
        self.coverage & 0x40 != 0
    }

    pub fn is_vertical(&self) -> bool {
        self.coverage & 0x80 != 0
    }
}


pub enum SubtableKind<'a> {
    Rearrangement(aat::StateTable<'a>),
    Contextual(ContextualSubtable<'a>),
    Ligature(LigatureSubtable<'a>),
    NonContextual(aat::Lookup<'a>),
    Insertion(InsertionSubtable<'a>),
}

impl<'a> SubtableKind<'a> {
    fn parse(kind: u8, data: &'a [u8], extended: bool, number_of_glyphs: u32) -> Option<Self> {
        let kind = match kind {
            0 => {
                SubtableKind::Rearrangement(parse_machine(data, extended, number_of_glyphs)?)
            }
            1 => {
                let table = ContextualSubtable::parse(data, extended, number_of_glyphs)?;
                SubtableKind::Contextual(table)
            }
            2 => {
                let table = LigatureSubtable::parse(data, extended, number_of_glyphs)?;
                SubtableKind::Ligature(table)
            }
            // 3 - reserved
            4 => {
                SubtableKind::NonContextual(aat::Lookup::parse(data)?)
            }
            5 => {
                let table = InsertionSubtable::parse(data, extended, number_of_glyphs)?;
                SubtableKind::Insertion(table)
            }
            _ => return None,
        };

        Some(kind)
    }
}

fn parse_machine(data: &[u8], extended: bool, number_of_glyphs: u32) -> Option<aat::StateTable> {
    if extended {
        aat::StateTable::parse(data, number_of_glyphs)
    } else {
        aat::StateTable::parse_obsolete(data, number_of_glyphs)
    }
}

/// Reads the offsets that follow the state table header.
fn read_offsets<const N: usize>(data: &[u8], extended: bool) -> Option<[usize; N]> {
    let mut offsets = [0; N];
    if extended {
        let mut s = Stream::new_at(data, aat::StateTable::SIZE)?;
        for offset in &mut offsets {
            *offset = s.read::<Offset32>()?.to_usize();
        }
    } else {
        let mut s = Stream::new_at(data, aat::StateTable::OBSOLETE_SIZE)?;
        for offset in &mut offsets {
            *offset = s.read::<Offset16>()?.to_usize();
        }
    }

    Some(offsets)
}


pub struct ContextualSubtable<'a> {
    pub machine: aat::StateTable<'a>,
    data: &'a [u8],
    substitutions: &'a [u8],
}

impl<'a> ContextualSubtable<'a> {
    fn parse(data: &'a [u8], extended: bool, number_of_glyphs: u32) -> Option<Self> {
        let machine = parse_machine(data, extended, number_of_glyphs)?;
        let [offset] = read_offsets(data, extended)?;

        Some(ContextualSubtable {
            machine,
            data,
            // The substitution list is unsized.
            substitutions: data.get(offset..)?,
        })
    }

    /// Returns the substitute of `glyph_id` from substitution table `index`.
    pub fn substitute(&self, index: u16, glyph_id: u16, number_of_glyphs: u32) -> Option<u16> {
        if self.machine.is_extended() {
            let offsets = LazyArray32::<Offset32>::new(self.substitutions);
            let offset = offsets.get(u32::from(index))?.to_usize();
            let lookup = aat::Lookup::parse(self.substitutions.get(offset..)?)?;
            lookup.value16(glyph_id, number_of_glyphs)
        } else {
            // A word offset from the subtable start, indexed by the glyph id.
            let idx = usize::from(index) + usize::from(glyph_id);
            let replacement: u16 = Stream::read_at(self.data, idx * u16::SIZE)?;
            if replacement == 0 { None } else { Some(replacement) }
        }
    }
}


#[derive(Copy, Clone)]
pub struct ContextualEntry {
    pub mark_index: u16,
    pub current_index: u16,
}

impl FromData for ContextualEntry {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(ContextualEntry {
            mark_index: s.read()?,
            current_index: s.read()?,
        })
    }
}


pub struct LigatureSubtable<'a> {
    pub machine: aat::StateTable<'a>,
    data: &'a [u8],
    actions_offset: usize,
    components_offset: usize,
    ligatures_offset: usize,
}

impl<'a> LigatureSubtable<'a> {
    fn parse(data: &'a [u8], extended: bool, number_of_glyphs: u32) -> Option<Self> {
        let machine = parse_machine(data, extended, number_of_glyphs)?;
        // All three arrays are unsized, so we're simply keeping offsets into the subtable.
        let [actions_offset, components_offset, ligatures_offset] = read_offsets(data, extended)?;

        Some(LigatureSubtable {
            machine,
            data,
            actions_offset,
            components_offset,
            ligatures_offset,
        })
    }

    /// Returns the byte position of the first action of an entry.
    ///
    /// `mort` stores a byte offset in the entry itself.
    pub fn actions_start(&self, index: u16) -> usize {
        if self.machine.is_extended() {
            self.actions_offset + usize::from(index) * u32::SIZE
        } else {
            usize::from(index)
        }
    }

    pub fn action(&self, start: usize, i: usize) -> Option<u32> {
        Stream::read_at(self.data, start.checked_add(i * u32::SIZE)?)
    }

    pub fn component(&self, index: u32) -> Option<u16> {
        let offset = if self.machine.is_extended() {
            self.components_offset
        } else {
            0
        };

        let pos = usize::num_from(index).checked_mul(u16::SIZE)?.checked_add(offset)?;
        Stream::read_at(self.data, pos)
    }

    pub fn ligature(&self, index: u32) -> Option<u16> {
        let pos = if self.machine.is_extended() {
            usize::num_from(index).checked_mul(u16::SIZE)?.checked_add(self.ligatures_offset)?
        } else {
            // A byte offset from the subtable start.
            usize::num_from(index)
        };

        Stream::read_at(self.data, pos)
    }
}


#[derive(Copy, Clone)]
pub struct InsertionEntry {
    pub current_insert_index: u16,
    pub marked_insert_index: u16,
}

impl FromData for InsertionEntry {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(InsertionEntry {
            current_insert_index: s.read()?,
            marked_insert_index: s.read()?,
        })
    }
}


pub struct InsertionSubtable<'a> {
    pub machine: aat::StateTable<'a>,
    data: &'a [u8],
    glyphs_offset: usize,
}

impl<'a> InsertionSubtable<'a> {
    fn parse(data: &'a [u8], extended: bool, number_of_glyphs: u32) -> Option<Self> {
        let machine = parse_machine(data, extended, number_of_glyphs)?;
        let [glyphs_offset] = read_offsets(data, extended)?;

        Some(InsertionSubtable {
            machine,
            data,
            glyphs_offset,
        })
    }

    /// Returns the `i`-th glyph of the insertion list starting at `index`.
    pub fn glyph(&self, index: u16, i: u16) -> Option<u16> {
        let pos = if self.machine.is_extended() {
            self.glyphs_offset + (usize::from(index) + usize::from(i)) * u16::SIZE
        } else {
            // `mort` indices are byte offsets from the subtable start.
            usize::from(index) + usize::from(i) * u16::SIZE
        };

        Stream::read_at(self.data, pos)
    }
}

/*!
A collection of [Apple Advanced Typography](
https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6AATIntro.html)
related types.
*/

// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6Tables.html

use core::cmp::Ordering;

use ttf_parser::parser::{FromData, NumFrom, Offset, Offset16, Offset32, Stream};

use super::{DynArray, StreamExt};
use crate::aat::ApplyContext;
use crate::buffer::Buffer;

/// Predefined classes.
pub mod class {
    pub const END_OF_TEXT: u16 = 0;
    pub const OUT_OF_BOUNDS: u16 = 1;
    pub const DELETED_GLYPH: u16 = 2;
}

pub const START_OF_TEXT: u16 = 0;


/// A lookup table as defined at
/// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6Tables.html
///
/// Values are 16-bit unless the table was parsed with [`Lookup::parse32`].
#[derive(Clone, Copy, Debug)]
pub struct Lookup<'a> {
    data: &'a [u8],
    kind: LookupKind<'a>,
    value_size: usize,
}

#[derive(Clone, Copy, Debug)]
enum LookupKind<'a> {
    /// Format 0: one value per glyph.
    Simple(&'a [u8]),
    /// Format 2: one value per glyph range.
    Segments(DynArray<'a>),
    /// Format 4: one value array per glyph range.
    SegmentArrays(DynArray<'a>),
    /// Format 6: sorted glyph/value pairs.
    Singles(DynArray<'a>),
    /// Format 8 and 10: a dense value array for a glyph range.
    Trimmed {
        first_glyph: u16,
        value_size: usize,
        values: &'a [u8],
    },
}

impl<'a> Lookup<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        Self::parse_with(data, u16::SIZE)
    }

    pub fn parse32(data: &'a [u8]) -> Option<Self> {
        Self::parse_with(data, u32::SIZE)
    }

    fn parse_with(data: &'a [u8], value_size: usize) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        let kind = match format {
            0 => LookupKind::Simple(s.tail()?),
            2 => {
                let units = parse_binary_search(&mut s, 4 + value_size, 2)?;
                LookupKind::Segments(units)
            }
            4 => {
                let units = parse_binary_search(&mut s, 6, 2)?;
                LookupKind::SegmentArrays(units)
            }
            6 => {
                let units = parse_binary_search(&mut s, 2 + value_size, 1)?;
                LookupKind::Singles(units)
            }
            8 => {
                let first_glyph: u16 = s.read()?;
                let glyph_count: u16 = s.read()?;
                let values = s.read_bytes(usize::from(glyph_count) * value_size)?;
                LookupKind::Trimmed { first_glyph, value_size, values }
            }
            10 => {
                let value_size = usize::from(s.read::<u16>()?);
                if !matches!(value_size, 1 | 2 | 4) {
                    return None;
                }

                let first_glyph: u16 = s.read()?;
                let glyph_count: u16 = s.read()?;
                let values = s.read_bytes(usize::from(glyph_count) * value_size)?;
                LookupKind::Trimmed { first_glyph, value_size, values }
            }
            _ => {
                log::debug!("unsupported lookup format {}", format);
                return None;
            }
        };

        Some(Lookup { data, kind, value_size })
    }

    /// Returns the value for a glyph.
    pub fn value(&self, glyph_id: u16, number_of_glyphs: u32) -> Option<u32> {
        let vs = self.value_size;
        match self.kind {
            LookupKind::Simple(values) => {
                if u32::from(glyph_id) >= number_of_glyphs {
                    return None;
                }

                read_value(values, usize::from(glyph_id) * vs, vs)
            }
            LookupKind::Segments(units) => {
                let (_, rec) = units.binary_search_by(|rec| cmp_segment(rec, glyph_id))?;
                read_value(rec, 4, vs)
            }
            LookupKind::SegmentArrays(units) => {
                let (_, rec) = units.binary_search_by(|rec| cmp_segment(rec, glyph_id))?;
                let first: u16 = Stream::read_at(rec, 2)?;
                let offset: u16 = Stream::read_at(rec, 4)?;
                let idx = usize::from(glyph_id - first);
                read_value(self.data, usize::from(offset) + idx * vs, vs)
            }
            LookupKind::Singles(units) => {
                let (_, rec) = units.binary_search_by(|rec| {
                    Stream::read_at::<u16>(rec, 0).unwrap_or(0xFFFF).cmp(&glyph_id)
                })?;
                read_value(rec, 2, vs)
            }
            LookupKind::Trimmed { first_glyph, value_size, values } => {
                let idx = usize::from(glyph_id.checked_sub(first_glyph)?);
                read_value(values, idx * value_size, value_size)
            }
        }
    }

    /// Returns a 16-bit value for a glyph.
    #[inline]
    pub fn value16(&self, glyph_id: u16, number_of_glyphs: u32) -> Option<u16> {
        self.value(glyph_id, number_of_glyphs).and_then(|v| u16::try_from(v).ok())
    }
}

/// Parses a `BinSrchHeader` followed by its units.
///
/// `key_words` is the number of leading 16-bit words that are all `0xFFFF`
/// in a terminator unit.
fn parse_binary_search<'a>(
    s: &mut Stream<'a>,
    min_unit_size: usize,
    key_words: usize,
) -> Option<DynArray<'a>> {
    let unit_size = usize::from(s.read::<u16>()?);
    let number_of_units = usize::from(s.read::<u16>()?);
    s.advance_checked(6)?; // search_range + entry_selector + range_shift

    if unit_size < min_unit_size {
        return None;
    }

    let units = s.read_dyn_array(number_of_units, unit_size)?;

    // 'The number of termination values that need to be included is table-specific.
    // The value that indicates binary search termination is 0xFFFF.'
    let len = units.len();
    if let Some(last) = len.checked_sub(1).and_then(|i| units.get(i)) {
        let is_termination = (0..key_words)
            .all(|i| Stream::read_at::<u16>(last, i * u16::SIZE) == Some(0xFFFF));
        if is_termination {
            return Some(units.truncated(len - 1));
        }
    }

    Some(units)
}

fn cmp_segment(rec: &[u8], glyph_id: u16) -> Ordering {
    let last: u16 = Stream::read_at(rec, 0).unwrap_or(0);
    let first: u16 = Stream::read_at(rec, 2).unwrap_or(0xFFFF);
    if last < glyph_id {
        Ordering::Less
    } else if first > glyph_id {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

fn read_value(data: &[u8], offset: usize, size: usize) -> Option<u32> {
    match size {
        1 => Stream::read_at::<u8>(data, offset).map(u32::from),
        2 => Stream::read_at::<u16>(data, offset).map(u32::from),
        4 => Stream::read_at::<u32>(data, offset),
        _ => None,
    }
}


#[derive(Clone, Copy, Debug)]
enum ClassTable<'a> {
    Lookup(Lookup<'a>),
    /// The `mort` class table: a byte array indexed from the first glyph.
    Array {
        first_glyph: u16,
        classes: &'a [u8],
    },
}

/// A state table.
///
/// Covers both the extended (`morx`/`kerx`) and the obsolete (`mort`) layout.
#[derive(Clone, Copy, Debug)]
pub struct StateTable<'a> {
    number_of_glyphs: u32, // From `maxp`.
    number_of_classes: u32,
    classes: ClassTable<'a>,
    // We don't know the actual data size and it's kinda expensive to calculate.
    // So we are simply storing all the data past the offset.
    state_array: &'a [u8],
    state_array_offset: usize,
    entry_table: &'a [u8],
    extended: bool,
}

impl<'a> StateTable<'a> {
    /// The extended state table header size.
    pub const SIZE: usize = 16;
    /// The obsolete state table header size.
    pub const OBSOLETE_SIZE: usize = 8;

    pub fn parse(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let mut s = Stream::new(data);

        let number_of_classes: u32 = s.read()?;
        // Note that in format1 subtable, offsets are not from the subtable start,
        // but from subtable start + `header_size`.
        // So there is not need to subtract the `header_size`.
        let lookup = Lookup::parse(s.read_at_offset32(data)?)?;
        let state_array_offset = s.read::<Offset32>()?.to_usize();
        let entry_table = s.read_at_offset32(data)?;

        Self::new(
            number_of_glyphs,
            number_of_classes,
            ClassTable::Lookup(lookup),
            data,
            state_array_offset,
            entry_table,
            true,
        )
    }

    pub fn parse_obsolete(data: &'a [u8], number_of_glyphs: u32) -> Option<Self> {
        let mut s = Stream::new(data);

        let number_of_classes: u16 = s.read()?;
        let class_table_offset = s.read::<Offset16>()?.to_usize();
        let state_array_offset = s.read::<Offset16>()?.to_usize();
        let entry_table_offset = s.read::<Offset16>()?.to_usize();

        let mut s = Stream::new_at(data, class_table_offset)?;
        let first_glyph: u16 = s.read()?;
        let glyph_count: u16 = s.read()?;
        let classes = s.read_bytes(usize::from(glyph_count))?;

        Self::new(
            number_of_glyphs,
            u32::from(number_of_classes),
            ClassTable::Array { first_glyph, classes },
            data,
            state_array_offset,
            data.get(entry_table_offset..)?,
            false,
        )
    }

    fn new(
        number_of_glyphs: u32,
        number_of_classes: u32,
        classes: ClassTable<'a>,
        data: &'a [u8],
        state_array_offset: usize,
        entry_table: &'a [u8],
        extended: bool,
    ) -> Option<Self> {
        // The four predefined classes are mandatory.
        if number_of_classes < 4 {
            return None;
        }

        Some(StateTable {
            number_of_glyphs,
            number_of_classes,
            classes,
            state_array: data.get(state_array_offset..)?,
            state_array_offset,
            entry_table,
            extended,
        })
    }

    #[inline]
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Returns a glyph class.
    pub fn class(&self, glyph_id: u32) -> u16 {
        if glyph_id == crate::aat::DELETED_GLYPH {
            return class::DELETED_GLYPH;
        }

        let glyph_id = match u16::try_from(glyph_id) {
            Ok(id) => id,
            Err(_) => return class::OUT_OF_BOUNDS,
        };

        match self.classes {
            ClassTable::Lookup(ref lookup) => lookup
                .value16(glyph_id, self.number_of_glyphs)
                .unwrap_or(class::OUT_OF_BOUNDS),
            ClassTable::Array { first_glyph, classes } => glyph_id
                .checked_sub(first_glyph)
                .and_then(|idx| classes.get(usize::from(idx)))
                .map(|c| u16::from(*c))
                .unwrap_or(class::OUT_OF_BOUNDS),
        }
    }

    /// Returns a class entry.
    pub fn entry<T: FromData>(&self, state: u16, mut class: u16) -> Option<Entry2<T>> {
        if u32::from(class) >= self.number_of_classes {
            class = class::OUT_OF_BOUNDS;
        }

        let state_idx =
            usize::from(state) * usize::num_from(self.number_of_classes) + usize::from(class);

        let entry_idx = if self.extended {
            usize::from(Stream::read_at::<u16>(self.state_array, state_idx * u16::SIZE)?)
        } else {
            usize::from(Stream::read_at::<u8>(self.state_array, state_idx)?)
        };

        let mut entry: Entry2<T> = Stream::read_at(self.entry_table, entry_idx * Entry2::<T>::SIZE)?;

        if !self.extended {
            // Obsolete tables store the new state as a byte offset to its row.
            let offset = usize::from(entry.new_state).checked_sub(self.state_array_offset)?;
            entry.new_state = u16::try_from(offset / usize::num_from(self.number_of_classes)).ok()?;
        }

        Some(entry)
    }
}


pub struct Entry2<T: FromData> {
    pub new_state: u16,
    pub flags: u16,
    pub extra: T,
}

impl<T: FromData> FromData for Entry2<T> {
    const SIZE: usize = 4 + T::SIZE;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(Entry2 {
            new_state: s.read()?,
            flags: s.read()?,
            extra: s.read()?,
        })
    }
}


pub trait Driver<T: FromData> {
    fn in_place(&self) -> bool;
    fn can_advance(&self, entry: &Entry2<T>) -> bool;
    fn is_actionable(&self, entry: &Entry2<T>, buffer: &Buffer) -> bool;
    fn transition(&mut self, entry: &Entry2<T>, c: &mut ApplyContext) -> Option<()>;
}

/// Runs a state machine over the whole buffer.
///
/// Returns `None` when the operation budget ran out. The buffer is left
/// consistent in either case.
pub fn drive<T: FromData>(
    machine: &StateTable,
    d: &mut dyn Driver<T>,
    c: &mut ApplyContext,
) -> Option<()> {
    if !d.in_place() {
        c.buffer.clear_output();
    }

    let mut result = Some(());
    let mut state = START_OF_TEXT;
    c.buffer.idx = 0;
    loop {
        if !c.sanitizer.check_ops(1) {
            log::debug!("state machine stopped: operation budget exhausted");
            result = None;
            break;
        }

        let class = if c.buffer.idx < c.buffer.len {
            machine.class(c.buffer.info[c.buffer.idx].glyph_id)
        } else {
            class::END_OF_TEXT
        };

        let entry: Entry2<T> = match machine.entry(state, class) {
            Some(v) => v,
            None => break,
        };

        let buffer = &mut *c.buffer;

        // Unsafe-to-break before this if not in state 0, as things might
        // go differently if we start from state 0 here.
        if state != START_OF_TEXT &&
            buffer.backtrack_len() != 0 &&
            buffer.idx < buffer.len
        {
            // If there's no value and we're just epsilon-transitioning to state 0, safe to break.
            if  d.is_actionable(&entry, buffer) ||
                !(entry.new_state == START_OF_TEXT && !d.can_advance(&entry))
            {
                buffer.unsafe_to_break_from_outbuffer(buffer.backtrack_len() - 1, buffer.idx + 1);
            }
        }

        // Unsafe-to-break if end-of-text would kick in here.
        if buffer.idx + 2 <= buffer.len {
            let end_entry: Entry2<T> = match machine.entry(state, class::END_OF_TEXT) {
                Some(v) => v,
                None => break,
            };

            if d.is_actionable(&end_entry, buffer) {
                buffer.unsafe_to_break(buffer.idx, buffer.idx + 2);
            }
        }

        // A failed transition only skips its own action.
        let _ = d.transition(&entry, c);

        state = entry.new_state;

        let buffer = &mut *c.buffer;
        if buffer.idx >= buffer.len {
            break;
        }

        if d.can_advance(&entry) {
            buffer.next_glyph();
        } else {
            if buffer.max_ops <= 0 {
                buffer.next_glyph();
            }
            buffer.max_ops -= 1;
        }
    }

    if !d.in_place() {
        let buffer = &mut *c.buffer;
        while buffer.idx < buffer.len {
            buffer.next_glyph();
        }

        buffer.swap_buffers();
    }

    result
}

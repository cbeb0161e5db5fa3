use super::feature_selector;
use super::{ApplyContext, ApplyTable, FeatureType, Map, MapBuilder, DELETED_GLYPH};
use crate::buffer::Buffer;
use crate::tables::aat::{self, Entry2};
use crate::tables::morx;
use crate::GlyphInfo;

/// Computes the flags of each chain from the requested features.
pub(crate) fn compile_flags(table: &morx::Table, builder: &MapBuilder, map: &mut Map) {
    for chain in table.chains() {
        let mut flags = chain.default_flags();
        for feature in chain.features() {
            let requested = builder.has_feature(feature.kind, feature.setting) ||
                // Deprecated. https://github.com/harfbuzz/harfbuzz/issues/1342
                (feature.kind == FeatureType::LetterCase as u16 &&
                    feature.setting == feature_selector::SMALL_CAPS &&
                    builder.has_feature(
                        FeatureType::LowerCase as u16,
                        feature_selector::LOWER_CASE_SMALL_CAPS,
                    ));

            if requested {
                flags &= feature.disable_flags;
                flags |= feature.enable_flags;
            }
        }

        map.chain_flags.push(flags);
    }
}

impl ApplyTable for morx::Table<'_> {
    fn has_data(&self) -> bool {
        morx::Table::has_data(self)
    }

    fn apply(&self, c: &mut ApplyContext) -> Option<()> {
        for (chain_idx, chain) in self.chains().enumerate() {
            let flags = c.plan.aat_map.chain_flags(chain_idx).unwrap_or_else(|| chain.default_flags());
            for subtable in chain.subtables() {
                let index = c.lookup_index;
                c.lookup_index += 1;

                if subtable.feature_flags & flags == 0 {
                    continue;
                }

                if !subtable.is_all_directions() &&
                    c.buffer.direction.is_vertical() != subtable.is_vertical()
                {
                    continue;
                }

                let kind = match subtable.kind {
                    Some(ref kind) => kind,
                    None => continue,
                };

                if !c.sanitizer.check_range(subtable.data) {
                    return None;
                }

                // The buffer is always in logical order. Coverage bit 28 selects
                // logical or layout order and bit 30 reverses it.
                let reverse = if subtable.is_logical() {
                    subtable.is_backwards()
                } else {
                    subtable.is_backwards() != c.buffer.direction.is_backward()
                };

                log::trace!("{:2$}start morx subtable {}", "", index, c.debug_depth as usize);

                if reverse {
                    c.buffer.reverse();
                }

                let result = apply_subtable(kind, c);

                if reverse {
                    c.buffer.reverse();
                }

                log::trace!("{:2$}end morx subtable {}", "", index, c.debug_depth as usize);

                result?;
            }
        }

        Some(())
    }
}

fn apply_subtable(kind: &morx::SubtableKind, c: &mut ApplyContext) -> Option<()> {
    match kind {
        morx::SubtableKind::Rearrangement(ref machine) => {
            let mut d = RearrangementCtx { start: 0, end: 0 };
            aat::drive::<()>(machine, &mut d, c)
        }
        morx::SubtableKind::Contextual(ref table) => {
            let mut d = ContextualCtx {
                table,
                mark_set: false,
                mark: 0,
            };

            aat::drive::<morx::ContextualEntry>(&table.machine, &mut d, c)
        }
        morx::SubtableKind::Ligature(ref table) => {
            let mut d = LigatureCtx {
                table,
                match_length: 0,
                match_positions: [0; LIGATURE_MAX_MATCHES],
            };

            if table.machine.is_extended() {
                aat::drive::<u16>(&table.machine, &mut d, c)
            } else {
                aat::drive::<()>(&table.machine, &mut d, c)
            }
        }
        morx::SubtableKind::NonContextual(ref lookup) => {
            let num_glyphs = c.sanitizer.num_glyphs();
            let len = c.buffer.len;
            for info in &mut c.buffer.info[..len] {
                let glyph = match u16::try_from(info.glyph_id) {
                    Ok(v) => v,
                    Err(_) => continue,
                };

                if let Some(replacement) = lookup.value16(glyph, num_glyphs) {
                    if c.sanitizer.check_glyph(u32::from(replacement)) {
                        info.glyph_id = u32::from(replacement);
                    }
                }
            }

            Some(())
        }
        morx::SubtableKind::Insertion(ref table) => {
            let mut d = InsertionCtx { table, mark: 0 };
            aat::drive::<morx::InsertionEntry>(&table.machine, &mut d, c)
        }
    }
}


struct RearrangementCtx {
    start: usize,
    end: usize,
}

impl RearrangementCtx {
    const MARK_FIRST: u16   = 0x8000;
    const DONT_ADVANCE: u16 = 0x4000;
    const MARK_LAST: u16    = 0x2000;
    const VERB: u16         = 0x000F;

    fn rearrange(&self, verb: u16, buffer: &mut Buffer) {
        // Two nibbles, for the start and the end side. 0, 1 and 2 move
        // that many glyphs to the other side, 3 moves two and flips them.
        const MAP: [u8; 16] = [
            0x00, // 0  no change
            0x10, // 1  Ax => xA
            0x01, // 2  xD => Dx
            0x11, // 3  AxD => DxA
            0x20, // 4  ABx => xAB
            0x30, // 5  ABx => xBA
            0x02, // 6  xCD => CDx
            0x03, // 7  xCD => DCx
            0x12, // 8  AxCD => CDxA
            0x13, // 9  AxCD => DCxA
            0x21, // 10 ABxD => DxAB
            0x31, // 11 ABxD => DxBA
            0x22, // 12 ABxCD => CDxAB
            0x32, // 13 ABxCD => CDxBA
            0x23, // 14 ABxCD => DCxAB
            0x33, // 15 ABxCD => DCxBA
        ];

        let m = MAP[usize::from(verb)];
        let l = usize::from(2.min(m >> 4));
        let r = usize::from(2.min(m & 0x0F));
        let reverse_l = m >> 4 == 3;
        let reverse_r = m & 0x0F == 3;

        let (start, end) = (self.start, self.end);
        if end - start < l + r {
            return;
        }

        buffer.merge_clusters(start, (buffer.idx + 1).min(buffer.len));
        buffer.merge_clusters(start, end);

        let info = &mut buffer.info;
        let mut saved = [GlyphInfo::default(); 4];
        saved[..l].copy_from_slice(&info[start..start + l]);
        saved[2..2 + r].copy_from_slice(&info[end - r..end]);

        // Shift the middle part.
        info.copy_within(start + l..end - r, start + r);

        info[start..start + r].copy_from_slice(&saved[2..2 + r]);
        info[end - l..end].copy_from_slice(&saved[..l]);

        if reverse_l {
            info.swap(end - 1, end - 2);
        }

        if reverse_r {
            info.swap(start, start + 1);
        }
    }
}

impl aat::Driver<()> for RearrangementCtx {
    fn in_place(&self) -> bool {
        true
    }

    fn can_advance(&self, entry: &Entry2<()>) -> bool {
        entry.flags & Self::DONT_ADVANCE == 0
    }

    fn is_actionable(&self, entry: &Entry2<()>, _: &Buffer) -> bool {
        entry.flags & Self::VERB != 0 && self.start < self.end
    }

    fn transition(&mut self, entry: &Entry2<()>, c: &mut ApplyContext) -> Option<()> {
        let buffer = &mut *c.buffer;
        let flags = entry.flags;

        if flags & Self::MARK_FIRST != 0 {
            self.start = buffer.idx;
        }

        if flags & Self::MARK_LAST != 0 {
            self.end = (buffer.idx + 1).min(buffer.len);
        }

        if flags & Self::VERB != 0 && self.start < self.end {
            self.rearrange(flags & Self::VERB, buffer);
        }

        Some(())
    }
}


struct ContextualCtx<'a> {
    table: &'a morx::ContextualSubtable<'a>,
    mark_set: bool,
    mark: usize,
}

impl ContextualCtx<'_> {
    const SET_MARK: u16     = 0x8000;
    const DONT_ADVANCE: u16 = 0x4000;
    const NONE: u16         = 0xFFFF;

    fn replacement(&self, index: u16, glyph_id: u32, c: &ApplyContext) -> Option<u32> {
        if index == Self::NONE {
            return None;
        }

        let glyph = u16::try_from(glyph_id).ok()?;
        let replacement = self.table.substitute(index, glyph, c.sanitizer.num_glyphs())?;
        let replacement = u32::from(replacement);
        if c.sanitizer.check_glyph(replacement) { Some(replacement) } else { None }
    }
}

impl aat::Driver<morx::ContextualEntry> for ContextualCtx<'_> {
    fn in_place(&self) -> bool {
        true
    }

    fn can_advance(&self, entry: &Entry2<morx::ContextualEntry>) -> bool {
        entry.flags & Self::DONT_ADVANCE == 0
    }

    fn is_actionable(&self, entry: &Entry2<morx::ContextualEntry>, buffer: &Buffer) -> bool {
        if buffer.idx == buffer.len && !self.mark_set {
            return false;
        }

        entry.extra.mark_index != Self::NONE || entry.extra.current_index != Self::NONE
    }

    fn transition(&mut self, entry: &Entry2<morx::ContextualEntry>, c: &mut ApplyContext) -> Option<()> {
        // CoreText applies neither mark nor current substitution
        // at the end of text unless the mark was set explicitly.
        if c.buffer.idx == c.buffer.len && !self.mark_set {
            return Some(());
        }

        if self.mark < c.buffer.len {
            let glyph_id = c.buffer.info[self.mark].glyph_id;
            if let Some(replacement) = self.replacement(entry.extra.mark_index, glyph_id, c) {
                let end = (c.buffer.idx + 1).min(c.buffer.len);
                c.buffer.unsafe_to_break(self.mark, end);
                c.buffer.info[self.mark].glyph_id = replacement;
            }
        }

        if c.buffer.len != 0 {
            let idx = c.buffer.idx.min(c.buffer.len - 1);
            let glyph_id = c.buffer.info[idx].glyph_id;
            if let Some(replacement) = self.replacement(entry.extra.current_index, glyph_id, c) {
                c.buffer.info[idx].glyph_id = replacement;
            }
        }

        if entry.flags & Self::SET_MARK != 0 {
            self.mark_set = true;
            self.mark = c.buffer.idx;
        }

        Some(())
    }
}


struct InsertionCtx<'a> {
    table: &'a morx::InsertionSubtable<'a>,
    mark: usize,
}

impl InsertionCtx<'_> {
    const SET_MARK: u16                 = 0x8000;
    const DONT_ADVANCE: u16             = 0x4000;
    const CURRENT_INSERT_BEFORE: u16    = 0x0800;
    const MARKED_INSERT_BEFORE: u16     = 0x0400;
    const CURRENT_INSERT_COUNT: u16     = 0x03E0;
    const MARKED_INSERT_COUNT: u16      = 0x001F;
    const NONE: u16                     = 0xFFFF;

    /// Returns `count` if the whole glyph list is readable and valid, zero otherwise.
    fn checked_count(&self, start: u16, count: u16, c: &ApplyContext) -> u16 {
        let valid = (0..count).all(|i| {
            self.table.glyph(start, i)
                .map(|g| c.sanitizer.check_glyph(u32::from(g)))
                .unwrap_or(false)
        });

        if valid { count } else { 0 }
    }

    /// Outputs the glyph list around the current glyph.
    fn insert(&self, start: u16, count: u16, before: bool, buffer: &mut Buffer) -> Option<()> {
        if buffer.idx < buffer.len && !before {
            buffer.copy_glyph();
        }

        // TODO: the KashidaLike and ConditionalIsKashidaLike settings are ignored.
        for i in 0..count {
            buffer.output_glyph(u32::from(self.table.glyph(start, i)?));
        }

        if buffer.idx < buffer.len && !before {
            buffer.skip_glyph();
        }

        Some(())
    }
}

impl aat::Driver<morx::InsertionEntry> for InsertionCtx<'_> {
    fn in_place(&self) -> bool {
        false
    }

    fn can_advance(&self, entry: &Entry2<morx::InsertionEntry>) -> bool {
        entry.flags & Self::DONT_ADVANCE == 0
    }

    fn is_actionable(&self, entry: &Entry2<morx::InsertionEntry>, _: &Buffer) -> bool {
        (entry.flags & (Self::CURRENT_INSERT_COUNT | Self::MARKED_INSERT_COUNT) != 0) &&
            (entry.extra.current_insert_index != Self::NONE ||
                entry.extra.marked_insert_index != Self::NONE)
    }

    fn transition(&mut self, entry: &Entry2<morx::InsertionEntry>, c: &mut ApplyContext) -> Option<()> {
        let flags = entry.flags;
        let mark_loc = c.buffer.out_len;

        if entry.extra.marked_insert_index != Self::NONE {
            let start = entry.extra.marked_insert_index;
            let count = flags & Self::MARKED_INSERT_COUNT;
            c.buffer.max_ops -= i32::from(count);
            if c.buffer.max_ops <= 0 {
                return Some(());
            }

            let count = self.checked_count(start, count, c);
            let before = flags & Self::MARKED_INSERT_BEFORE != 0;

            let buffer = &mut *c.buffer;
            let end = buffer.out_len;
            if !buffer.move_to(self.mark) {
                return None;
            }

            self.insert(start, count, before, buffer)?;

            if !buffer.move_to(end + usize::from(count)) {
                return None;
            }

            buffer.unsafe_to_break_from_outbuffer(self.mark, (buffer.idx + 1).min(buffer.len));
        }

        if flags & Self::SET_MARK != 0 {
            self.mark = mark_loc;
        }

        if entry.extra.current_insert_index != Self::NONE {
            let start = entry.extra.current_insert_index;
            let count = (flags & Self::CURRENT_INSERT_COUNT) >> 5;
            c.buffer.max_ops -= i32::from(count);
            if c.buffer.max_ops <= 0 {
                return Some(());
            }

            let count = self.checked_count(start, count, c);
            let before = flags & Self::CURRENT_INSERT_BEFORE != 0;

            let buffer = &mut *c.buffer;
            let end = buffer.out_len;
            self.insert(start, count, before, buffer)?;

            // Without DontAdvance the inserted glyphs are skipped. With it,
            // the next glyph processed is the first inserted one.
            //
            // https://github.com/harfbuzz/harfbuzz/issues/1224#issuecomment-427691417
            let to = if flags & Self::DONT_ADVANCE != 0 { end } else { end + usize::from(count) };
            if !buffer.move_to(to) {
                return None;
            }
        }

        Some(())
    }
}


const LIGATURE_MAX_MATCHES: usize = 64;

struct LigatureCtx<'a> {
    table: &'a morx::LigatureSubtable<'a>,
    match_length: usize,
    match_positions: [usize; LIGATURE_MAX_MATCHES],
}

impl LigatureCtx<'_> {
    const SET_COMPONENT: u16    = 0x8000;
    const DONT_ADVANCE: u16     = 0x4000;
    const PERFORM_ACTION: u16   = 0x2000;
    /// `mort` entries store the action offset in the flags.
    const OBSOLETE_OFFSET: u16  = 0x3FFF;

    const LIG_ACTION_LAST: u32      = 0x80000000;
    const LIG_ACTION_STORE: u32     = 0x40000000;
    const LIG_ACTION_OFFSET: u32    = 0x3FFFFFFF;

    #[inline]
    fn position(&self, i: usize) -> usize {
        self.match_positions[i % LIGATURE_MAX_MATCHES]
    }

    fn transition_impl(&mut self, flags: u16, action_index: Option<u16>, c: &mut ApplyContext) {
        if flags & Self::SET_COMPONENT != 0 {
            // Never mark the same index twice, in case DONT_ADVANCE was used.
            if self.match_length != 0 && self.position(self.match_length - 1) == c.buffer.out_len {
                self.match_length -= 1;
            }

            self.match_positions[self.match_length % LIGATURE_MAX_MATCHES] = c.buffer.out_len;
            self.match_length += 1;
        }

        if let Some(index) = action_index {
            if self.match_length == 0 || c.buffer.idx >= c.buffer.len {
                return;
            }

            let end = c.buffer.out_len;
            let _ = self.perform_actions(self.table.actions_start(index), c);
            c.buffer.move_to(end);
        }
    }

    fn perform_actions(&mut self, actions_start: usize, c: &mut ApplyContext) -> Option<()> {
        let mut cursor = self.match_length;
        let mut ligature_idx = 0u32;
        let mut i = 0;
        loop {
            if cursor == 0 {
                // Stack underflow. Clear the stack.
                self.match_length = 0;
                return Some(());
            }

            cursor -= 1;
            if !c.buffer.move_to(self.position(cursor)) {
                return None;
            }

            if !c.sanitizer.check_ops(1) {
                return None;
            }

            let action = self.table.action(actions_start, i)?;

            let mut uoffset = action & Self::LIG_ACTION_OFFSET;
            if uoffset & 0x20000000 != 0 {
                uoffset |= 0xC0000000; // Sign-extend.
            }

            let offset = uoffset as i32;
            let component_idx = (c.buffer.cur(0).glyph_id as i32).wrapping_add(offset) as u32;
            ligature_idx = ligature_idx.wrapping_add(u32::from(self.table.component(component_idx)?));

            if action & (Self::LIG_ACTION_STORE | Self::LIG_ACTION_LAST) != 0 {
                let lig = u32::from(self.table.ligature(ligature_idx)?);
                if !c.sanitizer.check_glyph(lig) {
                    return None;
                }

                c.buffer.replace_glyph(lig);

                let lig_end = self.position(self.match_length - 1) + 1;
                // Delete all subsequent components.
                while self.match_length - 1 > cursor {
                    self.match_length -= 1;
                    if !c.buffer.move_to(self.position(self.match_length)) {
                        return None;
                    }

                    c.buffer.replace_glyph(DELETED_GLYPH);
                }

                if !c.buffer.move_to(lig_end) {
                    return None;
                }

                let start = self.position(cursor);
                let out_len = c.buffer.out_len;
                c.buffer.merge_out_clusters(start, out_len);
            }

            i += 1;

            if action & Self::LIG_ACTION_LAST != 0 {
                return Some(());
            }
        }
    }
}

impl aat::Driver<u16> for LigatureCtx<'_> {
    fn in_place(&self) -> bool {
        false
    }

    fn can_advance(&self, entry: &Entry2<u16>) -> bool {
        entry.flags & Self::DONT_ADVANCE == 0
    }

    fn is_actionable(&self, entry: &Entry2<u16>, _: &Buffer) -> bool {
        entry.flags & Self::PERFORM_ACTION != 0
    }

    fn transition(&mut self, entry: &Entry2<u16>, c: &mut ApplyContext) -> Option<()> {
        let action = if entry.flags & Self::PERFORM_ACTION != 0 { Some(entry.extra) } else { None };
        self.transition_impl(entry.flags, action, c);
        Some(())
    }
}

impl aat::Driver<()> for LigatureCtx<'_> {
    fn in_place(&self) -> bool {
        false
    }

    fn can_advance(&self, entry: &Entry2<()>) -> bool {
        entry.flags & Self::DONT_ADVANCE == 0
    }

    fn is_actionable(&self, entry: &Entry2<()>, _: &Buffer) -> bool {
        entry.flags & Self::OBSOLETE_OFFSET != 0
    }

    fn transition(&mut self, entry: &Entry2<()>, c: &mut ApplyContext) -> Option<()> {
        let offset = entry.flags & Self::OBSOLETE_OFFSET;
        let action = if offset != 0 { Some(offset) } else { None };
        self.transition_impl(entry.flags, action, c);
        Some(())
    }
}

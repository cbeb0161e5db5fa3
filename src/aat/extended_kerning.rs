use super::{ApplyContext, ApplyTable};
use crate::buffer::{attach_type, Buffer, BufferScratchFlags};
use crate::tables::aat::{self, Entry2};
use crate::tables::kerx;

impl ApplyTable for kerx::Table<'_> {
    fn has_data(&self) -> bool {
        kerx::Table::has_data(self)
    }

    fn apply(&self, c: &mut ApplyContext) -> Option<()> {
        let mut seen_cross_stream = false;
        c.lookup_index = 0;

        for subtable in self.subtables() {
            let index = c.lookup_index;
            c.lookup_index += 1;

            if subtable.coverage.is_variable() {
                continue;
            }

            if c.buffer.direction.is_horizontal() != subtable.coverage.is_horizontal() {
                continue;
            }

            let kind = match subtable.kind {
                Some(ref kind) => kind,
                None => continue,
            };

            if !c.sanitizer.check_range(subtable.data) {
                return None;
            }

            let reverse = subtable.coverage.is_backwards() != c.buffer.direction.is_backward();

            if !seen_cross_stream && subtable.coverage.has_cross_stream() {
                seen_cross_stream = true;

                // Attach all glyphs into a chain.
                let chain = if c.buffer.direction.is_forward() { -1 } else { 1 };
                let len = c.buffer.len;
                for pos in &mut c.buffer.pos[..len] {
                    pos.set_attach_type(attach_type::CURSIVE);
                    pos.set_attach_chain(chain);
                    // HAS_GPOS_ATTACHMENT is not set here: the chain alone
                    // doesn't move anything.
                }
            }

            log::trace!("{:2$}start kerx subtable {}", "", index, c.debug_depth as usize);

            if reverse {
                c.buffer.reverse();
            }

            let result = apply_subtable(kind, &subtable, c);

            if reverse {
                c.buffer.reverse();
            }

            log::trace!("{:2$}end kerx subtable {}", "", index, c.debug_depth as usize);

            result?;
        }

        Some(())
    }
}

fn apply_subtable(kind: &kerx::SubtableKind, subtable: &kerx::Subtable, c: &mut ApplyContext) -> Option<()> {
    let coverage = subtable.coverage;
    match kind {
        kerx::SubtableKind::Format0(ref sub) => apply_simple_kerning(coverage, sub, c),
        kerx::SubtableKind::Format1(ref sub) => {
            if !c.plan.requested_kerning && !coverage.has_cross_stream() {
                return Some(());
            }

            let mut d = Driver1 {
                table: sub,
                cross_stream: coverage.has_cross_stream(),
                tuple_count: subtable.tuple_count.max(1),
                stack: [0; 8],
                depth: 0,
            };

            aat::drive::<u16>(&sub.machine, &mut d, c)
        }
        kerx::SubtableKind::Format2(ref sub) => apply_simple_kerning(coverage, sub, c),
        kerx::SubtableKind::Format4(ref sub) => {
            let mut d = Driver4 {
                table: sub,
                mark_set: false,
                mark: 0,
            };

            aat::drive::<u16>(&sub.machine, &mut d, c)
        }
        kerx::SubtableKind::Format6(ref sub) => apply_simple_kerning(coverage, sub, c),
    }
}

/// Returns the next glyph after `i` that is not a mark.
fn next_base(buffer: &Buffer, i: usize) -> Option<usize> {
    (i + 1..buffer.len).find(|&j| !buffer.info[j].is_mark())
}

fn apply_simple_kerning(
    coverage: kerx::Coverage,
    subtable: &dyn kerx::KerningPairs,
    c: &mut ApplyContext,
) -> Option<()> {
    if !c.plan.requested_kerning {
        return Some(());
    }

    // Pair kerning tables have no backwards form.
    if coverage.is_backwards() {
        return Some(());
    }

    let kern_mask = c.plan.kern_mask;
    let font = c.font;
    let buffer = &mut *c.buffer;
    let horizontal = buffer.direction.is_horizontal();

    let mut i = 0;
    while i < buffer.len {
        if buffer.info[i].mask & kern_mask == 0 {
            i += 1;
            continue;
        }

        let j = match next_base(buffer, i) {
            Some(j) if buffer.info[j].mask & kern_mask != 0 => j,
            _ => {
                i += 1;
                continue;
            }
        };

        let left = u16::try_from(buffer.info[i].glyph_id).ok();
        let right = u16::try_from(buffer.info[j].glyph_id).ok();
        let kern = match (left, right) {
            (Some(l), Some(r)) => subtable.glyphs_kerning(l, r).unwrap_or(0),
            _ => 0,
        };

        if kern != 0 {
            let pos = &mut buffer.pos;
            if horizontal {
                if coverage.has_cross_stream() {
                    pos[j].y_offset = font.em_scale_y(kern);
                    buffer.scratch_flags |= BufferScratchFlags::HAS_GPOS_ATTACHMENT;
                } else {
                    let kern = font.em_scale_x(kern);
                    let kern1 = kern >> 1;
                    let kern2 = kern - kern1;
                    pos[i].x_advance += kern1;
                    pos[j].x_advance += kern2;
                    pos[j].x_offset += kern2;
                }
            } else {
                if coverage.has_cross_stream() {
                    pos[j].x_offset = font.em_scale_x(kern);
                    buffer.scratch_flags |= BufferScratchFlags::HAS_GPOS_ATTACHMENT;
                } else {
                    let kern = font.em_scale_y(kern);
                    let kern1 = kern >> 1;
                    let kern2 = kern - kern1;
                    pos[i].y_advance += kern1;
                    pos[j].y_advance += kern2;
                    pos[j].y_offset += kern2;
                }
            }

            buffer.unsafe_to_break(i, j + 1);
        }

        i = j;
    }

    Some(())
}


/// Contextual kerning driven by a stack of glyph positions.
struct Driver1<'a> {
    table: &'a kerx::Subtable1<'a>,
    cross_stream: bool,
    tuple_count: u32,
    stack: [usize; 8],
    depth: usize,
}

impl Driver1<'_> {
    const PUSH: u16 = 0x8000;
    const DONT_ADVANCE: u16 = 0x4000;
    const RESET: u16 = 0x2000;
    const NO_ACTION: u16 = 0xFFFF;

    /// Applies one popped kerning value to the glyph at `idx`.
    fn kern(&self, idx: usize, v: i32, c: &mut ApplyContext) {
        let font = c.font;
        let kern_mask = c.plan.kern_mask;
        let buffer = &mut *c.buffer;
        let horizontal = buffer.direction.is_horizontal();
        let glyph_mask = buffer.info[idx].mask;
        let pos = &mut buffer.pos[idx];

        // Cross-stream values only move glyphs that are already attached.
        let mut has_gpos_attachment = false;
        if horizontal {
            if self.cross_stream {
                // Undocumented, but used by the 'kern' table example.
                if v == -0x8000 {
                    pos.set_attach_type(0);
                    pos.set_attach_chain(0);
                    pos.y_offset = 0;
                } else if pos.attach_type() != 0 {
                    pos.y_offset += font.em_scale_y(v);
                    has_gpos_attachment = true;
                }
            } else if glyph_mask & kern_mask != 0 {
                pos.x_advance += font.em_scale_x(v);
                pos.x_offset += font.em_scale_x(v);
            }
        } else {
            if self.cross_stream {
                if v == -0x8000 {
                    pos.set_attach_type(0);
                    pos.set_attach_chain(0);
                    pos.x_offset = 0;
                } else if pos.attach_type() != 0 {
                    pos.x_offset += font.em_scale_x(v);
                    has_gpos_attachment = true;
                }
            } else if glyph_mask & kern_mask != 0 {
                pos.y_advance += font.em_scale_y(v);
                pos.y_offset += font.em_scale_y(v);
            }
        }

        if has_gpos_attachment {
            buffer.scratch_flags |= BufferScratchFlags::HAS_GPOS_ATTACHMENT;
        }
    }
}

impl aat::Driver<u16> for Driver1<'_> {
    fn in_place(&self) -> bool {
        true
    }

    fn can_advance(&self, entry: &Entry2<u16>) -> bool {
        entry.flags & Self::DONT_ADVANCE == 0
    }

    fn is_actionable(&self, entry: &Entry2<u16>, _: &Buffer) -> bool {
        entry.extra != Self::NO_ACTION
    }

    fn transition(&mut self, entry: &Entry2<u16>, c: &mut ApplyContext) -> Option<()> {
        if entry.flags & Self::RESET != 0 {
            self.depth = 0;
        }

        if entry.flags & Self::PUSH != 0 {
            if self.depth < self.stack.len() {
                self.stack[self.depth] = c.buffer.idx;
                self.depth += 1;
            } else {
                // Overflow.
                self.depth = 0;
            }
        }

        if entry.extra == Self::NO_ACTION || self.depth == 0 {
            return Some(());
        }

        let step = usize::try_from(self.tuple_count).ok()?;
        let mut action_index = usize::from(entry.extra);

        // Each value pops one glyph from the stack.
        // The list ends with an odd value.
        let mut last = false;
        while !last && self.depth != 0 {
            self.depth -= 1;
            let idx = self.stack[self.depth];

            let v = match self.table.kerning(action_index) {
                Some(v) => i32::from(v),
                None => {
                    self.depth = 0;
                    return None;
                }
            };

            action_index = action_index.checked_add(step)?;
            if idx >= c.buffer.len {
                continue;
            }

            last = v & 1 != 0;
            self.kern(idx, v & !1, c);
        }

        Some(())
    }
}


/// Mark positioning through anchor points or coordinates.
struct Driver4<'a> {
    table: &'a kerx::Subtable4<'a>,
    mark_set: bool,
    mark: usize,
}

impl Driver4<'_> {
    const MARK: u16 = 0x8000;
    const DONT_ADVANCE: u16 = 0x4000;
    const NO_ACTION: u16 = 0xFFFF;
}

impl aat::Driver<u16> for Driver4<'_> {
    fn in_place(&self) -> bool {
        true
    }

    fn can_advance(&self, entry: &Entry2<u16>) -> bool {
        entry.flags & Self::DONT_ADVANCE == 0
    }

    fn is_actionable(&self, entry: &Entry2<u16>, _: &Buffer) -> bool {
        entry.extra != Self::NO_ACTION
    }

    fn transition(&mut self, entry: &Entry2<u16>, c: &mut ApplyContext) -> Option<()> {
        if self.mark_set && entry.extra != Self::NO_ACTION && c.buffer.idx < c.buffer.len {
            let font = c.font;
            match self.table.action_type {
                kerx::ActionType::ControlPoints => {
                    // Control points index into glyph outlines, which we don't have.
                    return Some(());
                }
                kerx::ActionType::AnchorPoints => {
                    let [mark_point, curr_point] = self.table.action::<u16, 2>(entry.extra)?;
                    let mark_anchor = c.anchor(c.buffer.info[self.mark].glyph_id, mark_point);
                    let curr_anchor = c.anchor(c.buffer.cur(0).glyph_id, curr_point);

                    let pos = c.buffer.cur_pos_mut();
                    pos.x_offset = font.em_scale_x(i32::from(mark_anchor.x)) -
                        font.em_scale_x(i32::from(curr_anchor.x));
                    pos.y_offset = font.em_scale_y(i32::from(mark_anchor.y)) -
                        font.em_scale_y(i32::from(curr_anchor.y));
                }
                kerx::ActionType::ControlPointCoordinates => {
                    let [mark_x, mark_y, curr_x, curr_y] = self.table.action::<i16, 4>(entry.extra)?;

                    let pos = c.buffer.cur_pos_mut();
                    pos.x_offset = font.em_scale_x(i32::from(mark_x)) - font.em_scale_x(i32::from(curr_x));
                    pos.y_offset = font.em_scale_y(i32::from(mark_y)) - font.em_scale_y(i32::from(curr_y));
                }
            }

            let idx = c.buffer.idx;
            let pos = c.buffer.cur_pos_mut();
            pos.set_attach_type(attach_type::MARK);
            pos.set_attach_chain(self.mark as i16 - idx as i16);
            c.buffer.scratch_flags |= BufferScratchFlags::HAS_GPOS_ATTACHMENT;
        }

        if entry.flags & Self::MARK != 0 {
            self.mark_set = true;
            self.mark = c.buffer.idx;
        }

        Some(())
    }
}

use alloc::vec::Vec;

use bitflags::bitflags;
use ttf_parser::GlyphId;

use crate::{Direction, Mask};

const MAX_OPS_FACTOR: i32 = 64;
const MAX_OPS_MIN: i32 = 16384;

pub(crate) mod attach_type {
    pub const MARK: u8 = 1;
    pub const CURSIVE: u8 = 2;
}

/// `GlyphPosition` is the structure that holds the positions of the glyph in
/// both horizontal and vertical directions. All positions in `GlyphPosition`
/// are relative to the current point.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct GlyphPosition {
    /// How much the line advances after drawing this glyph when setting text in
    /// horizontal direction.
    pub x_advance: i32,
    /// How much the line advances after drawing this glyph when setting text in
    /// vertical direction.
    pub y_advance: i32,
    /// How much the glyph moves on the X-axis before drawing it, this should not
    /// affect how much the line advances.
    pub x_offset: i32,
    /// How much the glyph moves on the Y-axis before drawing it, this should
    /// not affect how much the line advances.
    pub y_offset: i32,
    attach_chain: i16,
    attach_type: u8,
}

impl GlyphPosition {
    /// Returns the attachment kind set by `kerx` positioning.
    ///
    /// `0` when unattached, `1` for a mark attachment and `2` for a cursive one.
    #[inline]
    pub fn attach_type(&self) -> u8 {
        self.attach_type
    }

    #[inline]
    pub(crate) fn set_attach_type(&mut self, n: u8) {
        self.attach_type = n;
    }

    /// Returns the relative index of the glyph this one is attached to.
    #[inline]
    pub fn attach_chain(&self) -> i16 {
        self.attach_chain
    }

    #[inline]
    pub(crate) fn set_attach_chain(&mut self, n: i16) {
        self.attach_chain = n;
    }
}


bitflags! {
    /// Glyph classification bits consulted by the layout tables.
    #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
    pub struct GlyphPropsFlags: u16 {
        /// A base glyph.
        const BASE_GLYPH    = 0x02;
        /// A ligature glyph.
        const LIGATURE      = 0x04;
        /// A mark glyph. Skipped by pair kerning.
        const MARK          = 0x08;
        /// Not the first glyph of a grapheme. Tracking is applied once per grapheme.
        const CONTINUATION  = 0x80;
    }
}

bitflags! {
    /// Output flags of a glyph.
    #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
    pub struct GlyphFlags: u8 {
        /// Breaking the text before this glyph and shaping the parts separately
        /// may give a different result.
        const UNSAFE_TO_BREAK = 0x01;
    }
}

bitflags! {
    #[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
    pub(crate) struct BufferScratchFlags: u32 {
        const HAS_GPOS_ATTACHMENT   = 0x0000_0001;
        const HAS_UNSAFE_TO_BREAK   = 0x0000_0002;
    }
}


/// A glyph info.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct GlyphInfo {
    /// Glyph id. `0xFFFF` marks a glyph deleted by a `morx` table.
    pub glyph_id: u32,
    /// Codepoint cluster.
    pub cluster: u32,
    pub(crate) mask: Mask,
    pub(crate) props: GlyphPropsFlags,
    pub(crate) flags: GlyphFlags,
}

impl GlyphInfo {
    /// Creates a glyph info without any properties.
    pub fn new(glyph_id: u32, cluster: u32) -> Self {
        GlyphInfo {
            glyph_id,
            cluster,
            ..GlyphInfo::default()
        }
    }

    #[inline]
    pub(crate) fn as_glyph(&self) -> GlyphId {
        debug_assert!(self.glyph_id <= u32::from(u16::MAX));
        GlyphId(self.glyph_id as u16)
    }

    /// Returns glyph classification properties.
    #[inline]
    pub fn props(&self) -> GlyphPropsFlags {
        self.props
    }

    /// Returns glyph output flags.
    #[inline]
    pub fn flags(&self) -> GlyphFlags {
        self.flags
    }

    #[inline]
    pub(crate) fn is_mark(&self) -> bool {
        self.props.contains(GlyphPropsFlags::MARK)
    }

    #[inline]
    pub(crate) fn is_continuation(&self) -> bool {
        self.props.contains(GlyphPropsFlags::CONTINUATION)
    }
}


/// A cluster level.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BufferClusterLevel {
    MonotoneGraphemes,
    MonotoneCharacters,
    Characters,
}

impl Default for BufferClusterLevel {
    #[inline]
    fn default() -> Self {
        BufferClusterLevel::MonotoneGraphemes
    }
}


/// A glyph buffer.
///
/// Holds glyph infos and positions. Substitution tables that insert or
/// remove glyphs write into a separate output array which is swapped in
/// once the table is done.
#[derive(Clone, Debug)]
pub struct Buffer {
    pub(crate) direction: Direction,
    pub(crate) cluster_level: BufferClusterLevel,

    pub(crate) info: Vec<GlyphInfo>,
    pub(crate) pos: Vec<GlyphPosition>,
    pub(crate) out_info: Vec<GlyphInfo>,

    pub(crate) have_output: bool,
    pub(crate) have_positions: bool,

    pub(crate) idx: usize,
    pub(crate) len: usize,
    pub(crate) out_len: usize,

    pub(crate) scratch_flags: BufferScratchFlags,
    pub(crate) max_ops: i32,
}

impl Buffer {
    /// Creates a new, empty buffer set up for left-to-right text.
    pub fn new() -> Self {
        Buffer {
            direction: Direction::LeftToRight,
            cluster_level: BufferClusterLevel::default(),
            info: Vec::new(),
            pos: Vec::new(),
            out_info: Vec::new(),
            have_output: false,
            have_positions: false,
            idx: 0,
            len: 0,
            out_len: 0,
            scratch_flags: BufferScratchFlags::empty(),
            max_ops: MAX_OPS_MIN,
        }
    }

    /// Returns the number of glyphs.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks that the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a glyph.
    pub fn add_glyph(&mut self, glyph_id: u32, cluster: u32) {
        self.add_glyph_with_props(glyph_id, cluster, GlyphPropsFlags::empty());
    }

    /// Appends a glyph with explicit classification properties.
    pub fn add_glyph_with_props(&mut self, glyph_id: u32, cluster: u32, props: GlyphPropsFlags) {
        self.ensure(self.len + 1);
        self.info[self.len] = GlyphInfo {
            props,
            ..GlyphInfo::new(glyph_id, cluster)
        };
        self.pos[self.len] = GlyphPosition::default();
        self.len += 1;
    }

    /// Sets the text direction.
    #[inline]
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Returns the text direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Sets the cluster level.
    #[inline]
    pub fn set_cluster_level(&mut self, level: BufferClusterLevel) {
        self.cluster_level = level;
    }

    /// Returns the cluster level.
    #[inline]
    pub fn cluster_level(&self) -> BufferClusterLevel {
        self.cluster_level
    }

    /// Returns glyph infos.
    #[inline]
    pub fn glyph_infos(&self) -> &[GlyphInfo] {
        &self.info[..self.len]
    }

    /// Returns glyph positions.
    #[inline]
    pub fn glyph_positions(&self) -> &[GlyphPosition] {
        &self.pos[..self.len]
    }

    /// Returns mutable glyph positions.
    #[inline]
    pub fn glyph_positions_mut(&mut self) -> &mut [GlyphPosition] {
        &mut self.pos[..self.len]
    }

    /// Removes all glyphs, keeping the allocation.
    pub fn clear(&mut self) {
        self.len = 0;
        self.idx = 0;
        self.out_len = 0;
        self.have_output = false;
        self.have_positions = false;
        self.scratch_flags = BufferScratchFlags::empty();
        self.max_ops = MAX_OPS_MIN;
    }

    /// Resets the per-shaping state. Called once before any table runs.
    ///
    /// An unset direction becomes left-to-right.
    pub(crate) fn enter(&mut self) {
        if self.direction == Direction::Invalid {
            self.direction = Direction::LeftToRight;
        }

        self.scratch_flags = BufferScratchFlags::empty();
        self.max_ops = i32::try_from(self.len)
            .ok()
            .and_then(|len| len.checked_mul(MAX_OPS_FACTOR))
            .unwrap_or(i32::MAX)
            .max(MAX_OPS_MIN);
    }

    fn ensure(&mut self, size: usize) {
        if self.info.len() < size {
            self.info.resize(size, GlyphInfo::default());
        }

        if self.pos.len() < size {
            self.pos.resize(size, GlyphPosition::default());
        }
    }

    fn ensure_out(&mut self, size: usize) {
        if self.out_info.len() < size {
            self.out_info.resize(size, GlyphInfo::default());
        }
    }

    pub(crate) fn clear_positions(&mut self) {
        self.have_output = false;
        self.have_positions = true;
        self.out_len = 0;

        for pos in &mut self.pos[..self.len] {
            *pos = GlyphPosition::default();
        }
    }

    #[inline]
    pub(crate) fn cur(&self, i: usize) -> &GlyphInfo {
        &self.info[self.idx + i]
    }

    #[inline]
    pub(crate) fn cur_pos_mut(&mut self) -> &mut GlyphPosition {
        let i = self.idx;
        &mut self.pos[i]
    }

    #[inline]
    pub(crate) fn backtrack_len(&self) -> usize {
        if self.have_output { self.out_len } else { self.idx }
    }

    pub(crate) fn reverse(&mut self) {
        if self.is_empty() {
            return;
        }

        self.reverse_range(0, self.len);
    }

    pub(crate) fn reverse_range(&mut self, start: usize, end: usize) {
        if end - start < 2 {
            return;
        }

        self.info[start..end].reverse();
        self.pos[start..end].reverse();
    }

    pub(crate) fn clear_output(&mut self) {
        self.have_output = true;
        self.have_positions = false;
        self.out_len = 0;
    }

    pub(crate) fn swap_buffers(&mut self) {
        debug_assert!(self.have_output);
        self.have_output = false;

        core::mem::swap(&mut self.info, &mut self.out_info);
        self.len = self.out_len;
        self.ensure(self.len);
        self.idx = 0;
    }

    /// Copies the current glyph to the output and advances.
    pub(crate) fn next_glyph(&mut self) {
        if self.have_output {
            self.ensure_out(self.out_len + 1);
            self.out_info[self.out_len] = self.info[self.idx];
            self.out_len += 1;
        }

        self.idx += 1;
    }

    /// Copies the current glyph to the output without advancing.
    pub(crate) fn copy_glyph(&mut self) {
        self.ensure_out(self.out_len + 1);
        self.out_info[self.out_len] = self.info[self.idx];
        self.out_len += 1;
    }

    /// Outputs a new glyph that inherits the current glyph's properties.
    pub(crate) fn output_glyph(&mut self, glyph_id: u32) {
        let orig = if self.idx < self.len {
            self.info[self.idx]
        } else if self.out_len != 0 {
            self.out_info[self.out_len - 1]
        } else {
            match self.info.first() {
                Some(info) => *info,
                None => return,
            }
        };

        self.ensure_out(self.out_len + 1);
        self.out_info[self.out_len] = GlyphInfo { glyph_id, ..orig };
        self.out_len += 1;
    }

    /// Outputs the current glyph with a new id and advances.
    pub(crate) fn replace_glyph(&mut self, glyph_id: u32) {
        self.ensure_out(self.out_len + 1);
        self.out_info[self.out_len] = self.info[self.idx];
        self.out_info[self.out_len].glyph_id = glyph_id;
        self.out_len += 1;
        self.idx += 1;
    }

    #[inline]
    pub(crate) fn skip_glyph(&mut self) {
        self.idx += 1;
    }

    /// Moves the output position to `i`, copying input glyphs forward
    /// or rewinding already written ones back into the input.
    pub(crate) fn move_to(&mut self, i: usize) -> bool {
        if !self.have_output {
            debug_assert!(i <= self.len);
            self.idx = i.min(self.len);
            return true;
        }

        if i > self.out_len + (self.len - self.idx) {
            return false;
        }

        if self.out_len < i {
            let count = i - self.out_len;
            self.ensure_out(i);
            for j in 0..count {
                self.out_info[self.out_len + j] = self.info[self.idx + j];
            }

            self.idx += count;
            self.out_len += count;
        } else if self.out_len > i {
            // Tricky part: rewinding...
            let count = self.out_len - i;

            if self.idx < count {
                self.shift_forward(count - self.idx);
            }

            debug_assert!(self.idx >= count);

            self.idx -= count;
            self.out_len -= count;
            for j in 0..count {
                self.info[self.idx + j] = self.out_info[self.out_len + j];
            }
        }

        true
    }

    fn shift_forward(&mut self, count: usize) {
        debug_assert!(self.have_output);
        self.ensure(self.len + count);

        for i in (self.idx..self.len).rev() {
            self.info[i + count] = self.info[i];
        }

        if self.idx + count > self.len {
            for info in &mut self.info[self.len..self.idx + count] {
                *info = GlyphInfo::default();
            }
        }

        self.len += count;
        self.idx += count;
    }

    pub(crate) fn merge_clusters(&mut self, start: usize, end: usize) {
        if end.saturating_sub(start) < 2 {
            return;
        }

        self.merge_clusters_impl(start, end);
    }

    fn merge_clusters_impl(&mut self, mut start: usize, mut end: usize) {
        if self.cluster_level == BufferClusterLevel::Characters {
            self.unsafe_to_break(start, end);
            return;
        }

        let mut cluster = self.info[start].cluster;

        for i in start + 1..end {
            cluster = cluster.min(self.info[i].cluster);
        }

        // Extend end
        if cluster != self.info[end - 1].cluster {
            while end < self.len && self.info[end - 1].cluster == self.info[end].cluster {
                end += 1;
            }
        }

        // Extend start
        if cluster != self.info[start].cluster {
            while self.idx < start && self.info[start - 1].cluster == self.info[start].cluster {
                start -= 1;
            }
        }

        // If we hit the start of buffer, continue in out-buffer.
        if self.idx == start && self.info[start].cluster != cluster {
            let mut i = self.out_len;
            while i != 0 && self.out_info[i - 1].cluster == self.info[start].cluster {
                self.out_info[i - 1].cluster = cluster;
                i -= 1;
            }
        }

        for info in &mut self.info[start..end] {
            info.cluster = cluster;
        }
    }

    pub(crate) fn merge_out_clusters(&mut self, mut start: usize, mut end: usize) {
        if self.cluster_level == BufferClusterLevel::Characters {
            return;
        }

        if end.saturating_sub(start) < 2 {
            return;
        }

        let mut cluster = self.out_info[start].cluster;

        for i in start + 1..end {
            cluster = cluster.min(self.out_info[i].cluster);
        }

        // Extend start
        while start != 0 && self.out_info[start - 1].cluster == self.out_info[start].cluster {
            start -= 1;
        }

        // Extend end
        while end < self.out_len && self.out_info[end - 1].cluster == self.out_info[end].cluster {
            end += 1;
        }

        // If we hit the end of out-buffer, continue in buffer.
        if end == self.out_len {
            let last_cluster = self.out_info[end - 1].cluster;
            let mut i = self.idx;
            while i < self.len && self.info[i].cluster == last_cluster {
                self.info[i].cluster = cluster;
                i += 1;
            }
        }

        for info in &mut self.out_info[start..end] {
            info.cluster = cluster;
        }
    }

    pub(crate) fn unsafe_to_break(&mut self, start: usize, end: usize) {
        let end = end.min(self.len);
        if end.saturating_sub(start) < 2 {
            return;
        }

        let cluster = find_min_cluster(&self.info[start..end], u32::MAX);
        self.set_unsafe_to_break(start, end, cluster, false);
    }

    pub(crate) fn unsafe_to_break_from_outbuffer(&mut self, start: usize, end: usize) {
        if !self.have_output {
            self.unsafe_to_break(start, end);
            return;
        }

        let start = start.min(self.out_len);
        let end = end.min(self.len).max(self.idx);

        let mut cluster = u32::MAX;
        cluster = find_min_cluster(&self.out_info[start..self.out_len], cluster);
        cluster = find_min_cluster(&self.info[self.idx..end], cluster);

        let out_len = self.out_len;
        self.set_unsafe_to_break(start, out_len, cluster, true);
        self.set_unsafe_to_break(self.idx, end, cluster, false);
    }

    fn set_unsafe_to_break(&mut self, start: usize, end: usize, cluster: u32, out: bool) {
        let infos = if out {
            &mut self.out_info[start..end]
        } else {
            &mut self.info[start..end]
        };

        for info in infos {
            if info.cluster != cluster {
                info.flags |= GlyphFlags::UNSAFE_TO_BREAK;
                self.scratch_flags |= BufferScratchFlags::HAS_UNSAFE_TO_BREAK;
            }
        }
    }

    /// Returns the end of the grapheme starting at `start`.
    pub(crate) fn next_grapheme(&self, start: usize) -> usize {
        let mut end = start + 1;
        while end < self.len && self.info[end].is_continuation() {
            end += 1;
        }

        end
    }

    /// Removes glyphs matching `filter` in place, merging their clusters into neighbours.
    ///
    /// Does not use the output array, so positions stay aligned with infos.
    pub(crate) fn delete_glyphs_inplace(&mut self, filter: impl Fn(&GlyphInfo) -> bool) {
        let mut j = 0;

        for i in 0..self.len {
            if filter(&self.info[i]) {
                // Merge clusters.
                // Same logic as delete_glyph(), but for in-place removal.

                let cluster = self.info[i].cluster;
                if i + 1 < self.len && cluster == self.info[i + 1].cluster {
                    // Cluster survives; do nothing.
                    continue;
                }

                if j != 0 {
                    // Merge cluster backward.
                    if cluster < self.info[j - 1].cluster {
                        let old_cluster = self.info[j - 1].cluster;
                        let mut k = j;
                        while k > 0 && self.info[k - 1].cluster == old_cluster {
                            self.info[k - 1].cluster = cluster;
                            k -= 1;
                        }
                    }

                    continue;
                }

                if i + 1 < self.len {
                    // Merge cluster forward.
                    self.merge_clusters(i, i + 2);
                }

                continue;
            }

            if j != i {
                self.info[j] = self.info[i];
                self.pos[j] = self.pos[i];
            }

            j += 1;
        }

        self.len = j;
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}

fn find_min_cluster(infos: &[GlyphInfo], cluster: u32) -> u32 {
    infos.iter().fold(cluster, |min, info| min.min(info.cluster))
}

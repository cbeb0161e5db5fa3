use alloc::vec::Vec;

use crate::aat::{self, MapBuilder};
use crate::{Buffer, Direction, Face, Feature, Mask, Tag};

/// Every glyph carries this bit.
const GLOBAL_MASK: Mask = 1 << 0;
const KERN_MASK: Mask = 1 << 1;
const TRAK_MASK: Mask = 1 << 2;

const KERN: Tag = Tag::from_bytes(b"kern");
const TRAK: Tag = Tag::from_bytes(b"trak");

/// Features requested by default, before user features.
const DEFAULT_FEATURES: &[Tag] = &[
    Tag::from_bytes(b"calt"),
    Tag::from_bytes(b"clig"),
    Tag::from_bytes(b"liga"),
];

const VERTICAL_FEATURES: &[Tag] = &[
    Tag::from_bytes(b"vert"),
];

#[derive(Clone, Copy, Debug)]
struct RangedMask {
    mask: Mask,
    enable: bool,
    start: u32,
    end: u32,
}

/// A compiled set of features for a face and direction.
///
/// Can be reused for any number of buffers with the same direction.
#[derive(Clone, Debug)]
pub struct ShapePlan {
    pub(crate) direction: Direction,
    pub(crate) aat_map: aat::Map,
    pub(crate) global_mask: Mask,
    pub(crate) kern_mask: Mask,
    pub(crate) trak_mask: Mask,
    pub(crate) requested_kerning: bool,
    pub(crate) requested_tracking: bool,
    ranged: Vec<RangedMask>,
}

impl ShapePlan {
    /// Compiles user features against a face.
    ///
    /// `kern` and `trak` are on by default and may be limited to cluster ranges.
    /// Other features resolve to AAT feature selectors and apply to the whole buffer.
    pub fn new(face: &Face, direction: Direction, user_features: &[Feature]) -> Self {
        let mut builder = MapBuilder::new(face);
        for tag in DEFAULT_FEATURES {
            builder.add_feature(*tag, 1);
        }

        if direction.is_vertical() {
            for tag in VERTICAL_FEATURES {
                builder.add_feature(*tag, 1);
            }
        }

        let mut global_mask = GLOBAL_MASK | KERN_MASK | TRAK_MASK;
        let mut ranged = Vec::new();
        for feature in user_features {
            let mask = match feature.tag {
                KERN => KERN_MASK,
                TRAK => TRAK_MASK,
                _ => {
                    builder.add_feature(feature.tag, feature.value);
                    continue;
                }
            };

            if feature.is_global() {
                // The last global value wins.
                if feature.value != 0 {
                    global_mask |= mask;
                } else {
                    global_mask &= !mask;
                }
            } else {
                ranged.push(RangedMask {
                    mask,
                    enable: feature.value != 0,
                    start: feature.start,
                    end: feature.end,
                });
            }
        }

        let requested = |mask: Mask| {
            global_mask & mask != 0 || ranged.iter().any(|r| r.mask == mask && r.enable)
        };

        let requested_kerning = requested(KERN_MASK);
        let requested_tracking = requested(TRAK_MASK);

        ShapePlan {
            direction,
            aat_map: builder.compile(),
            global_mask,
            kern_mask: KERN_MASK,
            trak_mask: TRAK_MASK,
            requested_kerning,
            requested_tracking,
            ranged,
        }
    }

    /// Returns the direction the plan was compiled for.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Checks that kerning is enabled for at least some glyphs.
    #[inline]
    pub fn requested_kerning(&self) -> bool {
        self.requested_kerning
    }

    /// Checks that tracking is enabled for at least some glyphs.
    #[inline]
    pub fn requested_tracking(&self) -> bool {
        self.requested_tracking
    }

    /// Sets glyph masks from the global and ranged features.
    pub(crate) fn setup_masks(&self, buffer: &mut Buffer) {
        let len = buffer.len;
        for info in &mut buffer.info[..len] {
            info.mask = self.global_mask;
        }

        for r in &self.ranged {
            for info in &mut buffer.info[..len] {
                if r.start <= info.cluster && info.cluster < r.end {
                    if r.enable {
                        info.mask |= r.mask;
                    } else {
                        info.mask &= !r.mask;
                    }
                }
            }
        }
    }
}

/*!
`aat-layout` applies [Apple Advanced Typography](
https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6AATIntro.html)
tables (`morx`/`mort`, `kerx`, `trak`) to a glyph buffer.

Every table is read through bounds-checked views and each application is
capped by a fixed operation budget, so malformed fonts degrade to
"the feature had no effect" instead of misbehaving.
*/

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod aat;
mod buffer;
mod common;
mod face;
mod plan;
mod sanitize;
mod tables;

pub use ttf_parser::{GlyphId, Tag};

pub use crate::buffer::{
    Buffer, BufferClusterLevel, GlyphFlags, GlyphInfo, GlyphPosition, GlyphPropsFlags,
};
pub use crate::common::{Direction, Feature, Language};
pub use crate::face::{Face, FaceTables, Font};
pub use crate::plan::ShapePlan;

type Mask = u32;

/// Shapes the buffer content using the provided font and features.
///
/// The buffer must already hold glyph ids (character mapping is not done here).
/// Runs, in order: `morx`/`mort` substitution, deleted glyph removal,
/// nominal advances, `kerx` positioning and `trak` tracking.
pub fn shape(font: &Font, features: &[Feature], buffer: &mut Buffer) {
    let face = font.face();

    buffer.enter();

    let plan = ShapePlan::new(face, buffer.direction(), features);
    plan.setup_masks(buffer);

    if aat::has_substitution(face) {
        aat::substitute(&plan, font, buffer);
    }

    aat::remove_deleted_glyphs(buffer);

    buffer.clear_positions();
    set_nominal_advances(font, buffer);

    if aat::has_positioning(face) {
        aat::position(&plan, font, buffer);
    }

    if plan.requested_tracking && aat::has_tracking(face) {
        aat::track(&plan, font, buffer);
    }
}

fn set_nominal_advances(font: &Font, buffer: &mut Buffer) {
    let horizontal = buffer.direction().is_horizontal();
    let len = buffer.len;
    for (info, pos) in buffer.info[..len].iter().zip(buffer.pos[..len].iter_mut()) {
        if horizontal {
            pos.x_advance = font.glyph_h_advance(info.as_glyph());
        } else {
            pos.y_advance = -font.glyph_v_advance(info.as_glyph());
        }
    }
}

#[inline]
fn round(x: f32) -> f32 {
    core_maths::CoreFloat::round(x)
}

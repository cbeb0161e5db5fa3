/*!
Apple Advanced Typography table application.

Substitution prefers `morx` over the obsolete `mort`, positioning uses `kerx`
together with the optional `ankr` anchors, and tracking uses `trak`.
A missing or malformed table is never an error: the step is simply skipped.
*/

mod context;
mod extended_kerning;
mod map;
mod metamorphosis;
mod tracking;

pub(crate) use context::ApplyContext;
pub use map::{feature_selector, find_feature_mapping, FeatureMapping, FeatureType, Map, FEATURE_MAPPINGS};
pub(crate) use map::MapBuilder;

use crate::buffer::Buffer;
use crate::tables::morx;
use crate::{Face, Font, Language, ShapePlan};

/// The glyph id a `morx` table writes into a slot it deletes.
pub const DELETED_GLYPH: u32 = 0xFFFF;

/// A table that can be applied to a buffer.
pub(crate) trait ApplyTable {
    fn has_data(&self) -> bool;

    /// Applies the table.
    ///
    /// Returns `None` when the application stopped early on malformed data
    /// or an exhausted operation budget. The buffer stays consistent either way.
    fn apply(&self, c: &mut ApplyContext) -> Option<()>;
}

fn apply_table<T: ApplyTable>(table: &T, name: &str, c: &mut ApplyContext) {
    if !table.has_data() {
        return;
    }

    log::trace!("{:2$}start '{}' table", "", name, c.debug_depth as usize);
    c.debug_depth += 1;
    let result = table.apply(c);
    c.debug_depth -= 1;
    log::trace!("{:2$}end '{}' table", "", name, c.debug_depth as usize);

    if result.is_none() {
        log::debug!("'{}' table application stopped early", name);
    }
}

/// Returns the substitution table in use together with its raw data.
///
/// `morx` always wins over `mort`, both for compiling and for applying.
fn substitution_table<'a>(face: &'a Face<'a>) -> Option<(&'a morx::Table<'a>, Option<&'a [u8]>)> {
    if let Some(table) = face.morx.as_ref().filter(|t| t.has_data()) {
        return Some((table, face.raw.morx));
    }

    if let Some(table) = face.mort.as_ref().filter(|t| t.has_data()) {
        return Some((table, face.raw.mort));
    }

    None
}

pub(crate) fn compile_map(builder: &MapBuilder, map: &mut Map) {
    if let Some((table, _)) = substitution_table(builder.face) {
        metamorphosis::compile_flags(table, builder, map);
    }
}

/// Checks that the face has a `morx` or `mort` table.
pub fn has_substitution(face: &Face) -> bool {
    substitution_table(face).is_some()
}

/// Applies `morx` or `mort` substitutions.
///
/// Deleted glyphs are left in the buffer as [`DELETED_GLYPH`].
/// Use [`remove_deleted_glyphs`] or [`zero_width_deleted_glyphs`] afterwards.
pub fn substitute(plan: &ShapePlan, font: &Font, buffer: &mut Buffer) {
    let face = font.face();
    if let Some((table, blob)) = substitution_table(face) {
        let name = if table.is_extended() { "morx" } else { "mort" };
        let mut c = ApplyContext::new(plan, font, buffer, blob);
        apply_table(table, name, &mut c);
    }
}

/// Checks that the face has a `kerx` table.
pub fn has_positioning(face: &Face) -> bool {
    face.kerx.map(|t| t.has_data()).unwrap_or(false)
}

/// Applies `kerx` positioning.
///
/// Glyph positions must be already set.
pub fn position(plan: &ShapePlan, font: &Font, buffer: &mut Buffer) {
    let face = font.face();
    let table = match face.kerx {
        Some(ref table) => table,
        None => return,
    };

    let mut c = ApplyContext::new(plan, font, buffer, face.raw.kerx);
    // An absent `ankr` table is fine, anchors then resolve to the origin.
    c.set_ankr_table(face.ankr.as_ref());
    apply_table(table, "kerx", &mut c);
}

/// Checks that the face has a `trak` table.
pub fn has_tracking(face: &Face) -> bool {
    face.trak.map(|t| t.has_data()).unwrap_or(false)
}

/// Applies `trak` tracking for the font's point size.
pub fn track(plan: &ShapePlan, font: &Font, buffer: &mut Buffer) {
    let face = font.face();
    if let Some(ref table) = face.trak {
        let mut c = ApplyContext::new(plan, font, buffer, None);
        apply_table(table, "trak", &mut c);
    }
}

/// Zeroes positions of deleted glyphs, keeping them in the buffer.
pub fn zero_width_deleted_glyphs(buffer: &mut Buffer) {
    let len = buffer.len;
    for (info, pos) in buffer.info[..len].iter().zip(&mut buffer.pos[..len]) {
        if info.glyph_id == DELETED_GLYPH {
            pos.x_advance = 0;
            pos.y_advance = 0;
            pos.x_offset = 0;
            pos.y_offset = 0;
        }
    }
}

/// Removes deleted glyphs from the buffer.
///
/// Clusters of removed glyphs are merged into their neighbours.
pub fn remove_deleted_glyphs(buffer: &mut Buffer) {
    buffer.delete_glyphs_inplace(|info| info.glyph_id == DELETED_GLYPH);
}

/// Returns a language declared in the `ltag` table.
pub fn language(face: &Face, index: u32) -> Option<Language> {
    face.ltag?.language(index)
}


/// A feature setting from the `feat` table.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct FeatureSettingRecord {
    /// The `name` table id of the setting.
    pub name_id: u16,
    /// The selector that enables the setting.
    pub enable: u16,
    /// The selector that disables the setting.
    ///
    /// The default selector for exclusive features, `enable + 1` otherwise.
    pub disable: u16,
}

/// The result of a [`feature_settings`] call.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct FeatureSettings {
    /// The number of settings the feature has.
    pub total: usize,
    /// The number of records written.
    pub written: usize,
    /// The index of the default setting. Only exclusive features have one.
    pub default_index: Option<u16>,
}

/// Reads settings of a feature type from the `feat` table.
///
/// Writes up to `records.len()` settings starting at `start_offset` and
/// returns how many were written along with the total. Call again with
/// `start_offset` advanced by `written` to read the rest.
///
/// A missing table or feature results in zero settings.
pub fn feature_settings(
    face: &Face,
    kind: u16,
    start_offset: usize,
    records: Option<&mut [FeatureSettingRecord]>,
) -> FeatureSettings {
    let mut result = FeatureSettings::default();

    let table = match face.feat {
        Some(ref table) => table,
        None => return result,
    };

    let feature = match table.feature(kind) {
        Some(v) => v,
        None => return result,
    };

    let settings = match table.settings(&feature) {
        Some(v) => v,
        None => return result,
    };

    let mut default_selector = None;
    if feature.is_exclusive() {
        let index = feature.default_index();
        // An out of range default reads as selector 0.
        default_selector = Some(settings.get(index).map_or(0, |s| s.setting));
        result.default_index = Some(index);
    }

    result.total = usize::from(settings.len());

    if let Some(records) = records {
        let settings = settings.into_iter().skip(start_offset);
        for (record, setting) in records.iter_mut().zip(settings) {
            *record = FeatureSettingRecord {
                name_id: setting.name_index as u16,
                enable: setting.setting,
                disable: default_selector.unwrap_or(setting.setting.wrapping_add(1)),
            };
            result.written += 1;
        }
    }

    result
}

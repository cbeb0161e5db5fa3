use aat_layout::aat::{self, FeatureSettingRecord, FeatureType};
use aat_layout::{Buffer, Direction, Face, Font, ShapePlan, Tag};

use crate::font::{feat, kerx, kerx_pairs, ltag, morx, single_lookup, trak, FontBuilder};

#[test]
fn table_presence() {
    let lookup = single_lookup(&[(2, 0xFFFF)]);
    let font_data = FontBuilder::new(10, 500)
        .table(b"morx", &morx(1, &[], &[(4, 1, &lookup[..])]))
        .table(b"kerx", &kerx(0, &kerx_pairs(&[(1, 2, -10)])))
        .build();
    let face = Face::from_slice(&font_data, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), 10);
    assert_eq!(face.units_per_em(), 1000);
    assert!(aat::has_substitution(&face));
    assert!(aat::has_positioning(&face));
    assert!(!aat::has_tracking(&face));

    let font_data = FontBuilder::new(10, 500)
        .table(b"trak", &trak(&[(12, 0)]))
        .build();
    let face = Face::from_slice(&font_data, 0).unwrap();
    assert!(!aat::has_substitution(&face));
    assert!(!aat::has_positioning(&face));
    assert!(aat::has_tracking(&face));
}

#[test]
fn not_a_font() {
    assert!(Face::from_slice(&[0, 1, 0, 0, 0, 0], 0).is_none());
}

#[test]
fn keep_deleted_glyphs() {
    let lookup = single_lookup(&[(2, 0xFFFF)]);
    let font_data = FontBuilder::new(10, 500)
        .table(b"morx", &morx(1, &[], &[(4, 1, &lookup[..])]))
        .build();
    let face = Face::from_slice(&font_data, 0).unwrap();
    let font = Font::new(&face);
    let plan = ShapePlan::new(&face, Direction::LeftToRight, &[]);

    let mut buffer = Buffer::new();
    for (i, glyph) in [1, 2, 3].iter().enumerate() {
        buffer.add_glyph(*glyph, i as u32);
    }

    aat::substitute(&plan, &font, &mut buffer);
    for pos in buffer.glyph_positions_mut() {
        pos.x_advance = 500;
    }

    aat::zero_width_deleted_glyphs(&mut buffer);
    let glyphs: Vec<_> = buffer.glyph_infos().iter().map(|i| i.glyph_id).collect();
    let advances: Vec<_> = buffer.glyph_positions().iter().map(|p| p.x_advance).collect();
    assert_eq!(glyphs, [1, aat::DELETED_GLYPH, 3]);
    assert_eq!(advances, [500, 0, 500]);

    aat::remove_deleted_glyphs(&mut buffer);
    assert_eq!(buffer.len(), 2);
}

#[test]
fn plan_options() {
    let font_data = FontBuilder::new(10, 500).build();
    let face = Face::from_slice(&font_data, 0).unwrap();

    let plan = ShapePlan::new(&face, Direction::TopToBottom, &[]);
    assert_eq!(plan.direction(), Direction::TopToBottom);
    assert!(plan.requested_kerning());
    assert!(plan.requested_tracking());

    let features: [aat_layout::Feature; 2] = ["-kern".parse().unwrap(), "trak=0".parse().unwrap()];
    let plan = ShapePlan::new(&face, Direction::LeftToRight, &features);
    assert!(!plan.requested_kerning());
    assert!(!plan.requested_tracking());
}

#[test]
fn feature_mappings() {
    let smcp = aat::find_feature_mapping(Tag::from_bytes(b"smcp")).unwrap();
    assert_eq!(smcp.kind, FeatureType::LowerCase);
    assert_eq!(smcp.selector_to_enable, aat::feature_selector::LOWER_CASE_SMALL_CAPS);
    assert!(aat::find_feature_mapping(Tag::from_bytes(b"kern")).is_none());
}

#[test]
fn feature_settings() {
    let feat = feat(&[
        (1, 0, &[(2, 300), (4, 301)][..]),
        (37, 0xC001, &[(0, 310), (1, 311), (2, 312)][..]),
    ]);
    let font_data = FontBuilder::new(10, 500).table(b"feat", &feat).build();
    let face = Face::from_slice(&font_data, 0).unwrap();

    let mut records = [FeatureSettingRecord::default(); 2];
    let result = aat::feature_settings(&face, 37, 0, Some(&mut records));
    assert_eq!((result.total, result.written), (3, 2));
    assert_eq!(result.default_index, Some(1));
    assert_eq!(records[0], FeatureSettingRecord { name_id: 310, enable: 0, disable: 1 });

    let result = aat::feature_settings(&face, 37, 2, Some(&mut records));
    assert_eq!(result.written, 1);
    assert_eq!(records[0].enable, 2);

    let result = aat::feature_settings(&face, 1, 0, Some(&mut records));
    assert_eq!(result.default_index, None);
    assert_eq!(records[1], FeatureSettingRecord { name_id: 301, enable: 4, disable: 5 });
}

#[test]
fn languages() {
    let font_data = FontBuilder::new(10, 500)
        .table(b"ltag", &ltag(&["en", "zh-Hant"]))
        .build();
    let face = Face::from_slice(&font_data, 0).unwrap();
    assert_eq!(aat::language(&face, 0).unwrap().as_str(), "en");
    assert_eq!(aat::language(&face, 1).unwrap().as_str(), "zh-hant");
    assert!(aat::language(&face, 2).is_none());
}

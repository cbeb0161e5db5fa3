use crate::font::{feat, morx, single_lookup, state_table, FontBuilder};
use crate::shape;

const ALL: u32 = 0xFFFF_FFFF;

fn font_with_morx(morx: &[u8]) -> Vec<u8> {
    FontBuilder::new(20, 500).table(b"morx", morx).build()
}

#[test]
fn noncontextual_001() {
    let lookup = single_lookup(&[(2, 8)]);
    let font = font_with_morx(&morx(1, &[], &[(4, 1, &lookup[..])]));
    assert_eq!(shape(&font, &[1, 2, 3], ""), "1=0+500|8=1+500|3=2+500");
}

#[test]
fn noncontextual_deletion_001() {
    let lookup = single_lookup(&[(2, 0xFFFF)]);
    let font = font_with_morx(&morx(1, &[], &[(4, 1, &lookup[..])]));
    assert_eq!(shape(&font, &[1, 2, 3], ""), "1=0+500|3=2+500");
}

#[test]
fn noncontextual_deletion_002() {
    // A deleted first glyph merges its cluster forward.
    let lookup = single_lookup(&[(1, 0xFFFF)]);
    let font = font_with_morx(&morx(1, &[], &[(4, 1, &lookup[..])]));
    assert_eq!(shape(&font, &[1, 2, 3], ""), "2=0+500|3=2+500");
}

#[test]
fn rearrangement_001() {
    let states = [
        0u16, 0, 0, 0, 1,
        0, 0, 0, 0, 2,
    ];
    let entries = [
        0u16, 0,
        1, 0x8000,
        0, 0x2001,
    ];
    let machine = state_table((1, 9), &states, &entries, &[]);
    let font = font_with_morx(&morx(1, &[], &[(0, 1, &machine[..])]));
    assert_eq!(shape(&font, &[1, 2, 15], ""), "2=0+500|1=0+500|15=2+500");
}

#[test]
fn ligature_001() {
    let states = [
        0u16, 0, 0, 0, 1,
        0, 0, 0, 0, 2,
    ];
    let entries = [
        0u16, 0, 0,
        1, 0x8000, 0,
        0, 0xA000, 0,
    ];
    let machine = state_table((1, 9), &states, &entries, &[0, 0, 0]);
    let actions_offset = machine.len();
    let components_offset = actions_offset + 8;
    let ligatures_offset = components_offset + 6;
    let subtable = machine
        .patch_u32(16, actions_offset)
        .patch_u32(20, components_offset)
        .patch_u32(24, ligatures_offset)
        .extend([0u32, 0x8000_0000])
        .extend([0u16, 0, 1])
        .extend([0u16, 9]);

    let font = font_with_morx(&morx(1, &[], &[(2, 1, &subtable[..])]));
    assert_eq!(shape(&font, &[1, 2, 15], ""), "9=0+500|15=2+500");
}

#[test]
fn feature_controlled_001() {
    // Lower case small caps enables the second subtable flag.
    let lookup = single_lookup(&[(2, 9)]);
    let morx = morx(1, &[(37, 1, 2, ALL)], &[(4, 2, &lookup[..])]);
    let feat = feat(&[(37, 0x8000, &[(0, 300), (1, 301)][..])]);
    let font = FontBuilder::new(20, 500)
        .table(b"feat", &feat)
        .table(b"morx", &morx)
        .build();

    assert_eq!(shape(&font, &[2], ""), "2=0+500");
    assert_eq!(shape(&font, &[2], "--features=smcp"), "9=0+500");
    assert_eq!(shape(&font, &[2], "--features=smcp,-smcp"), "2=0+500");
}

#[test]
fn feature_controlled_002() {
    // Without a `feat` table features cannot be requested.
    let lookup = single_lookup(&[(2, 9)]);
    let font = font_with_morx(&morx(1, &[(37, 1, 2, ALL)], &[(4, 2, &lookup[..])]));
    assert_eq!(shape(&font, &[2], "--features=smcp"), "2=0+500");
}

#[test]
fn deprecated_small_caps_001() {
    let lookup = single_lookup(&[(2, 9)]);
    let morx = morx(1, &[(3, 3, 2, ALL)], &[(4, 2, &lookup[..])]);
    let feat = feat(&[(3, 0x8000, &[(0, 300), (3, 301)][..])]);
    let font = FontBuilder::new(20, 500)
        .table(b"feat", &feat)
        .table(b"morx", &morx)
        .build();

    assert_eq!(shape(&font, &[2], "--features=smcp"), "9=0+500");
}

#[test]
fn disabling_feature_001() {
    // A feature entry can clear default flags.
    let lookup = single_lookup(&[(2, 9)]);
    let morx = morx(1, &[(1, 3, 0, !1)], &[(4, 1, &lookup[..])]);
    let feat = feat(&[(1, 0, &[(2, 300), (3, 301)][..])]);
    let font = FontBuilder::new(20, 500)
        .table(b"feat", &feat)
        .table(b"morx", &morx)
        .build();

    assert_eq!(shape(&font, &[2], ""), "9=0+500");
    assert_eq!(shape(&font, &[2], "--features=-liga"), "2=0+500");
}

#[test]
fn mort_fallback_001() {
    // An obsolete `mort` table with a noncontextual subtable.
    let lookup = single_lookup(&[(2, 8)]);
    let subtable_len = 8 + lookup.len() as u16;
    let mort = crate::font::Data::new()
        .extend([1u16, 0])
        .push(1u32)
        .push(1u32) // default flags
        .push(12 + u32::from(subtable_len))
        .extend([0u16, 1]) // features, subtables
        .push(subtable_len)
        .push(4u16) // coverage
        .push(1u32)
        .bytes(&lookup);

    let font = FontBuilder::new(20, 500).table(b"mort", &mort).build();
    assert_eq!(shape(&font, &[2], ""), "8=0+500");
}

#[test]
fn morx_wins_over_mort_001() {
    let to_8 = single_lookup(&[(2, 8)]);
    let to_9 = single_lookup(&[(2, 9)]);
    let mort_len = 8 + to_9.len() as u16;
    let mort = crate::font::Data::new()
        .extend([1u16, 0])
        .push(1u32)
        .push(1u32)
        .push(12 + u32::from(mort_len))
        .extend([0u16, 1])
        .push(mort_len)
        .push(4u16)
        .push(1u32)
        .bytes(&to_9);

    let font = FontBuilder::new(20, 500)
        .table(b"mort", &mort)
        .table(b"morx", &morx(1, &[], &[(4, 1, &to_8[..])]))
        .build();
    assert_eq!(shape(&font, &[2], ""), "8=0+500");
}

#[test]
fn malformed_morx_001() {
    let lookup = single_lookup(&[(2, 8)]);
    let mut data = morx(1, &[], &[(4, 1, &lookup[..])]).to_vec();
    // Cut the lookup in half.
    data.truncate(data.len() - 8);
    let font = font_with_morx(&data);
    assert_eq!(shape(&font, &[1, 2], ""), "1=0+500|2=1+500");
}

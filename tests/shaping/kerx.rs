use crate::font::{kerx, kerx_pairs, morx, single_lookup, FontBuilder};
use crate::shape;

fn font_with_kerx(coverage: u32) -> Vec<u8> {
    let pairs = kerx_pairs(&[(1, 2, -40), (2, 3, 30)]);
    FontBuilder::new(20, 500).table(b"kerx", &kerx(coverage, &pairs)).build()
}

#[test]
fn pair_kerning_001() {
    let font = font_with_kerx(0);
    assert_eq!(
        shape(&font, &[1, 2, 3, 4], ""),
        "1=0+480|2=1@-20,0+495|3=2@15,0+515|4=3+500"
    );
}

#[test]
fn pair_kerning_002() {
    let font = font_with_kerx(0);
    assert_eq!(
        shape(&font, &[1, 2], "--features=-kern"),
        "1=0+500|2=1+500"
    );
}

#[test]
fn pair_kerning_003() {
    // Kerning disabled for the second cluster only.
    let font = font_with_kerx(0);
    assert_eq!(
        shape(&font, &[1, 2, 3], "--features=kern[1:2]=0"),
        "1=0+500|2=1+500|3=2+500"
    );
}

#[test]
fn pair_kerning_004() {
    let font = font_with_kerx(0);
    assert_eq!(
        shape(&font, &[1, 2], "--show-flags"),
        "1=0+480|2=1@-20,0+480#1"
    );
}

#[test]
fn right_to_left_001() {
    // Logical order is kept, kerning applies to the reversed sequence.
    let font = font_with_kerx(0);
    assert_eq!(
        shape(&font, &[2, 1], "--direction=rtl"),
        "2=0@-20,0+480|1=1+480"
    );
}

#[test]
fn cross_stream_001() {
    let font = font_with_kerx(0x4000_0000);
    assert_eq!(
        shape(&font, &[1, 2, 3], ""),
        "1=0+500|2=1@0,-40+500|3=2@0,30+500"
    );
}

#[test]
fn vertical_001() {
    let font = font_with_kerx(0x8000_0000);
    assert_eq!(
        shape(&font, &[1, 2], "--direction=ttb"),
        "1=0+0,-1020|2=1@0,-20+0,-1020"
    );
}

#[test]
fn vertical_002() {
    // A horizontal subtable doesn't apply to vertical text.
    let font = font_with_kerx(0);
    assert_eq!(
        shape(&font, &[1, 2], "--direction=ttb"),
        "1=0+0,-1000|2=1+0,-1000"
    );
}

#[test]
fn variable_subtable_001() {
    let font = font_with_kerx(0x2000_0000);
    assert_eq!(shape(&font, &[1, 2], ""), "1=0+500|2=1+500");
}

#[test]
fn after_deletion_001() {
    // Deleted glyphs are gone before kerning, so 1 and 2 become a pair.
    let lookup = single_lookup(&[(5, 0xFFFF)]);
    let pairs = kerx_pairs(&[(1, 2, -40)]);
    let font = FontBuilder::new(20, 500)
        .table(b"kerx", &kerx(0, &pairs))
        .table(b"morx", &morx(1, &[], &[(4, 1, &lookup[..])]))
        .build();

    assert_eq!(shape(&font, &[1, 5, 2], ""), "1=0+480|2=2@-20,0+480");
}

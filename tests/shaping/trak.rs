use crate::font::{trak, FontBuilder};
use crate::shape;

fn font_with_trak() -> Vec<u8> {
    FontBuilder::new(20, 500)
        .table(b"trak", &trak(&[(10, -100), (20, -50)]))
        .build()
}

#[test]
fn tracking_001() {
    let font = font_with_trak();
    assert_eq!(
        shape(&font, &[1, 2], "--font-ptem=15"),
        "1=0@-38,0+425|2=1@-38,0+425"
    );
}

#[test]
fn tracking_002() {
    // Sizes outside of the table are clamped.
    let font = font_with_trak();
    assert_eq!(shape(&font, &[1], "--font-ptem=5"), "1=0@-50,0+400");
    assert_eq!(shape(&font, &[1], "--font-ptem=40"), "1=0@-25,0+450");
}

#[test]
fn tracking_003() {
    // No point size, no tracking.
    let font = font_with_trak();
    assert_eq!(shape(&font, &[1, 2], ""), "1=0+500|2=1+500");
}

#[test]
fn tracking_004() {
    let font = font_with_trak();
    assert_eq!(
        shape(&font, &[1, 2], "--font-ptem=20 --features=-trak"),
        "1=0+500|2=1+500"
    );
}

#[test]
fn tracking_005() {
    let font = font_with_trak();
    assert_eq!(
        shape(&font, &[1, 2, 3], "--font-ptem=20 --features=trak[1:2]=0"),
        "1=0@-25,0+450|2=1+500|3=2@-25,0+450"
    );
}

#[test]
fn tracking_006() {
    // A single size applies to every point size.
    let font = FontBuilder::new(20, 500)
        .table(b"trak", &trak(&[(12, 40)]))
        .build();
    assert_eq!(shape(&font, &[1], "--font-ptem=72"), "1=0@20,0+540");
}

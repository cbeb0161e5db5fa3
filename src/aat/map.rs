use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::{Face, Mask, Tag};

/// AAT feature types used by the OpenType tag mapping.
#[allow(missing_docs)]
#[repr(u16)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FeatureType {
    Ligatures = 1,
    LetterCase = 3,
    VerticalSubstitution = 4,
    NumberSpacing = 6,
    VerticalPosition = 10,
    Fractions = 11,
    TypographicExtras = 14,
    MathematicalExtras = 15,
    CharacterAlternatives = 17,
    StyleOptions = 19,
    CharacterShape = 20,
    NumberCase = 21,
    TextSpacing = 22,
    Transliteration = 23,
    RubyKana = 28,
    ItalicCjkRoman = 32,
    CaseSensitiveLayout = 33,
    AlternateKana = 34,
    StylisticAlternatives = 35,
    ContextualAlternatives = 36,
    LowerCase = 37,
    UpperCase = 38,
}

#[allow(missing_docs)]
pub mod feature_selector {
    // FeatureType::Ligatures
    pub const COMMON_LIGATURES_ON: u16 = 2;
    pub const COMMON_LIGATURES_OFF: u16 = 3;
    pub const RARE_LIGATURES_ON: u16 = 4;
    pub const RARE_LIGATURES_OFF: u16 = 5;
    pub const CONTEXTUAL_LIGATURES_ON: u16 = 18;
    pub const CONTEXTUAL_LIGATURES_OFF: u16 = 19;
    pub const HISTORICAL_LIGATURES_ON: u16 = 20;
    pub const HISTORICAL_LIGATURES_OFF: u16 = 21;

    // FeatureType::LetterCase
    pub const SMALL_CAPS: u16 = 3; // deprecated
    pub const UNICASE_ON: u16 = 14;
    pub const UNICASE_OFF: u16 = 15;

    // FeatureType::VerticalSubstitution
    pub const SUBSTITUTE_VERTICAL_FORMS_ON: u16 = 0;
    pub const SUBSTITUTE_VERTICAL_FORMS_OFF: u16 = 1;

    // FeatureType::NumberSpacing
    pub const MONOSPACED_NUMBERS: u16 = 0;
    pub const PROPORTIONAL_NUMBERS: u16 = 1;

    // FeatureType::VerticalPosition
    pub const NORMAL_POSITION: u16 = 0;
    pub const SUPERIORS: u16 = 1;
    pub const INFERIORS: u16 = 2;
    pub const ORDINALS: u16 = 3;
    pub const SCIENTIFIC_INFERIORS: u16 = 4;

    // FeatureType::Fractions
    pub const NO_FRACTIONS: u16 = 0;
    pub const VERTICAL_FRACTIONS: u16 = 1;
    pub const DIAGONAL_FRACTIONS: u16 = 2;

    // FeatureType::TypographicExtras
    pub const SLASHED_ZERO_ON: u16 = 4;
    pub const SLASHED_ZERO_OFF: u16 = 5;

    // FeatureType::MathematicalExtras
    pub const MATHEMATICAL_GREEK_ON: u16 = 10;
    pub const MATHEMATICAL_GREEK_OFF: u16 = 11;

    // FeatureType::StyleOptions
    pub const NO_STYLE_OPTIONS: u16 = 0;
    pub const TITLING_CAPS: u16 = 4;

    // FeatureType::CharacterShape
    pub const TRADITIONAL_CHARACTERS: u16 = 0;
    pub const SIMPLIFIED_CHARACTERS: u16 = 1;
    pub const JIS1978_CHARACTERS: u16 = 2;
    pub const JIS1983_CHARACTERS: u16 = 3;
    pub const JIS1990_CHARACTERS: u16 = 4;
    pub const EXPERT_CHARACTERS: u16 = 10;
    pub const JIS2004_CHARACTERS: u16 = 11;
    pub const HOJO_CHARACTERS: u16 = 12;
    pub const NLC_CHARACTERS: u16 = 13;
    pub const TRADITIONAL_NAMES_CHARACTERS: u16 = 14;

    // FeatureType::NumberCase
    pub const LOWER_CASE_NUMBERS: u16 = 0;
    pub const UPPER_CASE_NUMBERS: u16 = 1;

    // FeatureType::TextSpacing
    pub const PROPORTIONAL_TEXT: u16 = 0;
    pub const MONOSPACED_TEXT: u16 = 1;
    pub const HALF_WIDTH_TEXT: u16 = 2;
    pub const THIRD_WIDTH_TEXT: u16 = 3;
    pub const QUARTER_WIDTH_TEXT: u16 = 4;
    pub const ALT_PROPORTIONAL_TEXT: u16 = 5;
    pub const ALT_HALF_WIDTH_TEXT: u16 = 6;

    // FeatureType::Transliteration
    pub const NO_TRANSLITERATION: u16 = 0;
    pub const HANJA_TO_HANGUL: u16 = 1;

    // FeatureType::RubyKana
    pub const RUBY_KANA_ON: u16 = 2;
    pub const RUBY_KANA_OFF: u16 = 3;

    // FeatureType::ItalicCjkRoman
    pub const CJK_ITALIC_ROMAN_ON: u16 = 2;
    pub const CJK_ITALIC_ROMAN_OFF: u16 = 3;

    // FeatureType::CaseSensitiveLayout
    pub const CASE_SENSITIVE_LAYOUT_ON: u16 = 0;
    pub const CASE_SENSITIVE_LAYOUT_OFF: u16 = 1;
    pub const CASE_SENSITIVE_SPACING_ON: u16 = 2;
    pub const CASE_SENSITIVE_SPACING_OFF: u16 = 3;

    // FeatureType::AlternateKana
    pub const ALTERNATE_HORIZ_KANA_ON: u16 = 0;
    pub const ALTERNATE_HORIZ_KANA_OFF: u16 = 1;
    pub const ALTERNATE_VERT_KANA_ON: u16 = 2;
    pub const ALTERNATE_VERT_KANA_OFF: u16 = 3;

    // FeatureType::StylisticAlternatives
    pub const STYLISTIC_ALT_ONE_ON: u16 = 2;
    pub const STYLISTIC_ALT_ONE_OFF: u16 = 3;
    pub const STYLISTIC_ALT_TWO_ON: u16 = 4;
    pub const STYLISTIC_ALT_TWO_OFF: u16 = 5;
    pub const STYLISTIC_ALT_THREE_ON: u16 = 6;
    pub const STYLISTIC_ALT_THREE_OFF: u16 = 7;
    pub const STYLISTIC_ALT_FOUR_ON: u16 = 8;
    pub const STYLISTIC_ALT_FOUR_OFF: u16 = 9;
    pub const STYLISTIC_ALT_FIVE_ON: u16 = 10;
    pub const STYLISTIC_ALT_FIVE_OFF: u16 = 11;
    pub const STYLISTIC_ALT_SIX_ON: u16 = 12;
    pub const STYLISTIC_ALT_SIX_OFF: u16 = 13;
    pub const STYLISTIC_ALT_SEVEN_ON: u16 = 14;
    pub const STYLISTIC_ALT_SEVEN_OFF: u16 = 15;
    pub const STYLISTIC_ALT_EIGHT_ON: u16 = 16;
    pub const STYLISTIC_ALT_EIGHT_OFF: u16 = 17;
    pub const STYLISTIC_ALT_NINE_ON: u16 = 18;
    pub const STYLISTIC_ALT_NINE_OFF: u16 = 19;
    pub const STYLISTIC_ALT_TEN_ON: u16 = 20;
    pub const STYLISTIC_ALT_TEN_OFF: u16 = 21;
    pub const STYLISTIC_ALT_ELEVEN_ON: u16 = 22;
    pub const STYLISTIC_ALT_ELEVEN_OFF: u16 = 23;
    pub const STYLISTIC_ALT_TWELVE_ON: u16 = 24;
    pub const STYLISTIC_ALT_TWELVE_OFF: u16 = 25;
    pub const STYLISTIC_ALT_THIRTEEN_ON: u16 = 26;
    pub const STYLISTIC_ALT_THIRTEEN_OFF: u16 = 27;
    pub const STYLISTIC_ALT_FOURTEEN_ON: u16 = 28;
    pub const STYLISTIC_ALT_FOURTEEN_OFF: u16 = 29;
    pub const STYLISTIC_ALT_FIFTEEN_ON: u16 = 30;
    pub const STYLISTIC_ALT_FIFTEEN_OFF: u16 = 31;
    pub const STYLISTIC_ALT_SIXTEEN_ON: u16 = 32;
    pub const STYLISTIC_ALT_SIXTEEN_OFF: u16 = 33;
    pub const STYLISTIC_ALT_SEVENTEEN_ON: u16 = 34;
    pub const STYLISTIC_ALT_SEVENTEEN_OFF: u16 = 35;
    pub const STYLISTIC_ALT_EIGHTEEN_ON: u16 = 36;
    pub const STYLISTIC_ALT_EIGHTEEN_OFF: u16 = 37;
    pub const STYLISTIC_ALT_NINETEEN_ON: u16 = 38;
    pub const STYLISTIC_ALT_NINETEEN_OFF: u16 = 39;
    pub const STYLISTIC_ALT_TWENTY_ON: u16 = 40;
    pub const STYLISTIC_ALT_TWENTY_OFF: u16 = 41;

    // FeatureType::ContextualAlternatives
    pub const CONTEXTUAL_ALTERNATES_ON: u16 = 0;
    pub const CONTEXTUAL_ALTERNATES_OFF: u16 = 1;
    pub const SWASH_ALTERNATES_ON: u16 = 2;
    pub const SWASH_ALTERNATES_OFF: u16 = 3;
    pub const CONTEXTUAL_SWASH_ALTERNATES_ON: u16 = 4;
    pub const CONTEXTUAL_SWASH_ALTERNATES_OFF: u16 = 5;

    // FeatureType::LowerCase
    pub const DEFAULT_LOWER_CASE: u16 = 0;
    pub const LOWER_CASE_SMALL_CAPS: u16 = 1;
    pub const LOWER_CASE_PETITE_CAPS: u16 = 2;

    // FeatureType::UpperCase
    pub const DEFAULT_UPPER_CASE: u16 = 0;
    pub const UPPER_CASE_SMALL_CAPS: u16 = 1;
    pub const UPPER_CASE_PETITE_CAPS: u16 = 2;

    // Features that can only be turned on use the first selector past
    // their type's range as the "off" selector. No chain feature uses it.

    /// FeatureType::CharacterShape
    pub const CHARACTER_SHAPE_NO_OFF_SELECTOR: u16 = 16;
    /// FeatureType::TextSpacing
    pub const TEXT_SPACING_NO_OFF_SELECTOR: u16 = 7;
    /// FeatureType::NumberSpacing
    pub const NUMBER_SPACING_NO_OFF_SELECTOR: u16 = 4;
    /// FeatureType::NumberCase
    pub const NUMBER_CASE_NO_OFF_SELECTOR: u16 = 2;
}

use feature_selector::*;

/// An OpenType feature tag mapped to an AAT feature type and selectors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FeatureMapping {
    /// The OpenType feature tag.
    pub tag: Tag,
    /// The AAT feature type.
    pub kind: FeatureType,
    /// The selector to use when the feature is enabled.
    pub selector_to_enable: u16,
    /// The selector to use when the feature is disabled.
    pub selector_to_disable: u16,
}

impl FeatureMapping {
    const fn new(
        tag: &[u8; 4],
        kind: FeatureType,
        selector_to_enable: u16,
        selector_to_disable: u16,
    ) -> Self {
        FeatureMapping {
            tag: Tag::from_bytes(tag),
            kind,
            selector_to_enable,
            selector_to_disable,
        }
    }

    /// Checks that the feature has no real "off" selector.
    pub fn is_enable_only(&self) -> bool {
        let no_off = match self.kind {
            FeatureType::CharacterShape => CHARACTER_SHAPE_NO_OFF_SELECTOR,
            FeatureType::TextSpacing => TEXT_SPACING_NO_OFF_SELECTOR,
            FeatureType::NumberSpacing => NUMBER_SPACING_NO_OFF_SELECTOR,
            FeatureType::NumberCase => NUMBER_CASE_NO_OFF_SELECTOR,
            _ => return false,
        };

        self.selector_to_disable == no_off
    }
}

/// Mapping from OpenType feature tags to AAT feature names and selectors.
///
/// Sorted by tag.
#[rustfmt::skip]
pub const FEATURE_MAPPINGS: &[FeatureMapping] = &[
    FeatureMapping::new(b"afrc", FeatureType::Fractions, VERTICAL_FRACTIONS, NO_FRACTIONS),
    FeatureMapping::new(b"c2pc", FeatureType::UpperCase, UPPER_CASE_PETITE_CAPS, DEFAULT_UPPER_CASE),
    FeatureMapping::new(b"c2sc", FeatureType::UpperCase, UPPER_CASE_SMALL_CAPS, DEFAULT_UPPER_CASE),
    FeatureMapping::new(b"calt", FeatureType::ContextualAlternatives, CONTEXTUAL_ALTERNATES_ON, CONTEXTUAL_ALTERNATES_OFF),
    FeatureMapping::new(b"case", FeatureType::CaseSensitiveLayout, CASE_SENSITIVE_LAYOUT_ON, CASE_SENSITIVE_LAYOUT_OFF),
    FeatureMapping::new(b"clig", FeatureType::Ligatures, CONTEXTUAL_LIGATURES_ON, CONTEXTUAL_LIGATURES_OFF),
    FeatureMapping::new(b"cpsp", FeatureType::CaseSensitiveLayout, CASE_SENSITIVE_SPACING_ON, CASE_SENSITIVE_SPACING_OFF),
    FeatureMapping::new(b"cswh", FeatureType::ContextualAlternatives, CONTEXTUAL_SWASH_ALTERNATES_ON, CONTEXTUAL_SWASH_ALTERNATES_OFF),
    FeatureMapping::new(b"dlig", FeatureType::Ligatures, RARE_LIGATURES_ON, RARE_LIGATURES_OFF),
    FeatureMapping::new(b"expt", FeatureType::CharacterShape, EXPERT_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"frac", FeatureType::Fractions, DIAGONAL_FRACTIONS, NO_FRACTIONS),
    FeatureMapping::new(b"fwid", FeatureType::TextSpacing, MONOSPACED_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"halt", FeatureType::TextSpacing, ALT_HALF_WIDTH_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"hist", FeatureType::Ligatures, HISTORICAL_LIGATURES_ON, HISTORICAL_LIGATURES_OFF),
    FeatureMapping::new(b"hkna", FeatureType::AlternateKana, ALTERNATE_HORIZ_KANA_ON, ALTERNATE_HORIZ_KANA_OFF),
    FeatureMapping::new(b"hlig", FeatureType::Ligatures, HISTORICAL_LIGATURES_ON, HISTORICAL_LIGATURES_OFF),
    FeatureMapping::new(b"hngl", FeatureType::Transliteration, HANJA_TO_HANGUL, NO_TRANSLITERATION),
    FeatureMapping::new(b"hojo", FeatureType::CharacterShape, HOJO_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"hwid", FeatureType::TextSpacing, HALF_WIDTH_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"ital", FeatureType::ItalicCjkRoman, CJK_ITALIC_ROMAN_ON, CJK_ITALIC_ROMAN_OFF),
    FeatureMapping::new(b"jp04", FeatureType::CharacterShape, JIS2004_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"jp78", FeatureType::CharacterShape, JIS1978_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"jp83", FeatureType::CharacterShape, JIS1983_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"jp90", FeatureType::CharacterShape, JIS1990_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"liga", FeatureType::Ligatures, COMMON_LIGATURES_ON, COMMON_LIGATURES_OFF),
    FeatureMapping::new(b"lnum", FeatureType::NumberCase, UPPER_CASE_NUMBERS, NUMBER_CASE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"mgrk", FeatureType::MathematicalExtras, MATHEMATICAL_GREEK_ON, MATHEMATICAL_GREEK_OFF),
    FeatureMapping::new(b"nlck", FeatureType::CharacterShape, NLC_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"onum", FeatureType::NumberCase, LOWER_CASE_NUMBERS, NUMBER_CASE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"ordn", FeatureType::VerticalPosition, ORDINALS, NORMAL_POSITION),
    FeatureMapping::new(b"palt", FeatureType::TextSpacing, ALT_PROPORTIONAL_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"pcap", FeatureType::LowerCase, LOWER_CASE_PETITE_CAPS, DEFAULT_LOWER_CASE),
    FeatureMapping::new(b"pkna", FeatureType::TextSpacing, PROPORTIONAL_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"pnum", FeatureType::NumberSpacing, PROPORTIONAL_NUMBERS, NUMBER_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"pwid", FeatureType::TextSpacing, PROPORTIONAL_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"qwid", FeatureType::TextSpacing, QUARTER_WIDTH_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"ruby", FeatureType::RubyKana, RUBY_KANA_ON, RUBY_KANA_OFF),
    FeatureMapping::new(b"sinf", FeatureType::VerticalPosition, SCIENTIFIC_INFERIORS, NORMAL_POSITION),
    FeatureMapping::new(b"smcp", FeatureType::LowerCase, LOWER_CASE_SMALL_CAPS, DEFAULT_LOWER_CASE),
    FeatureMapping::new(b"smpl", FeatureType::CharacterShape, SIMPLIFIED_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"ss01", FeatureType::StylisticAlternatives, STYLISTIC_ALT_ONE_ON, STYLISTIC_ALT_ONE_OFF),
    FeatureMapping::new(b"ss02", FeatureType::StylisticAlternatives, STYLISTIC_ALT_TWO_ON, STYLISTIC_ALT_TWO_OFF),
    FeatureMapping::new(b"ss03", FeatureType::StylisticAlternatives, STYLISTIC_ALT_THREE_ON, STYLISTIC_ALT_THREE_OFF),
    FeatureMapping::new(b"ss04", FeatureType::StylisticAlternatives, STYLISTIC_ALT_FOUR_ON, STYLISTIC_ALT_FOUR_OFF),
    FeatureMapping::new(b"ss05", FeatureType::StylisticAlternatives, STYLISTIC_ALT_FIVE_ON, STYLISTIC_ALT_FIVE_OFF),
    FeatureMapping::new(b"ss06", FeatureType::StylisticAlternatives, STYLISTIC_ALT_SIX_ON, STYLISTIC_ALT_SIX_OFF),
    FeatureMapping::new(b"ss07", FeatureType::StylisticAlternatives, STYLISTIC_ALT_SEVEN_ON, STYLISTIC_ALT_SEVEN_OFF),
    FeatureMapping::new(b"ss08", FeatureType::StylisticAlternatives, STYLISTIC_ALT_EIGHT_ON, STYLISTIC_ALT_EIGHT_OFF),
    FeatureMapping::new(b"ss09", FeatureType::StylisticAlternatives, STYLISTIC_ALT_NINE_ON, STYLISTIC_ALT_NINE_OFF),
    FeatureMapping::new(b"ss10", FeatureType::StylisticAlternatives, STYLISTIC_ALT_TEN_ON, STYLISTIC_ALT_TEN_OFF),
    FeatureMapping::new(b"ss11", FeatureType::StylisticAlternatives, STYLISTIC_ALT_ELEVEN_ON, STYLISTIC_ALT_ELEVEN_OFF),
    FeatureMapping::new(b"ss12", FeatureType::StylisticAlternatives, STYLISTIC_ALT_TWELVE_ON, STYLISTIC_ALT_TWELVE_OFF),
    FeatureMapping::new(b"ss13", FeatureType::StylisticAlternatives, STYLISTIC_ALT_THIRTEEN_ON, STYLISTIC_ALT_THIRTEEN_OFF),
    FeatureMapping::new(b"ss14", FeatureType::StylisticAlternatives, STYLISTIC_ALT_FOURTEEN_ON, STYLISTIC_ALT_FOURTEEN_OFF),
    FeatureMapping::new(b"ss15", FeatureType::StylisticAlternatives, STYLISTIC_ALT_FIFTEEN_ON, STYLISTIC_ALT_FIFTEEN_OFF),
    FeatureMapping::new(b"ss16", FeatureType::StylisticAlternatives, STYLISTIC_ALT_SIXTEEN_ON, STYLISTIC_ALT_SIXTEEN_OFF),
    FeatureMapping::new(b"ss17", FeatureType::StylisticAlternatives, STYLISTIC_ALT_SEVENTEEN_ON, STYLISTIC_ALT_SEVENTEEN_OFF),
    FeatureMapping::new(b"ss18", FeatureType::StylisticAlternatives, STYLISTIC_ALT_EIGHTEEN_ON, STYLISTIC_ALT_EIGHTEEN_OFF),
    FeatureMapping::new(b"ss19", FeatureType::StylisticAlternatives, STYLISTIC_ALT_NINETEEN_ON, STYLISTIC_ALT_NINETEEN_OFF),
    FeatureMapping::new(b"ss20", FeatureType::StylisticAlternatives, STYLISTIC_ALT_TWENTY_ON, STYLISTIC_ALT_TWENTY_OFF),
    FeatureMapping::new(b"subs", FeatureType::VerticalPosition, INFERIORS, NORMAL_POSITION),
    FeatureMapping::new(b"sups", FeatureType::VerticalPosition, SUPERIORS, NORMAL_POSITION),
    FeatureMapping::new(b"swsh", FeatureType::ContextualAlternatives, SWASH_ALTERNATES_ON, SWASH_ALTERNATES_OFF),
    FeatureMapping::new(b"titl", FeatureType::StyleOptions, TITLING_CAPS, NO_STYLE_OPTIONS),
    FeatureMapping::new(b"tnam", FeatureType::CharacterShape, TRADITIONAL_NAMES_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"tnum", FeatureType::NumberSpacing, MONOSPACED_NUMBERS, NUMBER_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"trad", FeatureType::CharacterShape, TRADITIONAL_CHARACTERS, CHARACTER_SHAPE_NO_OFF_SELECTOR),
    FeatureMapping::new(b"twid", FeatureType::TextSpacing, THIRD_WIDTH_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"unic", FeatureType::LetterCase, UNICASE_ON, UNICASE_OFF),
    FeatureMapping::new(b"valt", FeatureType::TextSpacing, ALT_PROPORTIONAL_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"vert", FeatureType::VerticalSubstitution, SUBSTITUTE_VERTICAL_FORMS_ON, SUBSTITUTE_VERTICAL_FORMS_OFF),
    FeatureMapping::new(b"vhal", FeatureType::TextSpacing, ALT_HALF_WIDTH_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"vkna", FeatureType::AlternateKana, ALTERNATE_VERT_KANA_ON, ALTERNATE_VERT_KANA_OFF),
    FeatureMapping::new(b"vpal", FeatureType::TextSpacing, ALT_PROPORTIONAL_TEXT, TEXT_SPACING_NO_OFF_SELECTOR),
    FeatureMapping::new(b"vrt2", FeatureType::VerticalSubstitution, SUBSTITUTE_VERTICAL_FORMS_ON, SUBSTITUTE_VERTICAL_FORMS_OFF),
    FeatureMapping::new(b"zero", FeatureType::TypographicExtras, SLASHED_ZERO_ON, SLASHED_ZERO_OFF),
];

/// Finds the AAT feature for an OpenType feature tag.
pub fn find_feature_mapping(tag: Tag) -> Option<&'static FeatureMapping> {
    FEATURE_MAPPINGS
        .binary_search_by(|m| m.tag.cmp(&tag))
        .ok()
        .map(|idx| &FEATURE_MAPPINGS[idx])
}


#[derive(Clone, Copy, Debug)]
pub(crate) struct FeatureInfo {
    pub kind: u16,
    pub setting: u16,
    pub is_exclusive: bool,
}

/// Collects requested AAT features before compiling them into chain flags.
pub(crate) struct MapBuilder<'a> {
    pub face: &'a Face<'a>,
    pub features: Vec<FeatureInfo>,
}

impl<'a> MapBuilder<'a> {
    pub fn new(face: &'a Face<'a>) -> Self {
        MapBuilder {
            face,
            features: Vec::new(),
        }
    }

    /// Requests an OpenType feature.
    ///
    /// Features the face doesn't expose in its `feat` table are ignored.
    pub fn add_feature(&mut self, tag: Tag, value: u32) -> Option<()> {
        let feat = self.face.feat.as_ref()?;

        if tag == Tag::from_bytes(b"aalt") {
            let kind = FeatureType::CharacterAlternatives as u16;
            if !feat.exposes_feature(kind) {
                return Some(());
            }

            self.features.push(FeatureInfo {
                kind,
                setting: value as u16,
                is_exclusive: true,
            });
            return Some(());
        }

        let mapping = find_feature_mapping(tag)?;

        let mut feature = feat.feature(mapping.kind as u16).filter(|f| f.has_data());
        if feature.is_none()
            && mapping.kind == FeatureType::LowerCase
            && mapping.selector_to_enable == LOWER_CASE_SMALL_CAPS
        {
            // Chain flags fall back to the deprecated small caps selector,
            // so a font may only expose that one.
            feature = feat.feature(FeatureType::LetterCase as u16).filter(|f| f.has_data());
        }

        let feature = feature?;
        let setting = if value != 0 {
            mapping.selector_to_enable
        } else {
            mapping.selector_to_disable
        };

        self.features.push(FeatureInfo {
            kind: mapping.kind as u16,
            setting,
            is_exclusive: feature.is_exclusive(),
        });

        Some(())
    }

    pub fn has_feature(&self, kind: u16, setting: u16) -> bool {
        self.features
            .binary_search_by(|probe| probe.kind.cmp(&kind).then(probe.setting.cmp(&setting)))
            .is_ok()
    }

    pub fn compile(&mut self) -> Map {
        // Sort features and merge duplicates. The sort is stable,
        // so the last request for a setting wins.
        self.features.sort_by(|a, b| {
            if a.kind != b.kind {
                a.kind.cmp(&b.kind)
            } else if !a.is_exclusive && (a.setting & !1) != (b.setting & !1) {
                a.setting.cmp(&b.setting)
            } else {
                core::cmp::Ordering::Equal
            }
        });

        if !self.features.is_empty() {
            let mut j = 0;
            for i in 1..self.features.len() {
                // Nonexclusive feature selectors come in even/odd pairs to turn a setting on/off
                // respectively, so we mask out the low-order bit when checking for "duplicates"
                // (selectors referring to the same feature setting) here.
                let (a, b) = (self.features[i], self.features[j]);
                let same = a.kind == b.kind
                    && (a.is_exclusive || (a.setting & !1) == (b.setting & !1));
                if !same {
                    j += 1;
                }

                self.features[j] = a;
            }
            self.features.truncate(j + 1);
        }

        let mut map = Map::default();
        super::compile_map(self, &mut map);
        map
    }
}


/// Compiled per-chain subtable flags.
#[derive(Clone, Default, Debug)]
pub struct Map {
    pub(crate) chain_flags: SmallVec<[Mask; 4]>,
}

impl Map {
    /// Returns the flags of a chain.
    #[inline]
    pub fn chain_flags(&self, index: usize) -> Option<Mask> {
        self.chain_flags.get(index).copied()
    }
}

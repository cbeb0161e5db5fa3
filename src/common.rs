use alloc::string::String;

use crate::Tag;

/// Defines the direction in which text is to be read.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Initial, unset direction.
    Invalid,
    /// Text is set horizontally from left to right.
    LeftToRight,
    /// Text is set horizontally from right to left.
    RightToLeft,
    /// Text is set vertically from top to bottom.
    TopToBottom,
    /// Text is set vertically from bottom to top.
    BottomToTop,
}

impl Direction {
    #[inline]
    pub(crate) fn is_horizontal(self) -> bool {
        match self {
            Direction::Invalid => false,
            Direction::LeftToRight => true,
            Direction::RightToLeft => true,
            Direction::TopToBottom => false,
            Direction::BottomToTop => false,
        }
    }

    #[inline]
    pub(crate) fn is_vertical(self) -> bool {
        !self.is_horizontal() && self != Direction::Invalid
    }

    #[inline]
    pub(crate) fn is_forward(self) -> bool {
        match self {
            Direction::Invalid => false,
            Direction::LeftToRight => true,
            Direction::RightToLeft => false,
            Direction::TopToBottom => true,
            Direction::BottomToTop => false,
        }
    }

    #[inline]
    pub(crate) fn is_backward(self) -> bool {
        !self.is_forward() && self != Direction::Invalid
    }
}

impl Default for Direction {
    #[inline]
    fn default() -> Self {
        Direction::Invalid
    }
}

impl core::str::FromStr for Direction {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("invalid direction");
        }

        // harfbuzz also matches only the first letter.
        match s.as_bytes()[0].to_ascii_lowercase() {
            b'l' => Ok(Direction::LeftToRight),
            b'r' => Ok(Direction::RightToLeft),
            b't' => Ok(Direction::TopToBottom),
            b'b' => Ok(Direction::BottomToTop),
            _ => Err("invalid direction"),
        }
    }
}


/// A BCP 47 language tag, as stored in the `ltag` table.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Language(String);

impl Language {
    /// Returns the language as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl core::fmt::Display for Language {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Language {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("invalid language");
        }

        if !s.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_') {
            return Err("invalid language");
        }

        // Languages are case-insensitive. Store them lowercased, with `-` separators.
        let s: String = s.chars()
            .map(|c| if c == '_' { '-' } else { c.to_ascii_lowercase() })
            .collect();

        Ok(Language(s))
    }
}


/// A feature tag with an accompanying range specifying on which subslice of
/// `shape`s input it should be applied.
///
/// `start` and `end` are cluster values; the default range covers the whole buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Feature {
    /// Feature tag.
    pub tag: Tag,
    /// Feature value. Zero disables the feature.
    pub value: u32,
    /// First cluster the feature applies to.
    pub start: u32,
    /// One past the last cluster the feature applies to.
    pub end: u32,
}

impl Feature {
    /// Create a new `Feature` struct.
    pub fn new(tag: Tag, value: u32, range: impl core::ops::RangeBounds<usize>) -> Feature {
        use core::ops::Bound;

        let start = match range.start_bound() {
            Bound::Included(&n) => n as u32,
            Bound::Excluded(&n) => n as u32 + 1,
            Bound::Unbounded => 0,
        };

        let end = match range.end_bound() {
            Bound::Included(&n) => n as u32 + 1,
            Bound::Excluded(&n) => n as u32,
            Bound::Unbounded => u32::MAX,
        };

        Feature { tag, value, start, end }
    }

    #[inline]
    pub(crate) fn is_global(&self) -> bool {
        self.start == 0 && self.end == u32::MAX
    }
}

impl core::str::FromStr for Feature {
    type Err = &'static str;

    /// Parses a feature from a string.
    ///
    /// Accepts `tag`, `+tag`, `-tag`, `tag=value` and `tag[start:end]=value`.
    ///
    /// ```
    /// # use aat_layout::{Feature, Tag};
    /// let f: Feature = "liga[3:5]=0".parse().unwrap();
    /// assert_eq!(f.tag, Tag::from_bytes(b"liga"));
    /// assert_eq!((f.start, f.end, f.value), (3, 5, 0));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ERR: &str = "invalid feature";

        let s = s.trim();
        let (mut value, s) = match s.as_bytes().first() {
            Some(b'-') => (0, &s[1..]),
            Some(b'+') => (1, &s[1..]),
            _ => (1, s),
        };

        let (head, explicit_value) = match s.find('=') {
            Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
            None => (s, None),
        };

        let (tag_str, range) = match head.find('[') {
            Some(idx) => {
                let range = head[idx + 1..].strip_suffix(']').ok_or(ERR)?;
                (&head[..idx], Some(range))
            }
            None => (head, None),
        };

        let tag_str = tag_str.trim_matches(|c| c == '"' || c == '\'');
        if tag_str.is_empty() || tag_str.len() > 4 || !tag_str.is_ascii() {
            return Err(ERR);
        }

        let mut tag = [b' '; 4];
        tag[..tag_str.len()].copy_from_slice(tag_str.as_bytes());

        let (mut start, mut end) = (0u32, u32::MAX);
        if let Some(range) = range {
            match range.find(':') {
                Some(idx) => {
                    let (a, b) = (range[..idx].trim(), range[idx + 1..].trim());
                    if !a.is_empty() {
                        start = a.parse().map_err(|_| ERR)?;
                    }
                    if !b.is_empty() {
                        end = b.parse().map_err(|_| ERR)?;
                    }
                }
                None => {
                    let range = range.trim();
                    if !range.is_empty() {
                        start = range.parse().map_err(|_| ERR)?;
                        end = start.checked_add(1).ok_or(ERR)?;
                    }
                }
            }
        }

        if let Some(v) = explicit_value {
            value = match v.trim() {
                "on" => 1,
                "off" => 0,
                v => v.parse().map_err(|_| ERR)?,
            };
        }

        Ok(Feature {
            tag: Tag::from_bytes(&tag),
            value,
            start,
            end,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_direction() {
        assert_eq!("ltr".parse::<Direction>(), Ok(Direction::LeftToRight));
        assert_eq!("TTB".parse::<Direction>(), Ok(Direction::TopToBottom));
        assert!("".parse::<Direction>().is_err());
        assert!("x".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_axes() {
        assert!(Direction::RightToLeft.is_horizontal());
        assert!(Direction::RightToLeft.is_backward());
        assert!(Direction::TopToBottom.is_vertical());
        assert!(Direction::TopToBottom.is_forward());
        assert!(!Direction::Invalid.is_vertical());
    }

    #[test]
    fn parse_language() {
        let lang: Language = "EN_us".parse().unwrap();
        assert_eq!(lang.as_str(), "en-us");
        assert!("".parse::<Language>().is_err());
        assert!("e n".parse::<Language>().is_err());
    }

    macro_rules! test_feature {
        ($name:ident, $text:expr, $tag:expr, $value:expr, $range:expr) => {
            #[test]
            fn $name() {
                assert_eq!(
                    $text.parse::<Feature>().unwrap(),
                    Feature::new(Tag::from_bytes($tag), $value, $range)
                );
            }
        };
    }

    test_feature!(parse_feature_1, "kern", b"kern", 1, ..);
    test_feature!(parse_feature_2, "-kern", b"kern", 0, ..);
    test_feature!(parse_feature_3, "+kern", b"kern", 1, ..);
    test_feature!(parse_feature_4, "kern=0", b"kern", 0, ..);
    test_feature!(parse_feature_5, "kern=off", b"kern", 0, ..);
    test_feature!(parse_feature_6, "aalt=2", b"aalt", 2, ..);
    test_feature!(parse_feature_7, "kern[3:5]", b"kern", 1, 3..5);
    test_feature!(parse_feature_8, "kern[3]", b"kern", 1, 3..=3);
    test_feature!(parse_feature_9, "kern[:5]=0", b"kern", 0, ..5);
    test_feature!(parse_feature_10, "kern[3:]", b"kern", 1, 3..);
    test_feature!(parse_feature_11, "kern[]", b"kern", 1, ..);
    test_feature!(parse_feature_12, "ss1", b"ss1 ", 1, ..);

    #[test]
    fn parse_feature_errors() {
        assert!("".parse::<Feature>().is_err());
        assert!("toolong".parse::<Feature>().is_err());
        assert!("kern[3".parse::<Feature>().is_err());
        assert!("kern=x".parse::<Feature>().is_err());
        assert!("kern[4294967295]".parse::<Feature>().is_err());
    }

    #[test]
    fn parse_single_index_range() {
        let feature: Feature = "kern[7]=0".parse().unwrap();
        assert_eq!((feature.start, feature.end), (7, 8));
    }
}

// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6feat.html

use ttf_parser::parser::{FromData, Fixed, LazyArray16, Offset, Offset32, Stream};


#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    data: &'a [u8], // The whole table.
    names: LazyArray16<'a, FeatureName>,
}

impl<'a> Table<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);

        let version: Fixed = s.read()?;
        if version.0 != 1.0 {
            return None;
        }

        let count: u16 = s.read()?;
        s.advance_checked(6)?; // reserved
        let names = s.read_array16(count)?;

        Some(Table {
            data,
            names,
        })
    }

    pub fn has_data(&self) -> bool {
        !self.names.is_empty()
    }

    pub fn exposes_feature(&self, kind: u16) -> bool {
        match self.feature(kind) {
            Some(feature) => feature.has_data(),
            None => false,
        }
    }

    /// Finds a feature by its type. Records are sorted by type.
    pub fn feature(&self, kind: u16) -> Option<FeatureName> {
        self.names.binary_search_by(|name| name.kind.cmp(&kind)).map(|(_, f)| f)
    }

    /// Returns the settings of a feature.
    pub fn settings(&self, feature: &FeatureName) -> Option<LazyArray16<'a, SettingName>> {
        let mut s = Stream::new_at(self.data, feature.setting_table_offset.to_usize())?;
        s.read_array16(feature.settings_count)
    }
}


#[derive(Clone, Copy, Debug)]
pub struct FeatureName {
    pub kind: u16,
    settings_count: u16,
    setting_table_offset: Offset32,
    flags: u16,
    pub name_index: i16,
}

impl FeatureName {
    pub fn has_data(&self) -> bool {
        self.settings_count > 0
    }

    pub fn is_exclusive(&self) -> bool {
        self.flags & 0x8000 != 0
    }

    /// Returns the index of the default setting.
    ///
    /// Only exclusive features may name a non-zero default.
    pub fn default_index(&self) -> u16 {
        if self.flags & 0x4000 != 0 {
            self.flags & 0x00FF
        } else {
            0
        }
    }
}

impl FromData for FeatureName {
    const SIZE: usize = 12;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(FeatureName {
            kind: s.read()?,
            settings_count: s.read()?,
            setting_table_offset: s.read()?,
            flags: s.read()?,
            name_index: s.read()?,
        })
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SettingName {
    pub setting: u16,
    pub name_index: i16,
}

impl FromData for SettingName {
    const SIZE: usize = 4;

    #[inline]
    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(SettingName {
            setting: s.read()?,
            name_index: s.read()?,
        })
    }
}

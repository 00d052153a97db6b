use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// States, regions and the union territory offered as filter options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Ayeyarwady,
    Bago,
    Chin,
    Kachin,
    Kayah,
    Kayin,
    Magway,
    Mandalay,
    Mon,
    Naypyidaw,
    Rakhine,
    Sagaing,
    Shan,
    Tanintharyi,
    Yangon,
}

impl Region {
    pub const ALL: [Region; 15] = [
        Region::Ayeyarwady,
        Region::Bago,
        Region::Chin,
        Region::Kachin,
        Region::Kayah,
        Region::Kayin,
        Region::Magway,
        Region::Mandalay,
        Region::Mon,
        Region::Naypyidaw,
        Region::Rakhine,
        Region::Sagaing,
        Region::Shan,
        Region::Tanintharyi,
        Region::Yangon,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Region::Ayeyarwady => "Ayeyarwady",
            Region::Bago => "Bago",
            Region::Chin => "Chin",
            Region::Kachin => "Kachin",
            Region::Kayah => "Kayah",
            Region::Kayin => "Kayin",
            Region::Magway => "Magway",
            Region::Mandalay => "Mandalay",
            Region::Mon => "Mon",
            Region::Naypyidaw => "Naypyidaw",
            Region::Rakhine => "Rakhine",
            Region::Sagaing => "Sagaing",
            Region::Shan => "Shan",
            Region::Tanintharyi => "Tanintharyi",
            Region::Yangon => "Yangon",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownOption {
                kind: "region",
                value: s.to_owned(),
            })
    }
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The serialized form is the `as_str` spelling.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(ResultStatus {
    Normal => "Normal",
    Low => "Low",
    High => "High",
    Critical => "Critical",
    Abnormal => "Abnormal",
});

str_enum!(Direction {
    Low => "Low",
    High => "High",
});

// Declaration order is severity order: Mild < Moderate < Critical.
str_enum!(Severity {
    Mild => "mild",
    Moderate => "moderate",
    Critical => "critical",
});

str_enum!(Gender {
    Male => "male",
    Female => "female",
});

str_enum!(Intensity {
    Mild => "mild",
    Moderate => "moderate",
    Emergency => "emergency",
});

impl ResultStatus {
    /// Status word as printed on a report, any case (`LOW`, `low`, `Low`).
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "low" => Some(Self::Low),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            "abnormal" => Some(Self::Abnormal),
            _ => None,
        }
    }

    /// Low/High map to a remedy direction; every other status has none.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Low => Some(Direction::Low),
            Self::High => Some(Direction::High),
            _ => None,
        }
    }
}

impl Gender {
    /// Lenient parse of a caller-supplied gender. Unrecognized input is `None`.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            _ => None,
        }
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// How the user felt on a given day. Stored as SMALLINT.
///
/// `Unknown` is the fallback for unrecognised input. It is a valid internal
/// value but never an acceptable one from a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[repr(i16)]
pub enum Mood {
    #[default]
    Unknown = 0,
    Happy = 1,
    Sad = 2,
    Energized = 3,
    Calm = 4,
    Anxious = 5,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Unknown,
        Mood::Happy,
        Mood::Sad,
        Mood::Energized,
        Mood::Calm,
        Mood::Anxious,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Unknown => "Unknown",
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Energized => "Energized",
            Mood::Calm => "Calm",
            Mood::Anxious => "Anxious",
        }
    }

    /// Case-insensitive lookup; anything unrecognised is `Unknown`.
    pub fn from_name(name: &str) -> Mood {
        Mood::ALL
            .into_iter()
            .find(|m| *m != Mood::Unknown && m.as_str().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(Mood::Unknown)
    }

    pub fn is_known(self) -> bool {
        self != Mood::Unknown
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Mood {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mood {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Mood::from_name(&name))
    }
}

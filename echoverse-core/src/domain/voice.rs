//! Narration voice catalogue

use serde::Serialize;
use std::fmt;

/// Speaking pace of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Slow,
    Normal,
    Fast,
}

impl SpeedClass {
    /// Whether the synthesizer should be asked for slowed speech
    pub fn is_slow(&self) -> bool {
        matches!(self, SpeedClass::Slow)
    }

    /// Typical narration pace in words per minute
    pub fn words_per_minute(&self) -> f64 {
        match self {
            SpeedClass::Slow => 130.0,
            SpeedClass::Normal => 150.0,
            SpeedClass::Fast => 165.0,
        }
    }
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpeedClass::Slow => "slow",
            SpeedClass::Normal => "normal",
            SpeedClass::Fast => "fast",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

/// A selectable narration voice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceProfile {
    /// Name shown to the user, e.g. `Sarah (Female)`
    pub name: &'static str,
    /// Language code passed to the synthesizer
    pub language_code: &'static str,
    /// Regional variant (accent domain) passed to the synthesizer
    pub regional_variant: &'static str,
    pub description: &'static str,
    pub speed_class: SpeedClass,
    pub gender: Gender,
    pub accent: &'static str,
}

impl VoiceProfile {
    /// Estimated narration length in minutes for `text`
    pub fn estimated_minutes(&self, text: &str) -> f64 {
        text.split_whitespace().count() as f64 / self.speed_class.words_per_minute()
    }
}

pub const DEFAULT_VOICE: &str = "Sarah (Female)";

static VOICES: [VoiceProfile; 6] = [
    VoiceProfile {
        name: "Sarah (Female)",
        language_code: "en",
        regional_variant: "com",
        description: "American English, clear and professional",
        speed_class: SpeedClass::Fast,
        gender: Gender::Female,
        accent: "American",
    },
    VoiceProfile {
        name: "Emma (Female)",
        language_code: "en",
        regional_variant: "com.au",
        description: "Australian English, warm and friendly",
        speed_class: SpeedClass::Fast,
        gender: Gender::Female,
        accent: "Australian",
    },
    VoiceProfile {
        name: "Lisa (Female)",
        language_code: "en",
        regional_variant: "co.za",
        description: "South African English, bright and expressive",
        speed_class: SpeedClass::Fast,
        gender: Gender::Female,
        accent: "South African",
    },
    VoiceProfile {
        name: "James (Male)",
        language_code: "en",
        regional_variant: "co.uk",
        description: "British English, deep and authoritative",
        speed_class: SpeedClass::Slow,
        gender: Gender::Male,
        accent: "British",
    },
    VoiceProfile {
        name: "David (Male)",
        language_code: "en",
        regional_variant: "ca",
        description: "Canadian English, calm and neutral",
        speed_class: SpeedClass::Slow,
        gender: Gender::Male,
        accent: "Canadian",
    },
    VoiceProfile {
        name: "Michael (Male)",
        language_code: "en",
        regional_variant: "ie",
        description: "Irish English, soft and melodic",
        speed_class: SpeedClass::Slow,
        gender: Gender::Male,
        accent: "Irish",
    },
];

/// All available voices
pub fn voices() -> &'static [VoiceProfile] {
    &VOICES
}

/// Look up a voice by display name or by its first name, case-insensitively
pub fn find_voice(name: &str) -> Option<&'static VoiceProfile> {
    let wanted = name.trim().to_lowercase();
    VOICES.iter().find(|v| {
        let full = v.name.to_lowercase();
        full == wanted || full.split_whitespace().next() == Some(wanted.as_str())
    })
}

/// The voice used when none is selected and for synthesis retries
pub fn default_voice() -> &'static VoiceProfile {
    &VOICES[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_has_six_voices() {
        assert_eq!(voices().len(), 6);
        assert_eq!(default_voice().name, DEFAULT_VOICE);
    }

    #[test]
    fn test_find_voice() {
        assert_eq!(find_voice("James (Male)").map(|v| v.regional_variant), Some("co.uk"));
        assert_eq!(find_voice("emma").map(|v| v.accent), Some("Australian"));
        assert!(find_voice("Robot").is_none());
    }

    #[test]
    fn test_male_voices_are_slow() {
        for voice in voices() {
            assert_eq!(voice.gender == Gender::Male, voice.speed_class.is_slow());
        }
    }

    #[test]
    fn test_estimated_minutes() {
        let text = "word ".repeat(150);
        let normal = VoiceProfile {
            speed_class: SpeedClass::Normal,
            ..default_voice().clone()
        };
        assert!((normal.estimated_minutes(&text) - 1.0).abs() < 1e-9);
        assert!(find_voice("David").unwrap().estimated_minutes(&text) > 1.0);
    }
}

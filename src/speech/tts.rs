//! Text-to-speech with sherpa-rs (VITS / Piper voices)

use crate::{Result, TalkbackError};
use serde::{Deserialize, Serialize};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::path::Path;
use tracing::{debug, info};

#[cfg(feature = "audio-io")]
use crate::audio::AudioOutput;

/// Native rate of the bundled Piper voices
pub const VITS_SAMPLE_RATE: u32 = 22050;

/// Configuration for the TTS engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TTSConfig {
    /// Path to the ONNX model file
    pub model_path: String,

    /// Path to the tokens file
    pub tokens_path: String,

    /// Path to the lexicon file (optional for some models)
    pub lexicon_path: Option<String>,

    /// espeak-ng data directory, required by Piper voices
    pub data_dir: Option<String>,

    /// Path to dict directory (optional)
    pub dict_dir: Option<String>,

    /// Noise scale for variation
    pub noise_scale: f32,

    /// Noise scale width
    pub noise_scale_w: f32,

    /// Speaker ID for multi-speaker models
    pub speaker_id: i32,

    /// Speech rate multiplier (1.0 = normal)
    pub speed: f32,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            model_path: "models/vits-piper-en_US-amy-low/en_US-amy-low.onnx".to_string(),
            tokens_path: "models/vits-piper-en_US-amy-low/tokens.txt".to_string(),
            lexicon_path: None,
            data_dir: Some("models/vits-piper-en_US-amy-low/espeak-ng-data".to_string()),
            dict_dir: None,
            noise_scale: 0.667,
            noise_scale_w: 0.8,
            speaker_id: 0,
            speed: 1.0,
        }
    }
}

impl TTSConfig {
    pub fn new(model_path: impl Into<String>, tokens_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            tokens_path: tokens_path.into(),
            data_dir: None,
            ..Default::default()
        }
    }

    pub fn with_lexicon(mut self, lexicon_path: impl Into<String>) -> Self {
        self.lexicon_path = Some(lexicon_path.into());
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<String>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn with_speaker(mut self, speaker_id: i32) -> Self {
        self.speaker_id = speaker_id;
        self
    }

    /// Clamped to 0.1 so synthesis never stalls
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(0.1);
        self
    }
}

/// VITS voice loaded once
pub struct TTSEngine {
    tts: VitsTts,
    config: TTSConfig,
}

impl TTSEngine {
    pub fn new(config: TTSConfig) -> Result<Self> {
        if config.model_path.is_empty() {
            return Err(TalkbackError::Config("TTS model path is required".into()));
        }
        if config.tokens_path.is_empty() {
            return Err(TalkbackError::Config("TTS tokens path is required".into()));
        }

        for path in [&config.model_path, &config.tokens_path] {
            if !Path::new(path).exists() {
                return Err(TalkbackError::ModelLoad(format!("TTS file not found: {}", path)));
            }
        }

        info!("Loading VITS TTS model from: {}", config.model_path);

        let vits_config = VitsTtsConfig {
            model: config.model_path.clone(),
            tokens: config.tokens_path.clone(),
            lexicon: config.lexicon_path.clone().unwrap_or_default(),
            data_dir: config.data_dir.clone().unwrap_or_default(),
            dict_dir: config.dict_dir.clone().unwrap_or_default(),
            noise_scale: config.noise_scale,
            noise_scale_w: config.noise_scale_w,
            ..Default::default()
        };

        let tts = VitsTts::new(vits_config);

        info!("TTS engine initialized");

        Ok(Self { tts, config })
    }

    /// Synthesize `text` at the model's native rate
    ///
    /// Text that normalizes to nothing yields no samples.
    pub fn synthesize(&mut self, text: &str) -> Result<(Vec<f32>, u32)> {
        let normalized = normalize_text_for_tts(text);
        if normalized.is_empty() {
            return Ok((Vec::new(), VITS_SAMPLE_RATE));
        }

        debug!("Synthesizing: {}", normalized);

        let audio = self
            .tts
            .create(&normalized, self.config.speaker_id, self.config.speed)
            .map_err(|e| TalkbackError::Playback(format!("Synthesis failed: {}", e)))?;

        let sample_rate = audio.sample_rate as u32;
        debug!(
            "Synthesized {} samples ({:.2}s)",
            audio.samples.len(),
            audio.samples.len() as f32 / sample_rate.max(1) as f32
        );

        Ok((audio.samples, sample_rate))
    }
}

/// Speaks text aloud and returns once playback has finished
pub trait Narrator {
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// TTS engine wired to the default output device
#[cfg(feature = "audio-io")]
pub struct SpeakerNarrator {
    engine: TTSEngine,
    output: AudioOutput,
}

#[cfg(feature = "audio-io")]
impl SpeakerNarrator {
    pub fn new(config: TTSConfig) -> Result<Self> {
        let engine = TTSEngine::new(config)?;
        let output = AudioOutput::new()?;
        Ok(Self { engine, output })
    }
}

#[cfg(feature = "audio-io")]
impl Narrator for SpeakerNarrator {
    fn speak(&mut self, text: &str) -> Result<()> {
        let (samples, sample_rate) = self.engine.synthesize(text)?;
        if samples.is_empty() {
            debug!("Nothing to speak after normalization");
            return Ok(());
        }

        self.output
            .play_blocking(&samples, sample_rate)
            .map_err(|e| match e {
                TalkbackError::Playback(_) => e,
                other => TalkbackError::Playback(other.to_string()),
            })
    }
}

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Mr.", "Mister"),
    ("Mrs.", "Misses"),
    ("Ms.", "Miss"),
    ("Dr.", "Doctor"),
    ("Prof.", "Professor"),
    ("Jr.", "Junior"),
    ("Sr.", "Senior"),
    ("vs.", "versus"),
    ("etc.", "etcetera"),
    ("e.g.", "for example"),
    ("i.e.", "that is"),
    ("approx.", "approximately"),
    ("dept.", "department"),
    ("hrs.", "hours"),
    ("mins.", "minutes"),
    ("secs.", "seconds"),
    ("lbs.", "pounds"),
    ("km.", "kilometers"),
];

const SYMBOLS: &[(&str, &str)] = &[
    ("&", " and "),
    ("%", " percent "),
    ("@", " at "),
    ("+", " plus "),
    ("=", " equals "),
    ("#", " number "),
];

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Rewrite text so the voice reads it naturally
///
/// Expands abbreviations (whole words only), common symbols, ordinals,
/// clock times and integers below one million, then drops characters the
/// voice cannot pronounce.
pub fn normalize_text_for_tts(text: &str) -> String {
    let mut result = text
        .split_whitespace()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(abbrev, _)| *abbrev == word)
                .map_or(word, |(_, expansion)| *expansion)
        })
        .collect::<Vec<_>>()
        .join(" ");

    for (symbol, spoken) in SYMBOLS {
        result = result.replace(*symbol, spoken);
    }

    expand_numbers(&result)
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ".,!?;:'-\"".contains(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn expand_numbers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let digits: String = chars[start..i].iter().collect();

        if chars.get(i) == Some(&':') {
            let minutes: String = chars[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if minutes.len() == 2 {
                out.push_str(&speak_time(&digits, &minutes));
                i += 3;
                continue;
            }
        }

        let suffix: String = chars[i..].iter().take(2).collect::<String>().to_ascii_lowercase();
        let suffix_ends_word = !chars.get(i + 2).is_some_and(|c| c.is_alphanumeric());
        if matches!(suffix.as_str(), "st" | "nd" | "rd" | "th") && suffix_ends_word {
            if let Some(words) = ordinal_words(&digits) {
                out.push_str(&words);
                i += 2;
                continue;
            }
        }

        out.push_str(&number_words(&digits).unwrap_or(digits));
    }

    out
}

fn speak_time(hours: &str, minutes: &str) -> String {
    let (Some(h), Some(m)) = (number_words(hours), number_words(minutes)) else {
        return format!("{}:{}", hours, minutes);
    };

    if minutes == "00" {
        format!("{} o'clock", h)
    } else if minutes.starts_with('0') {
        format!("{} oh {}", h, m)
    } else {
        format!("{} {}", h, m)
    }
}

fn number_words(digits: &str) -> Option<String> {
    let n: u32 = digits.parse().ok()?;
    (n < 1_000_000).then(|| spell(n))
}

fn spell(n: u32) -> String {
    match n {
        0..=19 => ONES[n as usize].to_string(),
        20..=99 => {
            let tens = TENS[(n / 10) as usize];
            match n % 10 {
                0 => tens.to_string(),
                ones => format!("{}-{}", tens, ONES[ones as usize]),
            }
        }
        100..=999 => {
            let hundreds = format!("{} hundred", ONES[(n / 100) as usize]);
            match n % 100 {
                0 => hundreds,
                rest => format!("{} {}", hundreds, spell(rest)),
            }
        }
        _ => {
            let thousands = format!("{} thousand", spell(n / 1000));
            match n % 1000 {
                0 => thousands,
                rest => format!("{} {}", thousands, spell(rest)),
            }
        }
    }
}

fn ordinal_words(digits: &str) -> Option<String> {
    let words = number_words(digits)?;
    let split = words.rfind(|c: char| c == ' ' || c == '-').map_or(0, |i| i + 1);
    let (head, last) = words.split_at(split);

    let last = match last {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        w if w.ends_with('y') => format!("{}ieth", &w[..w.len() - 1]),
        w => format!("{}th", w),
    };

    Some(format!("{}{}", head, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tts_config_default() {
        let config = TTSConfig::default();
        assert!(config.model_path.ends_with(".onnx"));
        assert_eq!(config.speaker_id, 0);
        assert!(config.lexicon_path.is_none());
        assert_eq!(config.speed, 1.0);
    }

    #[test]
    fn test_tts_config_builder() {
        let config = TTSConfig::new("model.onnx", "tokens.txt")
            .with_lexicon("lexicon.txt")
            .with_speaker(5)
            .with_speed(0.0);

        assert_eq!(config.model_path, "model.onnx");
        assert_eq!(config.tokens_path, "tokens.txt");
        assert_eq!(config.lexicon_path, Some("lexicon.txt".to_string()));
        assert!(config.data_dir.is_none());
        assert_eq!(config.speaker_id, 5);
        assert!((config.speed - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_model_files() {
        let result = TTSEngine::new(TTSConfig::new("/nonexistent/model.onnx", "/nonexistent/t.txt"));
        assert!(matches!(result, Err(TalkbackError::ModelLoad(_))));

        let result = TTSEngine::new(TTSConfig::new("", "tokens.txt"));
        assert!(matches!(result, Err(TalkbackError::Config(_))));
    }

    #[test]
    fn test_normalize_abbreviations_and_time() {
        assert_eq!(
            normalize_text_for_tts("Dr. Smith met Mr. Johnson at 3:30"),
            "Doctor Smith met Mister Johnson at three thirty"
        );
    }

    #[test]
    fn test_abbreviations_match_whole_words() {
        assert_eq!(normalize_text_for_tts("Come in. Mrs.Robinson"), "Come in. Mrs.Robinson");
    }

    #[test]
    fn test_normalize_symbols() {
        assert_eq!(normalize_text_for_tts("50% & more"), "fifty percent and more");
    }

    #[test]
    fn test_normalize_ordinals() {
        assert_eq!(normalize_text_for_tts("the 1st and 21st"), "the first and twenty-first");
        assert_eq!(normalize_text_for_tts("her 100th, 12th"), "her one hundredth, twelfth");
        assert_eq!(normalize_text_for_tts("the 30th"), "the thirtieth");
    }

    #[test]
    fn test_normalize_clock_times() {
        assert_eq!(normalize_text_for_tts("12:00"), "twelve o'clock");
        assert_eq!(normalize_text_for_tts("7:05"), "seven oh five");
    }

    #[test]
    fn test_number_words() {
        assert_eq!(number_words("0").as_deref(), Some("zero"));
        assert_eq!(number_words("42").as_deref(), Some("forty-two"));
        assert_eq!(number_words("250").as_deref(), Some("two hundred fifty"));
        assert_eq!(number_words("2024").as_deref(), Some("two thousand twenty-four"));
        assert_eq!(number_words("1000000"), None);
    }

    #[test]
    fn test_empty_text_normalizes_to_nothing() {
        assert_eq!(normalize_text_for_tts("   "), "");
        assert_eq!(normalize_text_for_tts("***"), "");
    }

    #[test]
    #[ignore = "requires the Piper voice under models/"]
    fn test_synthesize_default_voice() {
        let mut engine = TTSEngine::new(TTSConfig::default()).unwrap();
        let (samples, rate) = engine.synthesize("Hello there.").unwrap();
        assert!(!samples.is_empty());
        assert!(rate > 0);
    }
}

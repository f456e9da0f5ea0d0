use crate::error::{ChapterizeError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    /// The chapter announcement word narrators use in this language.
    pub fn default_trigger(&self) -> &'static str {
        match self {
            Language::English => "chapter",
            Language::Russian => "глава",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "en"),
            Language::Russian => write!(f, "ru"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ru" | "russian" => Ok(Language::Russian),
            _ => Err(format!("Unknown language: {}. Use 'en' or 'ru'", s)),
        }
    }
}

/// Typed configuration consumed by the detection engine.
///
/// Durations are real `Duration`s here; the serializable [`Config`] below
/// carries them as plain seconds the way the CLI flags do.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub language: Language,
    /// Trigger word override; defaults per language when `None`.
    pub trigger: Option<String>,
    pub max_chapters: usize,
    pub include_ordinals: bool,
    /// Custom phrase list, one phrase per line.
    pub phrases_file: Option<PathBuf>,
    /// Phrase marking the start of back matter.
    pub back_trigger: Option<String>,
    /// Minimum phrase confidence to keep a candidate.
    pub conf_min: f32,
    /// Enforce strictly sequential chapter numbering starting at 1.
    pub sequential: bool,
    /// Minimum spacing between accepted chapter marks (debounce).
    pub min_chapter_gap: Duration,
    /// Chapters shorter than this are merged into their neighbor.
    pub min_chapter_duration: Duration,
    /// Required silent run ending at the phrase start.
    pub silence_pre: Duration,
    /// Required silent run starting at the phrase end.
    pub silence_post: Duration,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            trigger: None,
            max_chapters: 120,
            include_ordinals: false,
            phrases_file: None,
            back_trigger: None,
            conf_min: 0.35,
            sequential: false,
            min_chapter_gap: Duration::from_secs(90),
            min_chapter_duration: Duration::from_secs(120),
            silence_pre: Duration::from_secs_f64(0.6),
            silence_post: Duration::from_secs_f64(0.8),
        }
    }
}

impl DetectionConfig {
    /// The trigger word to build the grammar around.
    pub fn trigger_word(&self) -> String {
        self.trigger
            .clone()
            .unwrap_or_else(|| self.language.default_trigger().to_string())
    }
}

/// Tuning for the external ffmpeg silencedetect run.
#[derive(Debug, Clone)]
pub struct SilenceDetectConfig {
    /// dB threshold below which audio counts as silence.
    pub noise_db: f64,
    /// Minimum quiet stretch the detector reports.
    pub min_silence: Duration,
}

impl Default for SilenceDetectConfig {
    fn default() -> Self {
        Self {
            noise_db: -38.0,
            min_silence: Duration::from_secs_f64(0.35),
        }
    }
}

/// Serializable configuration surface: config file, env vars, CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub language: String,
    pub trigger: Option<String>,
    pub max_chapters: usize,
    pub include_ordinals: bool,
    pub phrases_file: Option<PathBuf>,
    pub back_trigger: Option<String>,
    pub conf_min: f32,
    pub sequential: bool,
    /// Seconds between chapter detections (debounce).
    pub min_chapter_gap: f64,
    /// Minimum seconds per chapter segment.
    pub min_chapter_duration: f64,
    /// dB threshold for silencedetect.
    pub silence_threshold: f64,
    /// Minimum silence duration in seconds for the detector.
    pub silence_min: f64,
    /// Required pre-trigger silence in seconds.
    pub silence_pre: f64,
    /// Required post-phrase silence in seconds.
    pub silence_post: f64,
    pub sample_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            trigger: None,
            max_chapters: 120,
            include_ordinals: false,
            phrases_file: None,
            back_trigger: None,
            conf_min: 0.35,
            sequential: false,
            min_chapter_gap: 90.0,
            min_chapter_duration: 120.0,
            silence_threshold: -38.0,
            silence_min: 0.35,
            silence_pre: 0.6,
            silence_post: 0.8,
            sample_rate: 16000,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(language) = std::env::var("CHAPTERIZE_LANGUAGE") {
            config.language = language;
        }
        if let Ok(max_chapters) = std::env::var("CHAPTERIZE_MAX_CHAPTERS") {
            if let Ok(n) = max_chapters.parse() {
                config.max_chapters = n;
            }
        }
        if let Ok(conf_min) = std::env::var("CHAPTERIZE_CONF_MIN") {
            if let Ok(c) = conf_min.parse() {
                config.conf_min = c;
            }
        }
        if let Ok(rate) = std::env::var("CHAPTERIZE_SAMPLE_RATE") {
            if let Ok(r) = rate.parse() {
                config.sample_rate = r;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.language
            .parse::<Language>()
            .map_err(ChapterizeError::Config)?;

        if self.max_chapters == 0 {
            return Err(ChapterizeError::Config(
                "max_chapters must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.conf_min) {
            return Err(ChapterizeError::Config(format!(
                "conf_min must be within 0..=1, got {}",
                self.conf_min
            )));
        }
        if self.min_chapter_gap < 0.0 || self.min_chapter_duration < 0.0 {
            return Err(ChapterizeError::Config(
                "min_chapter_gap and min_chapter_duration must be non-negative".to_string(),
            ));
        }
        if self.silence_pre < 0.0 || self.silence_post < 0.0 || self.silence_min < 0.0 {
            return Err(ChapterizeError::Config(
                "silence windows must be non-negative".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(ChapterizeError::Config(
                "sample_rate must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the typed detection configuration the engine consumes.
    pub fn detection(&self) -> Result<DetectionConfig> {
        let language = self
            .language
            .parse::<Language>()
            .map_err(ChapterizeError::Config)?;

        Ok(DetectionConfig {
            language,
            trigger: self.trigger.clone(),
            max_chapters: self.max_chapters,
            include_ordinals: self.include_ordinals,
            phrases_file: self.phrases_file.clone(),
            back_trigger: self
                .back_trigger
                .as_ref()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
            conf_min: self.conf_min,
            sequential: self.sequential,
            min_chapter_gap: Duration::from_secs_f64(self.min_chapter_gap),
            min_chapter_duration: Duration::from_secs_f64(self.min_chapter_duration),
            silence_pre: Duration::from_secs_f64(self.silence_pre),
            silence_post: Duration::from_secs_f64(self.silence_post),
        })
    }

    /// Build the silence-detector tuning for the external ffmpeg run.
    pub fn silence(&self) -> SilenceDetectConfig {
        SilenceDetectConfig {
            noise_db: self.silence_threshold,
            min_silence: Duration::from_secs_f64(self.silence_min),
        }
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chapterize").join("config.toml"))
    }
}

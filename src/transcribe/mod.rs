use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ProviderError;

pub mod processor;
pub mod youtube;

pub use youtube::YoutubeCaptionProvider;

/// One timed line of caption text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSnippet {
    /// Caption text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl CaptionSnippet {
    /// End offset in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A fetched caption track, with snippets in chronological order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,

    /// Human-readable language name, e.g. "English (auto-generated)"
    pub language: String,

    pub language_code: String,

    /// Whether YouTube generated the track via speech recognition
    pub is_generated: bool,

    pub snippets: Vec<CaptionSnippet>,
}

impl Transcript {
    /// End offset of the last snippet in seconds
    pub fn duration(&self) -> f64 {
        self.snippets.last().map(CaptionSnippet::end).unwrap_or(0.0)
    }
}

/// A caption track YouTube offers for a video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionTrack {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
    #[serde(skip)]
    pub base_url: String,
}

/// A language YouTube can machine-translate a track into
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationLanguage {
    pub language: String,
    pub language_code: String,
}

/// All caption tracks of a single video
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptList {
    pub video_id: String,
    pub manual: Vec<CaptionTrack>,
    pub generated: Vec<CaptionTrack>,
    pub translation_languages: Vec<TranslationLanguage>,
}

/// Summary of the tracks available for a video
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub total_transcripts: usize,
    pub available_languages: Vec<CaptionTrack>,
    pub manually_created: Vec<CaptionTrack>,
    pub auto_generated: Vec<CaptionTrack>,
    pub translatable: Vec<CaptionTrack>,
}

impl TranscriptList {
    /// Manually created tracks first, then generated ones
    pub fn tracks(&self) -> impl Iterator<Item = &CaptionTrack> {
        self.manual.iter().chain(self.generated.iter())
    }

    /// First track matching the requested language codes, in preference order.
    ///
    /// For each code a manually created track wins over a generated one.
    pub fn find_transcript(&self, languages: &[String]) -> Result<&CaptionTrack, ProviderError> {
        languages
            .iter()
            .find_map(|code| {
                self.manual
                    .iter()
                    .find(|track| &track.language_code == code)
                    .or_else(|| self.generated.iter().find(|track| &track.language_code == code))
            })
            .ok_or_else(|| ProviderError::NoTranscriptFound {
                video_id: self.video_id.clone(),
                requested: languages.to_vec(),
                available: self.describe_available(),
            })
    }

    /// First track that YouTube can translate
    pub fn find_translatable(&self) -> Result<&CaptionTrack, ProviderError> {
        self.tracks()
            .find(|track| track.is_translatable)
            .ok_or_else(|| ProviderError::NoTranslatableTranscript(self.video_id.clone()))
    }

    pub fn translation_language(&self, language_code: &str) -> Option<&TranslationLanguage> {
        self.translation_languages
            .iter()
            .find(|lang| lang.language_code == language_code)
    }

    pub fn video_info(&self) -> VideoInfo {
        let available: Vec<CaptionTrack> = self.tracks().cloned().collect();
        VideoInfo {
            video_id: self.video_id.clone(),
            total_transcripts: available.len(),
            manually_created: self.manual.clone(),
            auto_generated: self.generated.clone(),
            translatable: available.iter().filter(|t| t.is_translatable).cloned().collect(),
            available_languages: available,
        }
    }

    fn describe_available(&self) -> String {
        let codes: Vec<String> = self
            .tracks()
            .map(|track| {
                let kind = if track.is_generated { "generated" } else { "manual" };
                format!("{} ({}, {})", track.language_code, track.language, kind)
            })
            .collect();

        if codes.is_empty() {
            "none".to_string()
        } else {
            codes.join(", ")
        }
    }
}

/// Source of caption transcripts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Fetch the first available transcript matching `languages`, in preference order
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript, ProviderError>;

    /// List every caption track of a video
    async fn list(&self, video_id: &str) -> Result<TranscriptList, ProviderError>;

    /// Fetch a machine translation of a track.
    ///
    /// Without a source language the first translatable track is used.
    async fn translate(
        &self,
        video_id: &str,
        target_language: &str,
        source_language: Option<String>,
    ) -> Result<Transcript, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(code: &str, generated: bool, translatable: bool) -> CaptionTrack {
        CaptionTrack {
            language: format!("lang-{}", code),
            language_code: code.to_string(),
            is_generated: generated,
            is_translatable: translatable,
            base_url: format!("https://www.youtube.com/api/timedtext?lang={}", code),
        }
    }

    fn list() -> TranscriptList {
        TranscriptList {
            video_id: "dQw4w9WgXcQ".to_string(),
            manual: vec![track("de", false, false), track("en", false, true)],
            generated: vec![track("en", true, true), track("fr", true, true)],
            translation_languages: vec![TranslationLanguage {
                language: "Spanish".to_string(),
                language_code: "es".to_string(),
            }],
        }
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_find_transcript_prefers_manual() {
        let list = list();
        let found = list.find_transcript(&langs(&["en"])).unwrap();
        assert!(!found.is_generated);
    }

    #[test]
    fn test_find_transcript_follows_language_order() {
        let list = list();
        let found = list.find_transcript(&langs(&["ja", "fr", "en"])).unwrap();
        assert_eq!(found.language_code, "fr");
        assert!(found.is_generated);
    }

    #[test]
    fn test_find_transcript_not_found() {
        let list = list();
        let err = list.find_transcript(&langs(&["ja"])).unwrap_err();
        match &err {
            ProviderError::NoTranscriptFound { requested, available, .. } => {
                assert_eq!(requested, &langs(&["ja"]));
                assert!(available.contains("de (lang-de, manual)"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_find_translatable_skips_untranslatable() {
        let list = list();
        let found = list.find_translatable().unwrap();
        assert_eq!(found.language_code, "en");
        assert!(!found.is_generated);
    }

    #[test]
    fn test_video_info() {
        let info = list().video_info();
        assert_eq!(info.total_transcripts, 4);
        assert_eq!(info.manually_created.len(), 2);
        assert_eq!(info.auto_generated.len(), 2);
        assert_eq!(info.translatable.len(), 3);

        let json = serde_json::to_value(&info).unwrap();
        assert!(json["available_languages"][0].get("base_url").is_none());
    }

    #[test]
    fn test_transcript_duration() {
        let transcript = Transcript {
            video_id: "dQw4w9WgXcQ".to_string(),
            language: "English".to_string(),
            language_code: "en".to_string(),
            is_generated: false,
            snippets: vec![
                CaptionSnippet { text: "a".to_string(), start: 0.0, duration: 1.5 },
                CaptionSnippet { text: "b".to_string(), start: 1.5, duration: 2.0 },
            ],
        };
        assert_eq!(transcript.duration(), 3.5);
    }
}

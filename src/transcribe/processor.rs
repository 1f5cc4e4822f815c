//! Parsing of the raw YouTube payloads behind a transcript fetch.
//!
//! Everything here is free of IO so the provider's decision points can be tested
//! against captured responses.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::{CaptionSnippet, CaptionTrack, TranscriptList, TranslationLanguage};
use crate::utils::{decode_html_entities, is_url, strip_html_tags};
use crate::ProviderError;

const CONSENT_FORM_ACTION: &str = "action=\"https://consent.youtube.com/s\"";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";

fn api_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid api key regex")
    })
}

fn consent_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"name="v" value="(.*?)""#).expect("valid consent regex"))
}

/// Whether the watch page is the cookie consent interstitial
pub fn is_consent_page(html: &str) -> bool {
    html.contains(CONSENT_FORM_ACTION)
}

/// Token to answer the consent interstitial with a `CONSENT=YES+<token>` cookie
pub fn extract_consent_token(html: &str) -> Option<String> {
    if !is_consent_page(html) {
        return None;
    }

    consent_value_regex()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Innertube API key embedded in the watch page
pub fn extract_api_key(html: &str, video_id: &str) -> Result<String, ProviderError> {
    if let Some(caps) = api_key_regex().captures(html) {
        return Ok(caps[1].to_string());
    }

    if html.contains(RECAPTCHA_MARKER) {
        return Err(ProviderError::IpBlocked(video_id.to_string()));
    }

    Err(ProviderError::YoutubeDataUnparsable(video_id.to_string()))
}

/// Map a non-OK `playabilityStatus` of the player response to a provider error
pub fn check_playability(player: &Value, video_id: &str) -> Result<(), ProviderError> {
    let status = &player["playabilityStatus"];
    let state = status["status"].as_str().unwrap_or("OK");
    if state == "OK" {
        return Ok(());
    }

    let reason = status["reason"].as_str().unwrap_or_default().to_string();
    tracing::debug!(video_id, state, reason = %reason, "video is not playable");

    match state {
        "LOGIN_REQUIRED" if reason.starts_with("Sign in to confirm you") && reason.contains("not a bot") => {
            Err(ProviderError::RequestBlocked(video_id.to_string()))
        }
        "LOGIN_REQUIRED"
            if reason == "This video may be inappropriate for some users."
                || reason.starts_with("Sign in to confirm your age") =>
        {
            Err(ProviderError::AgeRestricted(video_id.to_string()))
        }
        "ERROR" if reason == "This video is unavailable" => {
            if is_url(video_id) {
                Err(ProviderError::InvalidVideoId(video_id.to_string()))
            } else {
                Err(ProviderError::VideoUnavailable(video_id.to_string()))
            }
        }
        _ => {
            let sub_reasons = status["errorScreen"]["playerErrorMessageRenderer"]["subreason"]["runs"]
                .as_array()
                .map(|runs| {
                    runs.iter()
                        .filter_map(|run| run["text"].as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            Err(ProviderError::VideoUnplayable {
                video_id: video_id.to_string(),
                reason,
                sub_reasons,
            })
        }
    }
}

/// Text of a YouTube "formatted string", which is either `simpleText` or a list of runs
fn formatted_text(value: &Value) -> String {
    if let Some(text) = value["simpleText"].as_str() {
        return text.to_string();
    }

    value["runs"]
        .as_array()
        .map(|runs| runs.iter().filter_map(|run| run["text"].as_str()).collect())
        .unwrap_or_default()
}

/// Build the track list from the player response's caption renderer
pub fn parse_caption_tracks(player: &Value, video_id: &str) -> Result<TranscriptList, ProviderError> {
    let renderer = &player["captions"]["playerCaptionsTracklistRenderer"];
    let tracks = renderer["captionTracks"]
        .as_array()
        .ok_or_else(|| ProviderError::TranscriptsDisabled(video_id.to_string()))?;

    let translation_languages = renderer["translationLanguages"]
        .as_array()
        .map(|langs| {
            langs
                .iter()
                .filter_map(|lang| {
                    Some(TranslationLanguage {
                        language: formatted_text(&lang["languageName"]),
                        language_code: lang["languageCode"].as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut manual = Vec::new();
    let mut generated = Vec::new();

    for track in tracks {
        let (Some(base_url), Some(language_code)) =
            (track["baseUrl"].as_str(), track["languageCode"].as_str())
        else {
            tracing::warn!(video_id, "skipping caption track without baseUrl or languageCode");
            continue;
        };

        let caption_track = CaptionTrack {
            language: formatted_text(&track["name"]),
            language_code: language_code.to_string(),
            is_generated: track["kind"].as_str() == Some("asr"),
            is_translatable: track["isTranslatable"].as_bool().unwrap_or(false),
            base_url: base_url.replace("&fmt=srv3", ""),
        };

        if caption_track.is_generated {
            generated.push(caption_track);
        } else {
            manual.push(caption_track);
        }
    }

    Ok(TranscriptList {
        video_id: video_id.to_string(),
        manual,
        generated,
        translation_languages,
    })
}

/// A `<text>` element being read
#[derive(Default)]
struct PendingSnippet {
    start: Option<f64>,
    duration: f64,
    text: String,
}

impl PendingSnippet {
    fn from_element(element: &BytesStart) -> Self {
        let mut pending = Self::default();
        for attr in element.attributes().flatten() {
            let Ok(value) = attr.unescape_value() else {
                continue;
            };
            match attr.key.as_ref() {
                b"start" => pending.start = value.trim().parse().ok(),
                b"dur" => pending.duration = value.trim().parse().unwrap_or(0.0),
                _ => {}
            }
        }
        pending
    }
}

/// Parse a timed-text XML document into snippets, in document order.
///
/// Elements without text or without a parsable `start` are skipped; a missing `dur`
/// counts as zero. The element text is XML-unescaped by the parser and then HTML-unescaped,
/// since YouTube escapes the caption HTML a second time.
pub fn parse_timedtext(
    xml: &str,
    video_id: &str,
    preserve_formatting: bool,
) -> Result<Vec<CaptionSnippet>, ProviderError> {
    let mut reader = Reader::from_str(xml);
    let mut snippets = Vec::new();
    let mut pending: Option<PendingSnippet> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) if element.name().as_ref() == b"text" => {
                pending = Some(PendingSnippet::from_element(&element));
            }
            Ok(Event::Text(text)) => {
                if let Some(pending) = pending.as_mut() {
                    match text.unescape() {
                        Ok(unescaped) => pending.text.push_str(&unescaped),
                        // references XML does not define are left for the HTML pass
                        Err(_) => pending.text.push_str(&String::from_utf8_lossy(&text)),
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(pending) = pending.as_mut() {
                    pending.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::End(element)) if element.name().as_ref() == b"text" => {
                let Some(PendingSnippet { start, duration, text }) = pending.take() else {
                    continue;
                };
                let Some(start) = start else {
                    tracing::debug!(video_id, "skipping caption without start time");
                    continue;
                };
                if text.is_empty() {
                    continue;
                }

                let text = decode_html_entities(&text);
                snippets.push(CaptionSnippet {
                    text: strip_html_tags(&text, preserve_formatting),
                    start,
                    duration,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(
                    video_id,
                    position = reader.buffer_position(),
                    error = %e,
                    "timed text is not well-formed XML"
                );
                return Err(ProviderError::YoutubeDataUnparsable(video_id.to_string()));
            }
            _ => {}
        }
    }

    Ok(snippets)
}

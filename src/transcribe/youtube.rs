use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::processor;
use super::{CaptionProvider, CaptionTrack, Transcript, TranscriptList};
use crate::config::YoutubeConfig;
use crate::ProviderError;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Caption provider backed by YouTube's innertube player API
pub struct YoutubeCaptionProvider {
    client: Client,
    accept_language: String,
    preserve_formatting: bool,
}

impl YoutubeCaptionProvider {
    pub fn new(config: &YoutubeConfig) -> crate::Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            accept_language: config.accept_language.clone(),
            preserve_formatting: config.preserve_formatting,
        })
    }

    async fn send(&self, request: RequestBuilder, video_id: &str) -> Result<reqwest::Response, ProviderError> {
        let response = request
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .send()
            .await
            .map_err(|source| http_error(video_id, source))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::TooManyRequests(video_id.to_string()));
        }

        response
            .error_for_status()
            .map_err(|source| http_error(video_id, source))
    }

    async fn fetch_watch_page(&self, video_id: &str, consent: Option<&str>) -> Result<String, ProviderError> {
        let mut request = self.client.get(WATCH_URL).query(&[("v", video_id)]);
        if let Some(cookie) = consent {
            request = request.header(COOKIE, cookie);
        }

        self.send(request, video_id)
            .await?
            .text()
            .await
            .map_err(|source| http_error(video_id, source))
    }

    /// Watch page HTML, answering the EU consent interstitial once if it shows up
    async fn fetch_video_html(&self, video_id: &str) -> Result<(String, Option<String>), ProviderError> {
        let html = self.fetch_watch_page(video_id, None).await?;
        if !processor::is_consent_page(&html) {
            return Ok((html, None));
        }

        tracing::debug!(video_id, "answering cookie consent page");
        let token = processor::extract_consent_token(&html)
            .ok_or_else(|| ProviderError::FailedToCreateConsentCookie(video_id.to_string()))?;
        let cookie = format!("CONSENT=YES+{}", token);

        let html = self.fetch_watch_page(video_id, Some(cookie.as_str())).await?;
        if processor::is_consent_page(&html) {
            return Err(ProviderError::FailedToCreateConsentCookie(video_id.to_string()));
        }

        Ok((html, Some(cookie)))
    }

    async fn fetch_player(&self, video_id: &str) -> Result<Value, ProviderError> {
        let (html, cookie) = self.fetch_video_html(video_id).await?;
        let api_key = processor::extract_api_key(&html, video_id)?;

        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let mut request = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key.as_str())])
            .json(&body);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let player: Value = self
            .send(request, video_id)
            .await?
            .json()
            .await
            .map_err(|source| http_error(video_id, source))?;

        processor::check_playability(&player, video_id)?;
        Ok(player)
    }

    async fn fetch_track(
        &self,
        list: &TranscriptList,
        track: &CaptionTrack,
        translation: Option<(&str, &str)>,
    ) -> Result<Transcript, ProviderError> {
        let video_id = list.video_id.as_str();
        if track.base_url.contains("&exp=xpe") {
            return Err(ProviderError::PoTokenRequired(video_id.to_string()));
        }

        let mut request = self.client.get(&track.base_url);
        if let Some((code, _)) = translation {
            request = request.query(&[("tlang", code)]);
        }

        let xml = self
            .send(request, video_id)
            .await?
            .text()
            .await
            .map_err(|source| http_error(video_id, source))?;

        let snippets = processor::parse_timedtext(&xml, video_id, self.preserve_formatting)?;
        let (language_code, language) = match translation {
            Some((code, name)) => (code.to_string(), name.to_string()),
            None => (track.language_code.clone(), track.language.clone()),
        };

        tracing::info!(
            video_id,
            language_code = %language_code,
            snippets = snippets.len(),
            "retrieved transcript"
        );

        Ok(Transcript {
            video_id: video_id.to_string(),
            language,
            language_code,
            is_generated: track.is_generated,
            snippets,
        })
    }
}

fn http_error(video_id: &str, source: reqwest::Error) -> ProviderError {
    ProviderError::Http {
        video_id: video_id.to_string(),
        source,
    }
}

#[async_trait]
impl CaptionProvider for YoutubeCaptionProvider {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript, ProviderError> {
        let list = self.list(video_id).await?;
        let track = list.find_transcript(languages)?;
        self.fetch_track(&list, track, None).await
    }

    async fn list(&self, video_id: &str) -> Result<TranscriptList, ProviderError> {
        let player = self.fetch_player(video_id).await?;
        let list = processor::parse_caption_tracks(&player, video_id)?;
        tracing::info!(
            video_id,
            manual = list.manual.len(),
            generated = list.generated.len(),
            "found caption tracks"
        );
        Ok(list)
    }

    async fn translate(
        &self,
        video_id: &str,
        target_language: &str,
        source_language: Option<String>,
    ) -> Result<Transcript, ProviderError> {
        let list = self.list(video_id).await?;
        let track = match source_language {
            Some(code) => list.find_transcript(&[code])?,
            None => list.find_translatable()?,
        };

        if !track.is_translatable {
            return Err(ProviderError::NotTranslatable(video_id.to_string()));
        }

        let target = list.translation_language(target_language).ok_or_else(|| {
            ProviderError::TranslationLanguageNotAvailable {
                video_id: video_id.to_string(),
                language: target_language.to_string(),
            }
        })?;

        tracing::info!(
            video_id,
            from = %track.language_code,
            to = %target.language_code,
            "translating transcript"
        );

        let translation = (target.language_code.as_str(), target.language.as_str());
        self.fetch_track(&list, track, Some(translation)).await
    }
}

use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use serde::Deserialize;

const TRANSCRIPT_API_URL: &str = "https://api.supadata.ai/v1/youtube/transcript";

/// External transcript provider: video ID in, ordered segment texts out
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    async fn fetch(&self, api_key: &str, video_id: &str, lang: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct TranscriptPayload {
    #[serde(default)]
    content: Vec<TranscriptChunk>,
}

#[derive(Debug, Deserialize)]
struct TranscriptChunk {
    #[serde(default)]
    text: String,
}

/// Supadata YouTube transcript API client
#[derive(Clone)]
pub struct SupadataTranscripts {
    client: reqwest::Client,
}

impl SupadataTranscripts {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptProvider for SupadataTranscripts {
    async fn fetch(&self, api_key: &str, video_id: &str, lang: &str) -> Result<Vec<String>> {
        if api_key.trim().is_empty() {
            bail!("SUPADATA_API_KEY not configured (set the environment variable or save it with 'ytqa config')");
        }

        debug!("Fetching transcript for video {video_id} (lang={lang})");

        let resp = self
            .client
            .get(TRANSCRIPT_API_URL)
            .query(&[("videoId", video_id), ("lang", lang)])
            .header("x-api-key", api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("transcript provider returned {status}: {body}");
        }

        let payload: TranscriptPayload = resp.json().await?;
        Ok(segment_texts(payload))
    }
}

/// Pull the segment texts out of a provider payload, decoding HTML entities
/// and preserving segment order
fn segment_texts(payload: TranscriptPayload) -> Vec<String> {
    payload
        .content
        .into_iter()
        .map(|chunk| html_escape::decode_html_entities(&chunk.text).into_owned())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Join segment texts into the single transcript blob returned to clients
pub fn join_segments(segments: &[String]) -> String {
    segments.join(" ")
}

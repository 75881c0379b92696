pub mod answer;
pub mod config;
pub mod credentials;
pub mod error;
pub mod server;
pub mod session;
pub mod youtube;

use url::Url;

/// Extract the canonical 11-character video ID from a YouTube URL or bare ID
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    match Url::parse(input) {
        Ok(url) => {
            let host = url.host_str()?;

            if host.contains("youtube.com") {
                // youtube.com/watch?v=ID
                if url.path().starts_with("/watch") {
                    let (_, v) = url.query_pairs().find(|(k, _)| k == "v")?;
                    return valid_id(v.into_owned());
                }
                // youtube.com/shorts/ID
                if url.path().starts_with("/shorts/") {
                    let segment = url.path().split('/').nth(2)?;
                    return valid_id(segment.to_string());
                }
            }

            // youtu.be/ID
            if host == "youtu.be" {
                return valid_id(url.path().trim_start_matches('/').to_string());
            }

            None
        }
        // Not a URL, maybe a raw video ID was pasted
        Err(_) => valid_id(input.to_string()),
    }
}

/// Accept a candidate only if it is exactly 11 characters from [A-Za-z0-9_-]
fn valid_id(candidate: String) -> Option<String> {
    if regex::Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap().is_match(&candidate) {
        Some(candidate)
    } else {
        None
    }
}

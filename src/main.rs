use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::{Cli, Commands};
use ytqa::answer::{CompletionProvider, DEFAULT_MODEL, NO_ANSWER, OpenAiCompletions, build_prompt};
use ytqa::credentials::{CredentialStore, Credentials, JsonFileStore};
use ytqa::extract_video_id;
use ytqa::server::{AppState, serve};
use ytqa::session::{Session, Step};
use ytqa::youtube::{SupadataTranscripts, TranscriptProvider, join_segments};

/// Deadline for any single outbound provider call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytqa.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytqa")
        .join("logs")
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();

    // Load config file (non-fatal if missing/invalid)
    let config = ytqa::config::Config::load().unwrap_or_default();

    let lang = if cli.lang == "en" {
        config.default_lang.clone().unwrap_or(cli.lang)
    } else {
        cli.lang
    };
    let model = cli
        .model
        .or(config.default_model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    if cli.verbose {
        let config_path = ytqa::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Language: {lang}  Model: {model}");
    }

    let store = JsonFileStore::default();
    // Environment variables win over the saved credential file
    let credentials = Credentials::from_env().or(store.load());
    debug!("Credentials complete: {}", credentials.is_complete());

    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let transcripts: Arc<dyn TranscriptProvider> = Arc::new(SupadataTranscripts::new(client.clone()));
    let completions: Arc<dyn CompletionProvider> = Arc::new(OpenAiCompletions::new(client, model));

    match cli.command {
        Some(Commands::Serve { bind }) => {
            let bind = if bind == "127.0.0.1:8080" {
                config.bind.clone().unwrap_or(bind)
            } else {
                bind
            };
            let state = AppState {
                transcripts,
                completions,
                credentials,
                lang,
            };
            serve(state, &bind).await?;
        }
        Some(Commands::Ask { url, question }) => {
            run_ask(&*transcripts, &*completions, &credentials, &lang, &url, &question).await?;
        }
        Some(Commands::Config {
            supadata_key,
            openai_key,
            show,
        }) => {
            run_config(&store, supadata_key, openai_key, show)?;
        }
        Some(Commands::Chat { url }) => {
            run_wizard(&*transcripts, &*completions, &credentials, &lang, url).await?;
        }
        None => {
            run_wizard(&*transcripts, &*completions, &credentials, &lang, None).await?;
        }
    }

    Ok(())
}

async fn run_ask(
    transcripts: &dyn TranscriptProvider,
    completions: &dyn CompletionProvider,
    credentials: &Credentials,
    lang: &str,
    url: &str,
    question: &str,
) -> Result<()> {
    let transcript = fetch_transcript(transcripts, credentials, lang, url).await?;
    let prompt = build_prompt(&transcript, question);
    let answer = completions
        .complete(&credentials.openai_key, &prompt)
        .await?
        .unwrap_or_else(|| NO_ANSWER.to_string());
    println!("{answer}");
    Ok(())
}

async fn fetch_transcript(
    transcripts: &dyn TranscriptProvider,
    credentials: &Credentials,
    lang: &str,
    reference: &str,
) -> Result<String> {
    let video_id = extract_video_id(reference).ok_or_else(|| {
        eyre::eyre!(
            "could not extract video ID from: {reference}\n\nSupported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  https://www.youtube.com/shorts/ID\n  <11-character video ID>"
        )
    })?;

    let segments = transcripts.fetch(&credentials.supadata_key, &video_id, lang).await?;
    if segments.is_empty() {
        bail!("no transcript available for video {video_id}");
    }
    Ok(join_segments(&segments))
}

fn run_config(
    store: &JsonFileStore,
    supadata_key: Option<String>,
    openai_key: Option<String>,
    show: bool,
) -> Result<()> {
    if show {
        let creds = store.load();
        println!("supadata key: {}", mask(&creds.supadata_key));
        println!("openai key:   {}", mask(&creds.openai_key));
        println!("stored at:    {}", store.path().display());
        return Ok(());
    }

    if supadata_key.is_none() && openai_key.is_none() {
        bail!("nothing to do: pass --supadata-key and/or --openai-key, or --show");
    }

    let mut creds = store.load();
    if let Some(key) = supadata_key {
        creds.supadata_key = key;
    }
    if let Some(key) = openai_key {
        creds.openai_key = key;
    }
    store.save(&creds)?;
    println!("Credentials saved to {}", store.path().display());
    Ok(())
}

fn mask(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("...{tail}")
}

/// Shorten a transcript for terminal display
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// The three-step wizard: video reference, then questions, then a running
/// chat. One request in flight at a time; /reset starts over, /quit exits.
async fn run_wizard(
    transcripts: &dyn TranscriptProvider,
    completions: &dyn CompletionProvider,
    credentials: &Credentials,
    lang: &str,
    initial_url: Option<String>,
) -> Result<()> {
    let mut session = Session::new();
    let mut pending_url = initial_url;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        match session.step() {
            Step::Url => {
                let reference = match pending_url.take() {
                    Some(url) => url,
                    None => {
                        print!("Video URL or ID: ");
                        io::stdout().flush()?;
                        let Some(line) = lines.next() else {
                            return Ok(());
                        };
                        line?
                    }
                };
                let reference = reference.trim().to_string();
                if reference.is_empty() {
                    continue;
                }

                match fetch_transcript(transcripts, credentials, lang, &reference).await {
                    Ok(transcript) => {
                        println!("Transcript loaded.");
                        println!("{}", preview(&transcript, 200));
                        println!("Ask a question (/reset to start over, /quit to exit).");
                        // Extraction succeeded above, re-running it cannot fail
                        let video_id = extract_video_id(&reference).unwrap_or_default();
                        session.transcript_loaded(video_id, transcript)?;
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            Step::Question | Step::Chat => {
                print!("> ");
                io::stdout().flush()?;
                let Some(line) = lines.next() else {
                    return Ok(());
                };
                let input = line?.trim().to_string();
                if input.is_empty() {
                    continue;
                }
                match input.as_str() {
                    "/quit" | "/exit" => return Ok(()),
                    "/reset" => {
                        session.reset();
                        continue;
                    }
                    _ => {}
                }

                let transcript = session.transcript().unwrap_or_default().to_string();
                session.push_question(&input)?;

                let prompt = build_prompt(&transcript, &input);
                match completions.complete(&credentials.openai_key, &prompt).await {
                    Ok(content) => {
                        let answer = content.unwrap_or_else(|| NO_ANSWER.to_string());
                        println!("{answer}\n");
                        session.push_answer(answer)?;
                    }
                    // Terminal for the request only; the user can retry
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }
}

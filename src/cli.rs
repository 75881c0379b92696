use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ytqa",
    about = "Ask questions about YouTube videos, answered from their transcripts",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Preferred transcript language
    #[arg(short, long, default_value = "en")]
    pub lang: String,

    /// Chat-completion model
    #[arg(long)]
    pub model: Option<String>,

    /// Show request details on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: String,
    },

    /// Fetch a transcript and answer a single question
    Ask {
        /// YouTube video URL or video ID
        url: String,
        /// Question about the video
        question: String,
    },

    /// Save or show provider API keys
    Config {
        /// Transcript provider API key to save
        #[arg(long)]
        supadata_key: Option<String>,
        /// Completion provider API key to save
        #[arg(long)]
        openai_key: Option<String>,
        /// Print the stored keys (masked)
        #[arg(long)]
        show: bool,
    },

    /// Interactive wizard: URL, then questions (default)
    Chat {
        /// YouTube video URL or video ID (prompted if omitted)
        url: Option<String>,
    },
}

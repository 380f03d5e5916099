use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use scribe_types::StreamAction;

/// Command-line client for the scribe editor backend.
#[derive(Debug, Clone, Parser)]
#[command(name = "scribe", author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the scribe API
    #[arg(long, global = true, env = "SCRIBE_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Quiet period after the last change before a save is sent
    #[arg(long, global = true, env = "SCRIBE_SAVE_DEBOUNCE_MS", default_value_t = 2000)]
    pub debounce_ms: u64,

    /// How long "saved" is shown before returning to idle
    #[arg(long, global = true, env = "SCRIBE_SAVED_DISPLAY_MS", default_value_t = 3000)]
    pub saved_display_ms: u64,

    /// Timeout for posts requests in seconds (0 disables it)
    #[arg(long, global = true, env = "SCRIBE_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Stream an AI rewrite of some text to stdout
    Ai {
        /// What to do with the text
        #[arg(long, value_enum)]
        action: ActionArg,

        /// Read the text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Append the result to the file as a new last paragraph
        #[arg(long, requires = "file")]
        append: bool,

        /// Text to send
        text: Option<String>,
    },

    /// Save a text file as a post
    Push {
        /// File to upload
        file: PathBuf,

        /// Post title (defaults to "Untitled" for new posts)
        #[arg(long)]
        title: Option<String>,

        /// Existing post to overwrite instead of creating a draft
        #[arg(long)]
        id: Option<String>,
    },

    /// Keep a post in sync with a text file until interrupted
    Watch {
        /// File to watch
        file: PathBuf,

        /// Post title (defaults to "Untitled" for new posts)
        #[arg(long)]
        title: Option<String>,

        /// Existing post to sync into
        #[arg(long)]
        id: Option<String>,
    },

    /// Inspect and publish posts
    Posts {
        #[command(subcommand)]
        command: PostsCommands,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PostsCommands {
    /// List posts, most recently updated first
    List {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print a single post
    Show {
        id: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Mark a post as published
    Publish { id: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Summarize,
    FixGrammar,
}

impl From<ActionArg> for StreamAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Summarize => StreamAction::Summarize,
            ActionArg::FixGrammar => StreamAction::FixGrammar,
        }
    }
}

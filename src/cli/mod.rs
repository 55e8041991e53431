use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Settings Store Args ---
    /// Path of the JSON settings file holding chat history and server URL.
    /// Defaults to <data dir>/ollama-chat/settings.json.
    #[arg(long, env = "SETTINGS_PATH")]
    pub settings_path: Option<String>,

    /// Keep settings and history in memory only; nothing is written to disk.
    #[arg(long, env = "EPHEMERAL", default_value = "false")]
    pub ephemeral: bool,

    // --- Chat LLM Provider Args ---
    /// Base URL of the inference server (e.g., http://localhost:11434). Saved as the new default when given.
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// Model name sent with every chat request.
    #[arg(long, env = "CHAT_MODEL", default_value = "llama3.2")]
    pub chat_model: String,

    /// Upper bound in seconds for a single chat request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "120")]
    pub request_timeout_secs: u64,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_ollama() {
        let args = Args::try_parse_from(["ollama-chat"]).unwrap();
        assert_eq!(args.chat_model, "llama3.2");
        assert_eq!(args.request_timeout(), Duration::from_secs(120));
        assert!(!args.ephemeral);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "ollama-chat",
            "--ephemeral",
            "--chat-base-url",
            "http://10.0.0.3:11434",
            "--request-timeout-secs",
            "5",
        ]).unwrap();
        assert!(args.ephemeral);
        assert_eq!(args.chat_base_url.as_deref(), Some("http://10.0.0.3:11434"));
        assert_eq!(args.request_timeout_secs, 5);
    }
}

use log::{ info, warn };
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::cli::Args;
use crate::error::ChefError;

#[derive(Deserialize, Default)]
struct SecretsFile {
    #[serde(rename = "SPOONACULAR_API_KEY")]
    spoonacular_api_key: Option<String>,
    #[serde(rename = "CHAT_API_KEY", alias = "GEMINI_API_KEY")]
    chat_api_key: Option<String>,
}

/// The two opaque keys the service needs. Never logged.
#[derive(Clone)]
pub struct Credentials {
    pub spoonacular_api_key: String,
    pub chat_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("spoonacular_api_key", &"<redacted>")
            .field("chat_api_key", &self.chat_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn read_secrets_file(path: &str) -> Result<SecretsFile, ChefError> {
    if !Path::new(path).exists() {
        return Ok(SecretsFile::default());
    }
    let content = fs
        ::read_to_string(path)
        .map_err(|e| ChefError::Config(format!("Failed to read secrets file '{}': {}", path, e)))?;
    let secrets = serde_json
        ::from_str(&content)
        .map_err(|e| ChefError::Config(format!("Failed to parse secrets file '{}': {}", path, e)))?;
    info!("Loaded fallback secrets from {}", path);
    Ok(secrets)
}

/// Resolves keys from CLI/environment first, then the secrets file.
///
/// `chat_key_required` is false for providers that run without a key (Ollama).
pub fn load_credentials(args: &Args, chat_key_required: bool) -> Result<Credentials, ChefError> {
    let mut spoonacular = non_empty(&args.spoonacular_api_key);
    let mut chat = non_empty(&args.chat_api_key);

    if spoonacular.is_none() || chat.is_none() {
        let secrets = read_secrets_file(&args.secrets_path)?;
        if spoonacular.is_none() {
            spoonacular = secrets.spoonacular_api_key.as_deref().and_then(non_empty);
        }
        if chat.is_none() {
            chat = secrets.chat_api_key.as_deref().and_then(non_empty);
        }
    }

    let spoonacular_api_key = spoonacular.ok_or_else(|| {
        ChefError::Config(
            "API keys not found: set SPOONACULAR_API_KEY in the environment, .env or secrets file".to_string()
        )
    })?;

    if chat.is_none() {
        if chat_key_required {
            return Err(
                ChefError::Config(
                    "API keys not found: set CHAT_API_KEY in the environment, .env or secrets file".to_string()
                )
            );
        }
        warn!("No chat API key configured; provider '{}' will run without one", args.chat_llm_type);
    }

    Ok(Credentials {
        spoonacular_api_key,
        chat_api_key: chat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(extra: &[&str], secrets_path: &str) -> Args {
        let mut argv = vec!["chefmate", "--secrets-path", secrets_path];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cli_values_win() {
        let a = args(&["--spoonacular-api-key", "sp", "--chat-api-key", "ck"], "/nonexistent.json");
        let creds = load_credentials(&a, true).unwrap();
        assert_eq!(creds.spoonacular_api_key, "sp");
        assert_eq!(creds.chat_api_key.as_deref(), Some("ck"));
    }

    #[test]
    fn secrets_file_fills_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"SPOONACULAR_API_KEY":"file-sp","GEMINI_API_KEY":"file-chat"}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let a = args(&["--spoonacular-api-key", "cli-sp"], &path);
        let creds = load_credentials(&a, true).unwrap();
        assert_eq!(creds.spoonacular_api_key, "cli-sp");
        assert_eq!(creds.chat_api_key.as_deref(), Some("file-chat"));
    }

    #[test]
    fn missing_keys_are_config_errors() {
        let a = args(&["--chat-api-key", "ck"], "/nonexistent.json");
        assert!(matches!(load_credentials(&a, true), Err(ChefError::Config(_))));

        let a = args(&["--spoonacular-api-key", "sp"], "/nonexistent.json");
        assert!(matches!(load_credentials(&a, true), Err(ChefError::Config(_))));
        assert!(load_credentials(&a, false).unwrap().chat_api_key.is_none());
    }

    #[test]
    fn malformed_secrets_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let a = args(&[], file.path().to_str().unwrap());
        assert!(matches!(load_credentials(&a, true), Err(ChefError::Config(_))));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let creds = Credentials {
            spoonacular_api_key: "secret-sp".into(),
            chat_api_key: Some("secret-chat".into()),
        };
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("secret"));
    }
}

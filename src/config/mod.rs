//! Application configuration
//!
//! Settings are read once at startup from the process environment (after
//! `dotenvy` has loaded `.env`). The Gemini API key is the one mutable
//! setting: key rotation rewrites the `.env` file and then updates the
//! in-memory value through [`SharedSettings`], so the next upload picks up
//! the new credential without a process restart.

mod env_file;

pub use env_file::{find_env_file, rewrite_api_key_line, rotate_key_in_file, ENV_KEY_PREFIX};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

/// Process-wide settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_name: String,
    pub api_v1_prefix: String,
    pub secret_key: String,
    /// Token signing algorithm; part of the config surface, unused by the
    /// extraction pipeline.
    pub algorithm: String,
    pub access_token_expire_minutes: u32,
    pub database_url: String,
    pub gemini_api_key: String,
    pub server_port: u16,
    /// Pages per Gemini request. 15 keeps a 100-page document to 7 requests.
    pub batch_size: usize,
    /// Delay between batch requests, to stay under the 15 RPM free tier.
    pub batch_delay: Duration,
    /// Gemini model used for vision extraction.
    pub gemini_model: String,
    /// Target render resolution; pages are scaled by render_dpi / 72.
    pub render_dpi: f32,
    /// When set, rendered pages are dumped here for inspection.
    pub debug_image_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_name: "PDFExtractPro".to_string(),
            api_v1_prefix: "/api/v1".to_string(),
            secret_key: "YOUR_SECRET_KEY_HERE_CHANGE_IN_PRODUCTION".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
            database_url: "sqlite://extractions.db".to_string(),
            gemini_api_key: String::new(),
            server_port: 8000,
            batch_size: 15,
            batch_delay: Duration::from_secs(1),
            gemini_model: "gemini-2.0-flash".to_string(),
            render_dpi: 150.0,
            debug_image_dir: None,
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            project_name: env_or("PROJECT_NAME", defaults.project_name),
            api_v1_prefix: env_or("API_V1_STR", defaults.api_v1_prefix),
            secret_key: env_or("SECRET_KEY", defaults.secret_key),
            algorithm: env_or("ALGORITHM", defaults.algorithm),
            access_token_expire_minutes: parse_env_or(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                defaults.access_token_expire_minutes,
            ),
            database_url: env_or("DATABASE_URL", defaults.database_url),
            gemini_api_key: env_or("GEMINI_API_KEY", defaults.gemini_api_key),
            server_port: parse_env_or("SERVER_PORT", defaults.server_port),
            batch_size: defaults.batch_size,
            batch_delay: defaults.batch_delay,
            gemini_model: defaults.gemini_model,
            render_dpi: defaults.render_dpi,
            debug_image_dir: std::env::var("DEBUG_IMAGE_DIR").ok(),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Settings shared across handlers, writable for key rotation
pub type SharedSettings = Arc<RwLock<Settings>>;

pub fn shared(settings: Settings) -> SharedSettings {
    Arc::new(RwLock::new(settings))
}

/// Mask an API key for display: first 4 + last 4 characters, or a fixed
/// mask for keys too short to partially reveal.
///
/// Counts characters, not bytes; keys are arbitrary operator input and a
/// byte slice could land inside a multibyte character.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_long_key() {
        assert_eq!(mask_key("AIzaSy1234"), "AIza...1234");
    }

    #[test]
    fn mask_short_key() {
        assert_eq!(mask_key("12345678"), "***");
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key(""), "***");
    }

    #[test]
    fn mask_nine_char_key_reveals_ends() {
        assert_eq!(mask_key("abcdefghi"), "abcd...fghi");
    }

    #[test]
    fn mask_counts_characters_not_bytes() {
        // 4 characters but 12 bytes; must take the short-key branch
        assert_eq!(mask_key("€€€€"), "***");
        // 10 characters, every one multibyte
        assert_eq!(mask_key("€€€€€€€€€€"), "€€€€...€€€€");
        // Mixed: the 4-char boundary falls inside '€' if sliced by bytes
        assert_eq!(mask_key("ab€défghîjk"), "ab€d...hîjk");
    }

    #[test]
    fn defaults_match_original_service() {
        let s = Settings::default();
        assert_eq!(s.batch_size, 15);
        assert_eq!(s.batch_delay, Duration::from_secs(1));
        assert_eq!(s.api_v1_prefix, "/api/v1");
        assert!(s.gemini_api_key.is_empty());
    }
}

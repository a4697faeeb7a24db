//! Client configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer; every section and
//! field has a default so a partial (or missing) file is valid.

use serde::{Deserialize, Serialize};

/// Backend URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Models the backend accepts, in the order they are offered to the user.
pub const AVAILABLE_MODELS: &[&str] = &["gpt-4o-mini", "gpt-3.5-turbo", "gpt-4.1"];

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AikaConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub uploads: UploadSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

/// Parameters sent along with every chat request.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    pub top_k: u32,
    /// ÖNACE code; "0" means general, applicable to all industries
    pub industry_code: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            temperature: 0.2,
            top_k: 5,
            industry_code: "0".to_string(),
        }
    }
}

impl ChatSettings {
    pub fn is_known_model(model: &str) -> bool {
        AVAILABLE_MODELS.contains(&model)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AuthSettings {
    /// Artificial delay before a login attempt is answered
    pub login_delay_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self { login_delay_ms: 500 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UploadSettings {
    /// Time after which a successful upload is reported as processed
    pub processing_delay_ms: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            processing_delay_ms: 3000,
        }
    }
}

/// Normalizes a configured backend URL.
///
/// Surrounding whitespace and trailing slashes are removed; a URL without
/// scheme gets `https://`. An empty value falls back to [`DEFAULT_API_URL`].
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

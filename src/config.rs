use serde::{
    Deserialize,
    Serialize,
};

use crate::persistence;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub vision_api_key: String,
    pub translate_api_key: String,
    pub source_language: String,
    pub target_language: String,
    /// OCR results below this confidence are discarded by the gateway.
    pub min_text_confidence: f32,
    pub translation_cache_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vision_api_key: String::new(),
            translate_api_key: String::new(),
            source_language: "ja".to_string(),
            target_language: "zh-TW".to_string(),
            min_text_confidence: 0.5,
            translation_cache_file: "translation_cache.json".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        persistence::load_json_or_default(CONFIG_FILE)
    }

    pub fn save(&self) -> Result<(), crate::core::ManabiError> {
        persistence::save_json(self, CONFIG_FILE)
    }

    pub fn is_api_key_configured(&self) -> bool {
        !self.vision_api_key.is_empty() && !self.translate_api_key.is_empty()
    }
}

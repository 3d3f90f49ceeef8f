use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Mutex,
    },
    time::Duration,
};

use serde::Deserialize;
use tokio::time::sleep;

use crate::{
    core::ManabiError,
    persistence,
};

pub const CACHE_FILE: &str = "translation_cache.json";

/// Upstream rate limits: at most this many texts per network call,
/// with a fixed pause between consecutive calls.
pub const BATCH_SIZE: usize = 10;
pub const BATCH_DELAY: Duration = Duration::from_millis(100);

/// Flat JSON map keyed by exact source text. All access goes through
/// one mutex, and a later set for the same key wins.
pub struct TranslationCache {
    entries: Mutex<HashMap<String, String>>,
    file_path: Option<PathBuf>,
}

impl TranslationCache {
    pub fn load() -> Self {
        Self::load_from(persistence::get_data_file_path(CACHE_FILE))
    }

    pub fn load_for(config: &crate::AppConfig) -> Self {
        Self::load_from(persistence::get_data_file_path(&config.translation_cache_file))
    }

    pub fn load_from(file_path: PathBuf) -> Self {
        let entries: HashMap<String, String> = match persistence::load_json_at(&file_path) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("Failed to load translation cache: {}. Starting empty.", e);
                HashMap::new()
            }
        };

        Self { entries: Mutex::new(entries), file_path: Some(file_path) }
    }

    pub fn in_memory() -> Self {
        Self { entries: Mutex::new(HashMap::new()), file_path: None }
    }

    pub fn get(&self, source: &str) -> Option<String> {
        self.entries.lock().ok()?.get(source).cloned()
    }

    pub fn set(&self, source: String, target: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(source, target);
        }
    }

    pub fn set_batch(&self, translations: &HashMap<String, String>) {
        if let Ok(mut entries) = self.entries.lock() {
            for (source, target) in translations {
                entries.insert(source.clone(), target.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the current snapshot to disk. The write happens outside
    /// the lock so translate callers are never blocked on I/O.
    pub fn flush(&self) -> Result<(), ManabiError> {
        let Some(file_path) = &self.file_path else {
            return Ok(());
        };

        let snapshot = self
            .entries
            .lock()
            .map_err(|_| ManabiError::Custom("Translation cache lock poisoned".to_string()))?
            .clone();

        persistence::save_json_at(&snapshot, file_path)
    }

    pub fn clear(&self) -> Result<(), ManabiError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        if let Some(file_path) = &self.file_path {
            if file_path.exists() {
                std::fs::remove_file(file_path)?;
            }
        }
        Ok(())
    }
}

/// One network sub-batch against the translation gateway.
pub trait Translator {
    fn translate_batch(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<HashMap<String, String>, ManabiError>> + Send;
}

/// Batch translation with cache-first lookup, sub-batch splitting, and
/// identity fallback: the returned map covers every requested text.
pub struct TranslationService<T: Translator> {
    translator: T,
    cache: TranslationCache,
    network_available: AtomicBool,
}

impl<T: Translator> TranslationService<T> {
    pub fn new(translator: T, cache: TranslationCache) -> Self {
        Self { translator, cache, network_available: AtomicBool::new(true) }
    }

    pub fn set_network_available(&self, available: bool) {
        self.network_available.store(available, Ordering::Relaxed);
    }

    pub fn is_network_available(&self) -> bool {
        self.network_available.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub async fn translate_batch(&self, texts: &[String]) -> HashMap<String, String> {
        if texts.is_empty() {
            return HashMap::new();
        }

        let mut translations: HashMap<String, String> = HashMap::new();
        let mut uncached: Vec<String> = Vec::new();

        for text in texts {
            if text.trim().is_empty() {
                continue;
            }
            if translations.contains_key(text) || uncached.contains(text) {
                continue;
            }
            match self.cache.get(text) {
                Some(cached) => {
                    translations.insert(text.clone(), cached);
                }
                None => uncached.push(text.clone()),
            }
        }

        if !uncached.is_empty() && self.is_network_available() {
            let fresh = self.perform_translation(&uncached).await;
            self.cache.set_batch(&fresh);
            if let Err(e) = self.cache.flush() {
                eprintln!("Failed to save translation cache: {}", e);
            }
            translations.extend(fresh);
        }

        // Identity fallback: offline, gateway failure, or empty source
        // all map the text to itself.
        for text in texts {
            translations.entry(text.clone()).or_insert_with(|| text.clone());
        }

        translations
    }

    pub async fn translate_single(&self, text: &str) -> String {
        let texts = [text.to_string()];
        let results = self.translate_batch(&texts).await;
        results.get(text).cloned().unwrap_or_else(|| text.to_string())
    }

    async fn perform_translation(&self, texts: &[String]) -> HashMap<String, String> {
        let mut translations = HashMap::new();

        for (index, chunk) in texts.chunks(BATCH_SIZE).enumerate() {
            if index > 0 {
                sleep(BATCH_DELAY).await;
            }

            match self.translator.translate_batch(chunk).await {
                Ok(batch) => translations.extend(batch),
                Err(e) => eprintln!("Translation batch failed: {}", e),
            }
        }

        translations
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedText {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct TranslationsPayload {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslateEnvelope {
    data: TranslationsPayload,
}

/// Google Translate v2 REST adapter. Results come back in request
/// order, so they are zipped against the input texts.
pub struct GoogleTranslator {
    client: reqwest::Client,
    api_key: String,
    source_language: String,
    target_language: String,
}

impl GoogleTranslator {
    const ENDPOINT: &'static str = "https://translation.googleapis.com/language/translate/v2";

    pub fn new(
        api_key: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    pub fn from_config(config: &crate::AppConfig) -> Self {
        Self::new(
            config.translate_api_key.clone(),
            config.source_language.clone(),
            config.target_language.clone(),
        )
    }
}

impl Translator for GoogleTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
    ) -> Result<HashMap<String, String>, ManabiError> {
        if self.api_key.is_empty() {
            return Err(ManabiError::MissingApiKey("translate"));
        }

        let body = serde_json::json!({
            "q": texts,
            "source": self.source_language,
            "target": self.target_language,
            "key": self.api_key,
            "format": "text",
        });

        let response = self.client.post(Self::ENDPOINT).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(ManabiError::GatewayStatus(response.status().as_u16()));
        }

        let envelope: TranslateEnvelope = response.json().await?;

        Ok(texts
            .iter()
            .zip(envelope.data.translations)
            .map(|(source, translated)| (source.clone(), translated.translated_text))
            .collect())
    }
}

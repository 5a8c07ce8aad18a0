//! Best-effort translation of article text.
//!
//! Translation is an enhancement, never a dependency: without a backend the
//! text passes through, and any backend failure is logged and answered with
//! the source text. Each call is independent, so an article may end up with
//! a translated title but an untranslated body.

use crate::api::{TranslateError, TranslationBackend};
use crate::utils::truncate_for_log;
use tracing::{debug, instrument, warn};

/// Build the instruction sent to the backend.
pub fn build_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following English text to {target_language}. \
         Only provide the translated text, without any additional commentary \
         or conversational filler:\n\n{text}"
    )
}

/// Translates text through an optional [`TranslationBackend`].
#[derive(Debug)]
pub struct Translator<B> {
    backend: Option<B>,
}

impl<B: TranslationBackend> Translator<B> {
    /// Wrap `backend`; `None` disables translation.
    pub fn new(backend: Option<B>) -> Self {
        Self { backend }
    }

    /// A translator that always returns its input.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Translate `text` into `target_language`, falling back to `text`.
    ///
    /// # Arguments
    ///
    /// * `text` - Source text, usually English
    /// * `target_language` - Language name placed in the prompt (e.g. `Malay`)
    ///
    /// # Returns
    ///
    /// - blank input returns `""` without calling the backend
    /// - no backend returns `text` unchanged
    /// - a backend failure is logged and returns `text` unchanged
    /// - otherwise the trimmed backend answer is returned
    pub async fn translate(&self, text: &str, target_language: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let Some(backend) = &self.backend else {
            return text.to_string();
        };

        match self.try_translate(backend, text, target_language).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(
                    backend = backend.name(),
                    target_language,
                    error = %e,
                    text_preview = %truncate_for_log(text, 80),
                    "Translation failed; keeping source text"
                );
                text.to_string()
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(%target_language, bytes = text.len()))]
    async fn try_translate(
        &self,
        backend: &B,
        text: &str,
        target_language: &str,
    ) -> Result<String, TranslateError> {
        let prompt = build_prompt(text, target_language);
        let answer = backend.generate(&prompt).await?;
        let translated = answer.trim();
        if translated.is_empty() {
            return Err(TranslateError::EmptyResponse);
        }
        debug!(bytes = translated.len(), "Translated");
        Ok(translated.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeBackend;
    use super::*;

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("Bitcoin rallies", "Malay");
        assert!(prompt.starts_with("Translate the following English text to Malay."));
        assert!(prompt.contains("Only provide the translated text"));
        assert!(prompt.ends_with("\n\nBitcoin rallies"));
    }

    #[tokio::test]
    async fn test_disabled_returns_text_unchanged() {
        let translator = Translator::<FakeBackend>::disabled();
        assert!(translator.backend().is_none());
        assert_eq!(translator.translate("Hello", "Malay").await, "Hello");
        assert_eq!(
            translator.translate("  padded text ", "Malay").await,
            "  padded text "
        );
    }

    #[tokio::test]
    async fn test_blank_input_skips_backend() {
        let translator = Translator::new(Some(FakeBackend::default()));
        assert_eq!(translator.translate("", "Malay").await, "");
        assert_eq!(translator.translate("   ", "Malay").await, "");
        assert_eq!(translator.translate("\n\t", "Malay").await, "");
        assert_eq!(translator.backend.as_ref().unwrap().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_blank_input_without_backend() {
        let translator = Translator::<FakeBackend>::disabled();
        assert_eq!(translator.translate("   ", "Malay").await, "");
    }

    #[tokio::test]
    async fn test_translation_is_trimmed() {
        let translator = Translator::new(Some(FakeBackend::default()));
        assert_eq!(translator.translate("Hello", "Malay").await, "[ms] Hello");
        let backend = translator.backend.as_ref().unwrap();
        assert_eq!(backend.calls.get(), 1);
        assert!(backend.prompts.borrow()[0].contains("to Malay."));
    }

    #[tokio::test]
    async fn test_backend_failure_returns_source_text() {
        let translator = Translator::new(Some(FakeBackend::failing_on("Boom")));
        assert_eq!(translator.translate("Boom goes the market", "Malay").await, "Boom goes the market");
        assert_eq!(translator.translate("Calm day", "Malay").await, "[ms] Calm day");
    }
}

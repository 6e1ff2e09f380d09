//! Analysis configuration for the completion dispatcher.
//!
//! Session acquisition consults an [`OptionsProvider`] at startup time so that
//! embedders can supply settings from whatever configuration surface they own
//! (workspace settings, user profile, hardcoded test values).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings the backend session is started with.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSettings {
    /// Language identifier announced when opening the virtual document.
    #[serde(default = "default_language_id")]
    pub language_id: String,

    /// File extension used when synthesizing a scratch document location.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Workspace root the backend session is anchored to, if any.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
}

fn default_language_id() -> String {
    "python".to_string()
}

fn default_file_extension() -> String {
    "py".to_string()
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            language_id: default_language_id(),
            file_extension: default_file_extension(),
            workspace_root: None,
        }
    }
}

/// Source of analysis configuration, consulted once per session startup.
pub trait OptionsProvider: Send + Sync {
    /// Return the settings the next backend session should be started with.
    fn analysis_settings(&self) -> AnalysisSettings;
}

/// An [`OptionsProvider`] that always returns the same settings.
pub struct StaticOptions {
    settings: AnalysisSettings,
}

impl StaticOptions {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self::new(AnalysisSettings::default())
    }
}

impl OptionsProvider for StaticOptions {
    fn analysis_settings(&self) -> AnalysisSettings {
        self.settings.clone()
    }
}

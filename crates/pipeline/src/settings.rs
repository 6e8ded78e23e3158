//! Pipeline settings

use alerting::{AlertError, AlertPolicy};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::render::Palette;
use crate::PipelineError;

/// Environment variable prefix, e.g. `PROXIMITY_POLICY__PROXIMITY_THRESHOLD=0.2`
pub const ENV_PREFIX: &str = "PROXIMITY";

/// Static configuration, loaded once per session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Alert thresholds, watched classes, and cues
    pub policy: AlertPolicy,
    /// Box colors
    pub palette: Palette,
}

impl PipelineSettings {
    /// Load settings from an optional file layered under environment
    /// variables. Missing keys fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading pipeline settings from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        let settings: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.policy.validate()?;

        let invalid = self.palette.invalid_labels();
        if !invalid.is_empty() {
            return Err(AlertError::Configuration(format!(
                "palette colors out of range for: {}",
                invalid.join(", ")
            ))
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;
    use std::io::Write;

    fn write_settings(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = PipelineSettings::load(None).unwrap();
        assert_eq!(settings.policy.proximity_cue, "alert");
        assert_eq!(settings.palette.default_color, Color::RED);
    }

    #[test]
    fn test_load_from_file() {
        let file = write_settings(
            r#"
            [policy]
            proximity_threshold = 0.3
            watched_classes = ["stop sign", "traffic light"]

            [palette.colors.car]
            r = 0.0
            g = 1.0
            b = 0.0
            a = 1.0
            "#,
        );

        let settings = PipelineSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.policy.proximity_threshold, 0.3);
        assert_eq!(settings.policy.proximity_hold_seconds, 1.0);
        assert!(settings.policy.watched_classes.contains("stop sign"));
        assert_eq!(settings.palette.color_for("car"), Color::rgba(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_invalid_file_rejected() {
        let file = write_settings(
            r#"
            [policy]
            proximity_hold_seconds = -1.0
            "#,
        );

        let err = PipelineSettings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, PipelineError::Alert(AlertError::Configuration(_))));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = PipelineSettings::load(Some(Path::new("/nonexistent/settings.toml"))).unwrap_err();
        assert!(matches!(err, PipelineError::Settings(_)));
    }

    #[test]
    fn test_invalid_palette_rejected() {
        let settings = PipelineSettings {
            palette: Palette::default().with_color("car", Color::rgba(0.0, -1.0, 0.0, 1.0)),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}

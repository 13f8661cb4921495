//! Pipeline configuration, merged once from host overrides over defaults.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::region::{DelimiterKind, DelimiterRule};

/// Errors raised while merging and validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A delimiter pair contains an empty start or end string.
    #[error("math delimiter pairs must use non-empty strings ({family} pair #{index})")]
    EmptyDelimiter {
        /// Which family the offending pair belongs to.
        family: &'static str,
        /// Zero-based position of the pair inside its family.
        index: usize,
    },
}

/// Effective pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Inline math delimiter pairs, tried in order.
    pub inline_math: Vec<(String, String)>,
    /// Display math delimiter pairs, tried in order.
    pub display_math: Vec<(String, String)>,
    /// Wraps display math in a horizontally scrollable container.
    pub overflow_scroll: bool,
    /// Free-form options forwarded to the typesetting backend.
    pub custom_options: JsonValue,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inline_math: vec![
                ("$".to_string(), "$".to_string()),
                ("\\(".to_string(), "\\)".to_string()),
            ],
            display_math: vec![("$$".to_string(), "$$".to_string())],
            overflow_scroll: true,
            custom_options: JsonValue::Object(Default::default()),
        }
    }
}

impl Settings {
    /// Applies host overrides on top of the defaults and validates the result.
    pub fn merge(overrides: SettingsOverrides) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();

        if let Some(pairs) = overrides.inline_math {
            settings.inline_math = pairs;
        }
        if let Some(pairs) = overrides.display_math {
            settings.display_math = pairs;
        }
        if let Some(flag) = overrides.overflow_scroll {
            settings.overflow_scroll = flag;
        }
        if let Some(options) = overrides.custom_options {
            cover_value(&options, &mut settings.custom_options);
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (family, pairs) in [
            ("inlineMath", &self.inline_math),
            ("displayMath", &self.display_math),
        ] {
            for (index, (start, end)) in pairs.iter().enumerate() {
                if start.is_empty() || end.is_empty() {
                    return Err(SettingsError::EmptyDelimiter { family, index });
                }
            }
        }
        Ok(())
    }

    /// Scanner rules for the inline family. Inline regions stay on one line.
    pub fn inline_rules(&self) -> Vec<DelimiterRule> {
        self.inline_math
            .iter()
            .map(|(start, end)| DelimiterRule::new(start, end, false, DelimiterKind::Inline))
            .collect()
    }

    /// Scanner rules for the display family. Display regions may span lines.
    pub fn display_rules(&self) -> Vec<DelimiterRule> {
        self.display_math
            .iter()
            .map(|(start, end)| DelimiterRule::new(start, end, true, DelimiterKind::Display))
            .collect()
    }
}

/// Host-supplied overrides, deserialized from a configuration object.
///
/// Absent fields keep their defaults; `customOptions` is deep-merged rather
/// than replaced.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOverrides {
    /// Replaces the default inline delimiter pairs.
    #[serde(default)]
    pub inline_math: Option<Vec<(String, String)>>,
    /// Replaces the default display delimiter pairs.
    #[serde(default)]
    pub display_math: Option<Vec<(String, String)>>,
    /// Toggles the scroll container around display math.
    #[serde(default)]
    pub overflow_scroll: Option<bool>,
    /// Backend options merged over the built-in defaults.
    #[serde(default)]
    pub custom_options: Option<JsonValue>,
}

/// Deep-merges `source` into `target`.
///
/// Scalar and array values from `source` replace the target value outright;
/// object values recurse so sibling keys in the target survive.
pub fn cover_value(source: &JsonValue, target: &mut JsonValue) {
    let (JsonValue::Object(src), JsonValue::Object(dst)) = (source, target) else {
        return;
    };

    for (key, value) in src {
        if value.is_object() {
            if let Some(existing) = dst.get_mut(key) {
                if existing.is_object() {
                    cover_value(value, existing);
                    continue;
                }
            }
        }
        dst.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.inline_math.len(), 2);
        assert_eq!(settings.inline_math[0], ("$".into(), "$".into()));
        assert_eq!(settings.inline_math[1], ("\\(".into(), "\\)".into()));
        assert_eq!(settings.display_math, vec![("$$".into(), "$$".into())]);
        assert!(settings.overflow_scroll);
        assert_eq!(settings.custom_options, json!({}));
    }

    #[test]
    fn merge_accepts_camel_case_overrides() {
        let overrides: SettingsOverrides = serde_json::from_value(json!({
            "inlineMath": [["\\(", "\\)"]],
            "overflowScroll": false,
        }))
        .unwrap();
        let settings = Settings::merge(overrides).unwrap();
        assert_eq!(settings.inline_math, vec![("\\(".into(), "\\)".into())]);
        assert!(!settings.overflow_scroll);
        // Untouched fields keep their defaults.
        assert_eq!(settings.display_math, vec![("$$".into(), "$$".into())]);
    }

    #[test]
    fn merge_rejects_empty_delimiters() {
        let overrides: SettingsOverrides = serde_json::from_value(json!({
            "displayMath": [["$$", ""]],
        }))
        .unwrap();
        let err = Settings::merge(overrides).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::EmptyDelimiter {
                family: "displayMath",
                index: 0,
            }
        ));
    }

    #[test]
    fn custom_options_deep_merge() {
        let mut target = json!({"throwOnError": false, "macros": {"a": "1", "b": "2"}});
        let source = json!({"macros": {"b": "3"}, "trust": true});
        cover_value(&source, &mut target);
        assert_eq!(
            target,
            json!({
                "throwOnError": false,
                "macros": {"a": "1", "b": "3"},
                "trust": true,
            })
        );
    }

    #[test]
    fn scalar_override_replaces_object() {
        let mut target = json!({"macros": {"a": "1"}});
        cover_value(&json!({"macros": null}), &mut target);
        assert_eq!(target, json!({"macros": null}));
    }

    #[test]
    fn rules_inherit_family_modes() {
        let settings = Settings::default();
        assert!(settings.inline_rules().iter().all(|r| !r.multiline));
        assert!(settings.display_rules().iter().all(|r| r.multiline));
    }
}

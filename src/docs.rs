//! Markdown reference for the default settings
//!
//! Rendered from [`Settings::metadata`], so the reference always shows the
//! defaults an application would actually get.

use crate::app_info::AppInfo;
use crate::config::{SettingMetadata, SettingType, Settings};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Configuration for docs generation
#[derive(Debug, Clone, Default)]
pub struct DocsConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub show_advanced: bool,
    pub group_by_category: bool,
}

impl DocsConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            show_advanced: true,
            group_by_category: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    #[must_use]
    pub fn hide_advanced(mut self) -> Self {
        self.show_advanced = false;
        self
    }

    #[must_use]
    pub fn flat(mut self) -> Self {
        self.group_by_category = false;
        self
    }
}

/// Markdown reference of the defaults for an application
#[must_use]
pub fn generate_docs(app: &AppInfo, config: DocsConfig) -> String {
    let metadata = Settings::metadata(app);
    generate_docs_from_metadata(&metadata, config)
}

/// Markdown reference from raw metadata
#[must_use]
pub fn generate_docs_from_metadata<S: std::hash::BuildHasher>(
    metadata: &HashMap<String, SettingMetadata, S>,
    config: DocsConfig,
) -> String {
    let mut output = String::new();

    let title = config
        .title
        .unwrap_or_else(|| "Default Settings Reference".to_string());
    let _ = writeln!(output, "# {title}\n");

    if let Some(desc) = config.description {
        let _ = writeln!(output, "{desc}\n");
    }

    // category -> key -> metadata, both sorted
    let mut sections: BTreeMap<&str, BTreeMap<&str, &SettingMetadata>> = BTreeMap::new();
    for (key, setting) in metadata {
        if setting.flags.advanced && !config.show_advanced {
            continue;
        }
        let section = if config.group_by_category {
            setting.category_name()
        } else {
            "settings"
        };
        sections
            .entry(section)
            .or_default()
            .insert(key.as_str(), setting);
    }

    for (section, settings) in sections {
        let _ = writeln!(output, "\n## {}\n", capitalize(section));
        for (key, setting) in settings {
            format_setting(&mut output, key, setting);
        }
    }

    output
}

fn format_setting(out: &mut String, key: &str, setting: &SettingMetadata) {
    let _ = writeln!(out, "### `{key}`\n");

    let flags = &setting.flags;
    let badges: Vec<&str> = [
        (flags.advanced, "Advanced"),
        (flags.env_dependent, "Environment-dependent"),
        (flags.sensitive, "Sensitive"),
        (setting.setting_type == SettingType::Info, "Read-only"),
    ]
    .into_iter()
    .filter_map(|(on, badge)| on.then_some(badge))
    .collect();
    if !badges.is_empty() {
        let _ = writeln!(out, "{}\n", badges.join(" • "));
    }

    if let Some(desc) = &setting.description {
        let _ = writeln!(out, "{desc}\n");
    }

    out.push_str("| Property | Value |\n");
    out.push_str("|----------|-------|\n");
    let _ = writeln!(out, "| **Type** | {} |", format_type(setting));
    let default = if flags.sensitive {
        "(hidden)".to_string()
    } else {
        format!("`{}`", format_value(&setting.default))
    };
    let _ = writeln!(out, "| **Default** | {default} |");

    if setting.setting_type == SettingType::Number {
        let bounds = &setting.bounds;
        match (bounds.min, bounds.max) {
            (Some(min), Some(max)) => {
                let _ = writeln!(out, "| **Range** | {min} - {max} |");
            }
            (Some(min), None) => {
                let _ = writeln!(out, "| **Minimum** | {min} |");
            }
            (None, Some(max)) => {
                let _ = writeln!(out, "| **Maximum** | {max} |");
            }
            (None, None) => {}
        }
        if bounds.nullable {
            out.push_str("| **Nullable** | yes |\n");
        }
    }

    if let Some(pattern) = &setting.pattern {
        let _ = writeln!(out, "| **Pattern** | `{pattern}` |");
    }

    out.push('\n');

    if !setting.options.is_empty() {
        out.push_str("**Options:**\n\n");
        for option in &setting.options {
            let value = format_value(&option.value);
            match &option.description {
                Some(desc) => {
                    let _ = writeln!(out, "- `{value}` - {} ({desc})", option.label);
                }
                None => {
                    let _ = writeln!(out, "- `{value}` - {}", option.label);
                }
            }
        }
        out.push('\n');
    }

    out.push_str("---\n\n");
}

fn format_type(setting: &SettingMetadata) -> &'static str {
    match setting.setting_type {
        SettingType::Toggle => "Boolean",
        SettingType::Text => "String",
        SettingType::Number if setting.bounds.integer => "Integer",
        SettingType::Number => "Number",
        SettingType::Select => "Select",
        SettingType::Info => "Info",
        SettingType::List => "List (Strings)",
    }
}

fn format_value(v: &Value) -> String {
    match v {
        Value::String(s) => format!("\"{s}\""),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        _ => v.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

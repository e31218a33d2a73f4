use crate::api::DEFAULT_API_BASE_URL;
use crate::cli::CliArgs;
use crate::model::Workflow;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_LOG_FILTER: &str = "info";

/// Effective runtime settings after CLI, environment and config file are merged.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    pub source: Option<String>,
    pub api_base_url: String,
    pub namespace: String,
    pub workflow: Option<Workflow>,
    pub output_dir: PathBuf,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default, alias = "api_url", alias = "base_url")]
    api_base_url: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    log_filter: Option<String>,
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let Some(path) = discover_config_path() else {
            return Ok(Self::merge(args, None, ConfigFile::default()));
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let file = parse_config(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(Self::merge(args, Some(path.display().to_string()), file))
    }

    fn merge(args: &CliArgs, source: Option<String>, file: ConfigFile) -> Self {
        Self {
            source,
            api_base_url: non_blank(args.api_base_url.clone())
                .or(non_blank(file.api_base_url))
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            namespace: non_blank(args.namespace.clone())
                .or(non_blank(file.namespace))
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            workflow: args.workflow,
            output_dir: args
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            log_filter: non_blank(args.log_filter.clone())
                .or(non_blank(file.log_filter))
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_file: args.log_file.clone(),
        }
    }
}

fn parse_config(raw: &str) -> Result<ConfigFile> {
    if raw.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KUBEACCESS_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("kubeaccess.yaml"),
        PathBuf::from("kubeaccess.yml"),
        PathBuf::from(".kubeaccess.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/kubeaccess/config.yaml"),
            PathBuf::from(&home).join(".config/kubeaccess/config.yml"),
            PathBuf::from(&home).join(".kubeaccess.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{ConfigFile, Settings, parse_config};
    use crate::cli::CliArgs;
    use clap::Parser;
    use std::path::PathBuf;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["kubeaccess"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings = Settings::merge(
            &CliArgs {
                api_base_url: None,
                ..args(&[])
            },
            None,
            ConfigFile::default(),
        );
        assert_eq!(settings.api_base_url, "http://localhost:5005");
        assert_eq!(settings.namespace, "default");
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert_eq!(settings.log_filter, "info");
        assert_eq!(settings.workflow, None);
    }

    #[test]
    fn file_values_fill_gaps_and_flags_win() {
        let file = parse_config(
            "api_base_url: http://access.internal:8080\nnamespace: team-a\noutput_dir: /tmp/out\nlog_filter: debug\n",
        )
        .unwrap();
        let settings = Settings::merge(
            &args(&[
                "--api-base-url",
                "http://override:9000",
                "--output-dir",
                "exports",
            ]),
            Some("kubeaccess.yaml".to_string()),
            file,
        );
        assert_eq!(settings.api_base_url, "http://override:9000");
        assert_eq!(settings.namespace, "team-a");
        assert_eq!(settings.output_dir, PathBuf::from("exports"));
        assert_eq!(settings.log_filter, "debug");
        assert_eq!(settings.source.as_deref(), Some("kubeaccess.yaml"));
    }

    #[test]
    fn blank_values_fall_through() {
        let file = parse_config("namespace: '  '\n").unwrap();
        let settings = Settings::merge(&args(&["--namespace", ""]), None, file);
        assert_eq!(settings.namespace, "default");
    }

    #[test]
    fn config_aliases_and_unknown_keys() {
        let file = parse_config("base_url: http://a:1\n").unwrap();
        assert_eq!(file.api_base_url.as_deref(), Some("http://a:1"));
        assert_eq!(parse_config("").unwrap(), ConfigFile::default());
        assert!(parse_config("plugins: []\n").is_err());
    }
}

use markdown_gfm_engine::{
    Extension, ExtensionError, Options, Parser, SyntaxExtension, core_extensions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    UnknownExtension(#[from] ExtensionError),
}

/// One switch per `Options` bit, named after the bit in lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    pub sourcepos: bool,
    pub hardbreaks: bool,
    pub nobreaks: bool,
    #[serde(rename = "unsafe")]
    pub unsafe_html: bool,
    pub validate_utf8: bool,
    pub smart: bool,
    pub github_pre_lang: bool,
    pub liberal_html_tag: bool,
    pub footnotes: bool,
    pub strikethrough_double_tilde: bool,
    pub table_prefer_style_attributes: bool,
    pub full_info_string: bool,
}

impl OptionsConfig {
    fn switches(&self) -> [(bool, Options); 12] {
        [
            (self.sourcepos, Options::SOURCEPOS),
            (self.hardbreaks, Options::HARDBREAKS),
            (self.nobreaks, Options::NOBREAKS),
            (self.unsafe_html, Options::UNSAFE),
            (self.validate_utf8, Options::VALIDATE_UTF8),
            (self.smart, Options::SMART),
            (self.github_pre_lang, Options::GITHUB_PRE_LANG),
            (self.liberal_html_tag, Options::LIBERAL_HTML_TAG),
            (self.footnotes, Options::FOOTNOTES),
            (self.strikethrough_double_tilde, Options::STRIKETHROUGH_DOUBLE_TILDE),
            (self.table_prefer_style_attributes, Options::TABLE_PREFER_STYLE_ATTRIBUTES),
            (self.full_info_string, Options::FULL_INFO_STRING),
        ]
    }
}

/// Parse settings: which extensions to attach, by registry name, and which
/// option bits to set. A missing `extensions` key attaches all five
/// GitHub-flavored extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extensions: Vec<String>,
    pub options: OptionsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: core_extensions()
                .iter()
                .map(|ext| ext.name().to_string())
                .collect(),
            options: OptionsConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-gfm");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn options(&self) -> Options {
        self.options
            .switches()
            .into_iter()
            .filter(|(on, _)| *on)
            .fold(Options::empty(), |acc, (_, bit)| acc | bit)
    }

    /// Looks every configured name up in the extension registry.
    pub fn extensions(&self) -> Result<Vec<Extension>, ConfigError> {
        self.extensions
            .iter()
            .map(|name| Extension::from_name(name).map_err(ConfigError::from))
            .collect()
    }

    /// A streaming parser with the configured options and extensions.
    pub fn parser(&self) -> Result<Parser, ConfigError> {
        Ok(Parser::with_extensions(self.options(), self.extensions()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/markdown-gfm/config.toml"));
    }

    #[test]
    fn test_default_attaches_core_extensions() {
        let config = Config::default();
        assert_eq!(
            config.extensions,
            vec!["table", "strikethrough", "autolink", "tagfilter", "tasklist"]
        );
        assert_eq!(config.options(), Options::empty());
        assert_eq!(config.parser().unwrap().extensions().len(), 5);
    }

    #[test]
    fn test_options_from_toml() {
        let config: Config = toml::from_str(
            r#"
extensions = ["table"]

[options]
smart = true
footnotes = true
unsafe = true
"#,
        )
        .unwrap();

        assert_eq!(config.extensions, vec!["table"]);
        assert_eq!(
            config.options(),
            Options::SMART | Options::FOOTNOTES | Options::UNSAFE
        );
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: Config = toml::from_str("[options]\nsourcepos = true\n").unwrap();
        assert_eq!(config.extensions, Config::default().extensions);
        assert_eq!(config.options(), Options::SOURCEPOS);
    }

    #[test]
    fn test_unknown_extension_fails_parser() {
        let config = Config {
            extensions: vec!["table".to_string(), "mermaid".to_string()],
            options: OptionsConfig::default(),
        };
        let err = config.parser().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownExtension(_)));
        assert_eq!(err.to_string(), "unknown extension: mermaid");
    }

    #[test]
    fn test_parser_uses_config() {
        let config = Config {
            extensions: vec!["strikethrough".to_string()],
            options: OptionsConfig {
                footnotes: true,
                ..OptionsConfig::default()
            },
        };
        let mut parser = config.parser().unwrap();
        assert_eq!(parser.options(), Options::FOOTNOTES);
        parser.feed(b"~~a~~[^1]\n\n[^1]: n\n");
        let dump = parser.finish().dump();
        assert!(dump.contains("strikethrough"), "{dump}");
        assert!(dump.contains("footnote_definition"), "{dump}");
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "extensions = \"table\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        match err {
            ConfigError::ConfigParseError { config_path, .. } => assert_eq!(config_path, config_file),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/dir/config.toml");
        let test_config = Config {
            extensions: vec!["autolink".to_string(), "tasklist".to_string()],
            options: OptionsConfig {
                smart: true,
                table_prefer_style_attributes: true,
                ..OptionsConfig::default()
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}

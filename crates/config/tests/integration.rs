//! Integration tests for config

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;
    use tap_config::constants::*;
    use tap_config::*;
    use tap_errors::{ConfigError, Error};
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[paths]
bin_dir = "/opt/tools/bin"
table = "/etc/tap/notte.toml"

[network]
timeout = 60
retries = 1
user_agent = "tap-test"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.paths.bin_dir, Some(PathBuf::from("/opt/tools/bin")));
        assert_eq!(config.paths.table, Some(PathBuf::from("/etc/tap/notte.toml")));
        assert_eq!(config.network.timeout, 60);
        assert_eq!(config.network.retries, 1);
        assert_eq!(config.network.user_agent.as_deref(), Some("tap-test"));
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = Config::load_or_default(Some(&missing)).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_toml_is_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[network\ntimeout = ").unwrap();
        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_merge_vars() {
        let vars: HashMap<&str, &str> = [
            (ENV_BIN_DIR, "/tmp/bin"),
            (ENV_TABLE, "/tmp/table.toml"),
            (ENV_TIMEOUT, "15"),
            (ENV_RETRIES, "4"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .merge_vars(|key| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.bin_dir().unwrap(), PathBuf::from("/tmp/bin"));
        assert_eq!(config.paths.table, Some(PathBuf::from("/tmp/table.toml")));
        assert_eq!(config.network.timeout, 15);
        assert_eq!(config.network.retries, 4);
    }

    #[test]
    fn test_merge_vars_rejects_bad_numbers() {
        let mut config = Config::default();
        let err = config
            .merge_vars(|key| (key == ENV_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref field, .. }) if field == ENV_TIMEOUT
        ));
    }
}

//! 配置文件加载的集成测试

mod common;

#[cfg(test)]
mod config_tests {
    use super::common::create_test_log;
    use accesslog_import::config::{Config, DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_INTERVAL};
    use accesslog_import::importer::ImportOptions;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.import.db_path, "accesslog.db");
        assert_eq!(config.import.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.import.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(config.log.level, "info");
        assert!(!config.log.enable_stdout);
        assert_eq!(ImportOptions::from(&config.import), ImportOptions::default());
    }

    #[test]
    fn test_load_full_config_file() {
        let dir = TempDir::new().unwrap();
        let path = create_test_log(
            &dir,
            "accesslog.toml",
            r#"
[log]
enable_stdout = true
log_dir = "var/log"
level = "debug"

[import]
db_path = "data/site.db"
batch_size = 500
progress_interval = 1000
"#,
        );

        let config = Config::from_file(&path).unwrap();
        assert!(config.log.enable_stdout);
        assert_eq!(config.log.log_dir, "var/log");
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.import.db_path, "data/site.db");

        let options = ImportOptions::from(&config.import);
        assert_eq!(options.batch_size, 500);
        assert_eq!(options.progress_interval, 1000);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.import.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.log.log_dir, "logs");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.toml");

        let mut config = Config::default();
        config.import.batch_size = 42;
        config.log.level = "warn".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.import.batch_size, 42);
        assert_eq!(loaded.log.level, "warn");
    }

    #[test]
    fn test_invalid_values_rejected() {
        for content in [
            "[import]\nbatch_size = 0\n",
            "[import]\nprogress_interval = 0\n",
            "[import]\ndb_path = \"  \"\n",
            "[log]\nlevel = \"verbose\"\n",
        ] {
            let err = Config::from_str(content).unwrap_err();
            assert!(err.is_config_error(), "{content}");
        }
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = Config::from_str("[import\nbatch_size = ").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.is_io_error());
    }
}

use crate::{AppConfig, RecordStoreBackend, RecordStoreConfig};
use figment::Jail;
use secrecy::{ExposeSecret, Secret};

#[test]
fn test_secret_redaction() {
    let secret = Secret::new("sk_live_record_store".to_string());
    let debug_output = format!("{:?}", secret);
    assert!(debug_output.contains("Secret([REDACTED"));
    assert!(!debug_output.contains("sk_live_record_store"));
}

#[test]
fn test_config_struct_redaction() {
    let config = RecordStoreConfig {
        backend: RecordStoreBackend::Http,
        base_url: "https://records.example.ma".to_string(),
        project_id: "hse".to_string(),
        api_key: Secret::new("super-secret-key".to_string()),
        timeout_secs: 30,
    };
    let debug_output = format!("{:?}", config);
    assert!(!debug_output.contains("super-secret-key"));
    assert!(debug_output.contains("Secret([REDACTED"));
}

#[test]
fn test_load_defaults_and_env_overrides() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file(
            "config/default.toml",
            r#"
            app_name = "hse-compliance"

            [record_store]
            backend = "memory"

            [locale]
            default_language = "fr"
            "#,
        )?;
        jail.set_env("APP_ENV", "development");
        jail.set_env("HSE_WORKFLOW__DEFAULT_REQUIRED_APPROVALS", "2");
        jail.set_env("HSE_TELEMETRY__LOG_LEVEL", "debug");

        let config = AppConfig::load("config").expect("config loads");
        assert_eq!(config.app_name, "hse-compliance");
        assert!(config.is_development());
        assert_eq!(config.record_store.backend, RecordStoreBackend::Memory);
        assert_eq!(config.record_store.timeout_secs, 30);
        assert_eq!(config.workflow.default_required_approvals, 2);
        assert!(config.workflow.seed_defaults);
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.locale.default_language, "fr");
        Ok(())
    });
}

#[test]
fn test_environment_file_overrides_default() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file("config/default.toml", r#"app_name = "hse-compliance""#)?;
        jail.create_file(
            "config/production.toml",
            r#"
            [record_store]
            backend = "http"
            base_url = "https://records.example.ma/api"
            project_id = "hse-prod"

            [telemetry]
            json = true
            "#,
        )?;
        jail.set_env("APP_ENV", "production");
        jail.set_env("HSE_RECORD_STORE__API_KEY", "prod-key");

        let config = AppConfig::load("config").expect("config loads");
        assert!(config.is_production());
        assert_eq!(config.record_store.backend, RecordStoreBackend::Http);
        assert_eq!(config.record_store.project_id, "hse-prod");
        assert_eq!(config.record_store.api_key.expose_secret(), "prod-key");
        assert!(config.telemetry.json);
        Ok(())
    });
}

#[test]
fn test_http_backend_requires_base_url() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file(
            "config/default.toml",
            r#"
            [record_store]
            backend = "http"
            "#,
        )?;
        jail.set_env("APP_ENV", "test");

        let err = AppConfig::load("config").expect_err("missing base_url rejected");
        assert!(err.to_string().contains("base_url"));
        Ok(())
    });
}

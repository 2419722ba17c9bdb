pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod schedule;
pub mod storage;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::config::AppConfig;
    use super::domain::Scenario;
    use super::error::AppError;
    use super::normalize::BatchParseMode;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("BATCH_MALFORMED", "no array").with_details("file=x.json");
        assert_eq!(err.code, "BATCH_MALFORMED");
        assert!(err.is_malformed_batch());
        assert_eq!(err.to_string(), "[BATCH_MALFORMED] no array");
        assert_eq!(format!("{err:#}"), "[BATCH_MALFORMED] no array (file=x.json)");
        assert!(!AppError::new("GEN_BACKEND_FAILED", "x").is_malformed_batch());
    }

    #[test]
    fn scenario_parses_aliases_and_rejects_unknown() {
        assert_eq!("Major".parse::<Scenario>().unwrap(), Scenario::Major);
        assert_eq!("well-understood".parse::<Scenario>().unwrap(), Scenario::WellUnderstood);
        assert_eq!("well".parse::<Scenario>().unwrap().as_str(), "well");
        assert_eq!("huge".parse::<Scenario>().unwrap_err().code, "SCENARIO_INVALID");
    }

    #[test]
    fn config_defaults_when_env_is_empty() {
        let cfg = AppConfig::from_lookup(|_| None).expect("defaults");
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.generation.max_attempts, 3);
        assert_eq!(cfg.dispatch.endpoint, "https://events.pagerduty.com/v2/enqueue");
        assert_eq!(cfg.batch_parse_mode, BatchParseMode::Lenient);
    }

    #[test]
    fn config_reads_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("IDG_STORAGE_ROOT", "/tmp/demo"),
            ("OPENAI_BASE_URL", "http://127.0.0.1:8080/v1/"),
            ("IDG_GENERATION_TIMEOUT_SECS", "5"),
            ("IDG_BATCH_PARSE_MODE", "strict"),
            ("PAGERDUTY_ROUTING_KEY", "R0UT1NG"),
        ]);
        let cfg = AppConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).expect("cfg");
        assert_eq!(cfg.storage.root.to_str(), Some("/tmp/demo"));
        assert_eq!(cfg.generation.base_url, "http://127.0.0.1:8080/v1");
        assert_eq!(cfg.generation.timeout, Duration::from_secs(5));
        assert_eq!(cfg.batch_parse_mode, BatchParseMode::Strict);
        assert_eq!(cfg.dispatch.routing_key.as_deref(), Some("R0UT1NG"));
    }

    #[test]
    fn config_rejects_bad_numbers() {
        let err = AppConfig::from_lookup(|k| {
            (k == "IDG_DISPATCH_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .expect_err("invalid");
        assert_eq!(err.code, "CONFIG_INVALID");
        assert!(err.message.contains("IDG_DISPATCH_TIMEOUT_SECS"));

        let err = AppConfig::from_lookup(|k| {
            (k == "IDG_GENERATION_MAX_ATTEMPTS").then(|| "0".to_string())
        })
        .expect_err("zero attempts");
        assert_eq!(err.code, "CONFIG_INVALID");
    }
}

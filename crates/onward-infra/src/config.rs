//! Global configuration loader for Onward.
//!
//! Reads `config.toml` from the data directory (`~/.onward/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::Path;

use onward_types::config::GlobalConfig;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
///
/// Validation is left to the caller so that CLI overrides can be applied first.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Load the soft guidance text injected as `<guidance>`.
///
/// A missing or unreadable file yields empty guidance.
pub async fn load_policy_text(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text.trim().to_string(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No guidance file at {}", path.display());
            String::new()
        }
        Err(err) => {
            tracing::warn!("Failed to read guidance {}: {err}", path.display());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onward_types::config::StoreKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.memory.store, StoreKind::InMemory);
        assert_eq!(config.memory.k, 5);
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[memory]
store = "json"
max_items = 50

[fast_answer]
threshold = 0.9
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.memory.store, StoreKind::Json);
        assert_eq!(config.memory.max_items, Some(50));
        assert!((config.fast_answer.threshold - 0.9).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.memory.store, StoreKind::InMemory);
    }

    #[tokio::test]
    async fn load_policy_text_trims_and_tolerates_missing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("policy.md");
        assert_eq!(load_policy_text(&path).await, "");

        tokio::fs::write(&path, "\n- Offer a phone number.\n\n").await.unwrap();
        assert_eq!(load_policy_text(&path).await, "- Offer a phone number.");
    }
}

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, SnapError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// V4L2 device nodes per facing mode.
    pub rear_device: String,
    pub front_device: String,
    pub input_format: String,
    /// When set, rendered captures are also persisted here as PNG.
    pub capture_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoasnapConfig {
    pub camera: CameraConfig,
    pub api: ApiConfig,
    pub ops: OpsConfig,
}

impl MoasnapConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            SnapError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            SnapError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera.rear_device.trim().is_empty() {
            return Err(SnapError::Configuration(
                "camera.rear_device must not be empty".into(),
            ));
        }
        if self.camera.front_device.trim().is_empty() {
            return Err(SnapError::Configuration(
                "camera.front_device must not be empty".into(),
            ));
        }
        if self.camera.input_format.trim().is_empty() {
            return Err(SnapError::Configuration(
                "camera.input_format must not be empty".into(),
            ));
        }
        if !self.api.base_url.starts_with("http") {
            return Err(SnapError::Configuration(
                "api.base_url must be an http(s) URL".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_config() -> MoasnapConfig {
        MoasnapConfig {
            camera: CameraConfig {
                rear_device: "/dev/video0".into(),
                front_device: "/dev/video1".into(),
                input_format: "mjpeg".into(),
                capture_dir: Some("captures".into()),
            },
            api: ApiConfig {
                base_url: "https://api.moasnap.example".into(),
                auth_token: Some("token".into()),
            },
            ops: OpsConfig {
                log_level: "debug".into(),
            },
        }
    }

    #[test]
    fn load_moasnap_config_from_file() {
        let temp_path = std::env::temp_dir().join("moasnap-config-test.toml");
        let config = sample_config();

        let doc = toml::to_string(&config).expect("serialize config");
        fs::write(&temp_path, doc).expect("write temp config");

        let loaded = MoasnapConfig::from_file(&temp_path).expect("load config");
        assert_eq!(loaded.camera.rear_device, config.camera.rear_device);
        assert_eq!(loaded.api.base_url, config.api.base_url);
        assert_eq!(loaded.camera.capture_dir, config.camera.capture_dir);
        fs::remove_file(&temp_path).expect("cleanup temp config");
    }

    #[test]
    fn validate_configuration_rules() {
        let mut config = sample_config();
        assert!(config.validate().is_ok());

        config.camera.rear_device = " ".into();
        assert!(config.validate().is_err());
        config.camera.rear_device = "/dev/video0".into();

        config.camera.input_format = String::new();
        assert!(config.validate().is_err());
        config.camera.input_format = "mjpeg".into();

        config.api.base_url = "ftp://nope".into();
        assert!(config.validate().is_err());
        config.api.base_url = "http://localhost:8080".into();
        assert!(config.validate().is_ok());
    }
}

use crate::config::error::ConfigError;
use serde::Deserialize;

pub const DEFAULT_REGION: &str = "us-west-2";

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

///  ---------------- Object storage sources ----------------
///
/// Locations the stage loader copies from, plus the role the warehouse
/// assumes to read them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ObjectStorageSources {
    /// Event log prefix, e.g. `s3://udacity-dend/log_data`.
    pub log_data: String,
    /// JSONPaths file mapping event log fields to staging columns.
    pub log_jsonpath: String,
    /// Song catalog prefix.
    pub song_data: String,
    /// IAM role ARN handed to COPY as `aws_iam_role`.
    pub iam_role: String,
    #[serde(default = "default_region")]
    pub region: String,
}

impl ObjectStorageSources {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("sources.log_data", &self.log_data),
            ("sources.log_jsonpath", &self.log_jsonpath),
            ("sources.song_data", &self.song_data),
            ("sources.iam_role", &self.iam_role),
            ("sources.region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid_value(field, "must not be empty"));
            }
        }
        if !self.iam_role.starts_with("arn:") {
            return Err(ConfigError::invalid_value(
                "sources.iam_role",
                format!("must be an IAM role ARN, got '{}'", self.iam_role),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> ObjectStorageSources {
        ObjectStorageSources {
            log_data: "s3://udacity-dend/log_data".into(),
            log_jsonpath: "s3://udacity-dend/log_json_path.json".into(),
            song_data: "s3://udacity-dend/song_data".into(),
            iam_role: "arn:aws:iam::123456789012:role/dwhRole".into(),
            region: default_region(),
        }
    }

    #[test]
    fn region_defaults_to_us_west_2() {
        let yaml = r#"
log_data: s3://bucket/log_data
log_jsonpath: s3://bucket/log_json_path.json
song_data: s3://bucket/song_data
iam_role: arn:aws:iam::1:role/r
"#;
        let parsed: ObjectStorageSources = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.region, "us-west-2");
    }

    #[test]
    fn validate_rejects_blank_and_non_arn_values() {
        assert!(sources().validate().is_ok());

        let mut blank = sources();
        blank.song_data = "  ".into();
        assert!(matches!(
            blank.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut bad_role = sources();
        bad_role.iam_role = "dwhRole".into();
        assert!(bad_role.validate().is_err());
    }
}

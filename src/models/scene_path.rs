use crate::error::{FlapiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location of a scene (or job) in the database: `host:job[:folder/scene]`.
/// The scene part may itself contain `:` separated folder components, so it
/// is kept as one string and must round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePath {
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(rename = "Job")]
    pub job: String,
    #[serde(rename = "Scene", skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

impl ScenePath {
    pub fn new(host: impl Into<String>, job: impl Into<String>) -> Self {
        ScenePath {
            host: host.into(),
            job: job.into(),
            scene: None,
        }
    }

    pub fn with_scene(
        host: impl Into<String>,
        job: impl Into<String>,
        scene: impl Into<String>,
    ) -> Self {
        ScenePath {
            host: host.into(),
            job: job.into(),
            scene: Some(scene.into()),
        }
    }

    /// Parse a delimited path string. Host and job are mandatory; anything
    /// after the second `:` is the scene part, verbatim.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parts = input.splitn(3, ':');
        let host = parts.next().unwrap_or("");
        let job = parts.next().unwrap_or("");
        if host.is_empty() || job.is_empty() {
            return Err(FlapiError::InvalidOptions(format!(
                "scene path {:?} must be host:job or host:job:scene",
                input
            )));
        }
        let scene = parts.next().filter(|s| !s.is_empty()).map(str::to_owned);
        Ok(ScenePath {
            host: host.to_owned(),
            job: job.to_owned(),
            scene,
        })
    }
}

impl FromStr for ScenePath {
    type Err = FlapiError;

    fn from_str(s: &str) -> Result<Self> {
        ScenePath::parse(s)
    }
}

impl fmt::Display for ScenePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.scene {
            Some(scene) => write!(f, "{}:{}:{}", self.host, self.job, scene),
            None => write!(f, "{}:{}", self.host, self.job),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_and_job_only() {
        let path = ScenePath::parse("kodiak:flapi").unwrap();
        assert_eq!(path.host, "kodiak");
        assert_eq!(path.job, "flapi");
        assert_eq!(path.scene, None);
        assert_eq!(path.to_string(), "kodiak:flapi");
    }

    #[test]
    fn scene_part_keeps_its_delimiters() {
        let original = "kodiak:flapi:dailies/day_01:reel:02";
        let path = ScenePath::parse(original).unwrap();
        assert_eq!(path.scene.as_deref(), Some("dailies/day_01:reel:02"));
        assert_eq!(path.to_string(), original);
    }

    #[test]
    fn missing_job_is_rejected() {
        assert!(matches!(
            ScenePath::parse("kodiak"),
            Err(FlapiError::InvalidOptions(_))
        ));
        assert!(matches!(
            ScenePath::parse("kodiak:"),
            Err(FlapiError::InvalidOptions(_))
        ));
        assert!(matches!(
            ScenePath::parse(":flapi"),
            Err(FlapiError::InvalidOptions(_))
        ));
    }

    #[test]
    fn trailing_delimiter_means_no_scene() {
        let path = ScenePath::parse("kodiak:flapi:").unwrap();
        assert_eq!(path.scene, None);
    }
}

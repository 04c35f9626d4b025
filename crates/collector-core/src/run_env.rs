//! CI detection for the run environment descriptor.
//!
//! The descriptor tells the analytics backend which build a batch of uploads
//! belongs to. Detection looks at well-known CI variables in a fixed order:
//! Buildkite, GitHub Actions, CircleCI, then any environment that sets `CI`.

use std::collections::HashMap;

use collector_proto::RunEnvironment;
use serde::Serialize;
use uuid::Uuid;

/// Name reported in the `collector` field of every descriptor.
pub const COLLECTOR_NAME: &str = "rust-buildkite-test-collector";

/// The CI/build context a suite ran under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunEnv {
    #[serde(rename = "CI")]
    pub ci: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub collector: &'static str,
    pub version: &'static str,
}

impl RunEnv {
    fn detected(ci: &str, key: String) -> Self {
        Self {
            ci: ci.to_string(),
            key,
            url: None,
            branch: None,
            commit_sha: None,
            number: None,
            job_id: None,
            message: None,
            collector: COLLECTOR_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// A descriptor for an unidentified CI system, keyed by a fresh UUID.
    pub fn generic() -> Self {
        Self::detected("generic", Uuid::new_v4().to_string())
    }
}

impl RunEnvironment for RunEnv {
    fn as_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Detects a [`RunEnv`] from a set of environment variables.
#[derive(Debug, Clone, Default)]
pub struct RunEnvBuilder {
    vars: HashMap<String, String>,
}

impl RunEnvBuilder {
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Reads the current process environment.
    pub fn from_env() -> Self {
        Self::new(std::env::vars())
    }

    /// Returns the first matching CI descriptor, or `None` when the
    /// environment does not look like CI at all.
    pub fn build(&self) -> Option<RunEnv> {
        self.buildkite()
            .or_else(|| self.github_actions())
            .or_else(|| self.circle_ci())
            .or_else(|| self.generic())
    }

    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn buildkite(&self) -> Option<RunEnv> {
        let build_id = self.get("BUILDKITE_BUILD_ID")?;

        Some(RunEnv {
            url: self.get("BUILDKITE_BUILD_URL"),
            branch: self.get("BUILDKITE_BRANCH"),
            commit_sha: self.get("BUILDKITE_COMMIT"),
            number: self.get("BUILDKITE_BUILD_NUMBER"),
            job_id: self.get("BUILDKITE_JOB_ID"),
            message: self.get("BUILDKITE_MESSAGE"),
            ..RunEnv::detected("buildkite", build_id)
        })
    }

    fn github_actions(&self) -> Option<RunEnv> {
        let action = self.get("GITHUB_ACTION")?;
        let run_number = self.get("GITHUB_RUN_NUMBER")?;
        let run_attempt = self.get("GITHUB_RUN_ATTEMPT")?;

        let repository = self.get("GITHUB_REPOSITORY").unwrap_or_default();
        let run_id = self.get("GITHUB_RUN_ID").unwrap_or_default();

        Some(RunEnv {
            url: Some(format!(
                "https://github.com/{}/actions/runs/{}",
                repository, run_id
            )),
            branch: self.get("GITHUB_REF_NAME"),
            commit_sha: self.get("GITHUB_SHA"),
            number: Some(run_number.clone()),
            ..RunEnv::detected(
                "github_actions",
                format!("{}-{}-{}", action, run_number, run_attempt),
            )
        })
    }

    fn circle_ci(&self) -> Option<RunEnv> {
        let build_num = self.get("CIRCLE_BUILD_NUM")?;
        let workflow_id = self.get("CIRCLE_WORKFLOW_ID")?;

        Some(RunEnv {
            url: self.get("CIRCLE_BUILD_URL"),
            branch: self.get("CIRCLE_BRANCH"),
            commit_sha: self.get("CIRCLE_SHA1"),
            number: Some(build_num.clone()),
            ..RunEnv::detected("circleci", format!("{}-{}", workflow_id, build_num))
        })
    }

    fn generic(&self) -> Option<RunEnv> {
        self.get("CI").map(|_| RunEnv::generic())
    }
}

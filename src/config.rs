use crate::github::Repository;
use secrecy::SecretString;
use std::env;
use std::fmt;
use std::fs;

/// Resolved run parameters, read once at startup and never mutated.
#[derive(Debug)]
pub struct Config {
    pub repository: Repository,
    /// Requests go out unauthenticated (and rate-limited) without it.
    pub github_token: Option<SecretString>,
    /// Simulate-only mode: no issue is closed or created, chat posts still go out.
    pub dry_run: bool,
    /// Filters the issues to recap and labels the newly opened one.
    pub issue_label: Option<String>,
    pub assign_user: Option<String>,
    /// Contents of the issue template file, empty if unset or unreadable.
    pub issue_template: String,
    pub topic_id: String,
    pub typetalk_token: SecretString,
    /// Signed day offset applied to the new issue's title date.
    pub target_day_offset: i64,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigurationError> {
        Self::load(&|name| env::var(name).ok())
    }

    fn load(var: &dyn Fn(&str) -> Option<String>) -> Result<Config, ConfigurationError> {
        // An empty value behaves like an unset one.
        let var = |name: &str| var(name).filter(|value| !value.is_empty());

        let repository = var("REPOSITORY").ok_or(ConfigurationError::Missing("REPOSITORY"))?;
        let repository = repository
            .parse()
            .map_err(|_| ConfigurationError::BadRepository(repository))?;
        let topic_id =
            var("TYPETALK_TOPIC_ID").ok_or(ConfigurationError::Missing("TYPETALK_TOPIC_ID"))?;
        let typetalk_token = var("TYPETALK_TOKEN")
            .ok_or(ConfigurationError::Missing("TYPETALK_TOKEN"))?
            .into();

        Ok(Config {
            repository,
            github_token: var("GH_TOKEN").map(Into::into),
            dry_run: var("DRY_RUN").as_deref() == Some("true"),
            issue_label: var("ISSUE_LABEL"),
            assign_user: var("ASSIGN_USER"),
            issue_template: var("ISSUE_TEMPLATE")
                .map(|path| fs::read_to_string(path).unwrap_or_default())
                .unwrap_or_default(),
            topic_id,
            typetalk_token,
            target_day_offset: var("TARGET_DAY_OFFSET")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0),
        })
    }
}

#[derive(Debug)]
pub enum ConfigurationError {
    Missing(&'static str),
    BadRepository(String),
}

impl std::error::Error for ConfigurationError {}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigurationError::Missing(name) => {
                write!(f, "{} environment variable is not set.", name)
            }
            ConfigurationError::BadRepository(value) => {
                write!(f, "REPOSITORY must look like `owner/name`, got `{}`.", value)
            }
        }
    }
}

//! Helper utilities for resolving the comment [`Author`] from explicit
//! parameters, configuration or environment variables.

use std::env;

use whisperrflow_core::{Author, UserId};

use crate::config::AuthorConfig;

/// Environment variable checked first for the author id.
pub const ENV_AUTHOR_ID: &str = "WHISPERRFLOW_AUTHOR_ID";
/// Environment variable checked first for the author name.
pub const ENV_AUTHOR_NAME: &str = "WHISPERRFLOW_AUTHOR_NAME";
/// Author id used when nothing else resolves.
pub const DEFAULT_AUTHOR_ID: &str = "user-1";
/// Display name used when nothing else resolves.
pub const DEFAULT_AUTHOR_NAME: &str = "You";

const USER_NAME_ENV: &str = "USER";

/// Resolve an author in order: explicit parameters, `[author]` config,
/// environment, defaults. Each field falls back independently.
pub fn resolve_author(id: Option<&str>, name: Option<&str>, config: &AuthorConfig) -> Author {
    let mut fetch = |key: &'static str| env::var(key).ok();
    resolve_author_with(id, name, config, &mut fetch)
}

fn resolve_author_with(
    id: Option<&str>,
    name: Option<&str>,
    config: &AuthorConfig,
    fetch: &mut impl FnMut(&'static str) -> Option<String>,
) -> Author {
    let id = non_blank(id)
        .or_else(|| non_blank(config.id.as_deref()))
        .or_else(|| env_value_with(&[ENV_AUTHOR_ID], fetch))
        .unwrap_or_else(|| DEFAULT_AUTHOR_ID.to_owned());
    let name = non_blank(name)
        .or_else(|| non_blank(config.name.as_deref()))
        .or_else(|| env_value_with(&[ENV_AUTHOR_NAME, USER_NAME_ENV], fetch))
        .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_owned());
    Author {
        id: author_id(&id),
        name,
    }
}

fn author_id(raw: &str) -> UserId {
    // Callers only pass non-blank values.
    raw.parse().unwrap_or_else(|_| UserId::new())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn env_value_with(
    candidates: &[&'static str],
    fetch: &mut impl FnMut(&'static str) -> Option<String>,
) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| fetch(key).and_then(|value| non_blank(Some(&value))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_name_variable_beats_login_name() {
        let mut fetch = |key: &'static str| match key {
            ENV_AUTHOR_ID => Some(" user-7 ".into()),
            ENV_AUTHOR_NAME => Some("Env Name".into()),
            USER_NAME_ENV => Some("login".into()),
            _ => None,
        };
        let author = resolve_author_with(None, None, &AuthorConfig::default(), &mut fetch);
        assert_eq!(author.id.as_str(), "user-7");
        assert_eq!(author.name, "Env Name");
    }

    #[test]
    fn empty_sources_fall_back_to_defaults() {
        let mut fetch = |_: &'static str| None;
        let author = resolve_author_with(None, None, &AuthorConfig::default(), &mut fetch);
        assert_eq!(author.id.as_str(), DEFAULT_AUTHOR_ID);
        assert_eq!(author.name, DEFAULT_AUTHOR_NAME);
    }

    #[test]
    fn params_beat_config_which_beats_env() {
        let config = AuthorConfig {
            id: Some("user-config".into()),
            name: Some("Config Name".into()),
        };
        let mut fetch = |key: &'static str| match key {
            ENV_AUTHOR_ID => Some("user-env".into()),
            USER_NAME_ENV => Some("login".into()),
            _ => None,
        };

        let author = resolve_author_with(Some("user-cli"), None, &config, &mut fetch);
        assert_eq!(author.id.as_str(), "user-cli");
        assert_eq!(author.name, "Config Name");

        let author = resolve_author_with(None, Some("  "), &AuthorConfig::default(), &mut fetch);
        assert_eq!(author.id.as_str(), "user-env");
        assert_eq!(author.name, "login");
    }
}

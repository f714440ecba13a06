//! Normalization of user-supplied repository references.
//!
//! Accepted forms, tried in order:
//! - SSH-style Git URLs: `git@github.com:owner/name.git`, `ssh://git@github.com/owner/name`
//! - HTTP(S) URLs: `https://github.com/owner/name.git`
//! - bare paths: `name` (default owner) or `owner/name`

use crate::types::GitUrl;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The only source-hosting domain URL references may point at.
pub const REPOSITORY_HOST: &str = "github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRepositoryName {
    pub owner: String,
    pub explicit_owner: bool,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedRepository {
    pub name: String,
    pub owner: String,
    pub explicit_owner: bool,
    pub git_url: GitUrl,
    pub git_http_url: GitUrl,
    #[serde(default)]
    pub languages_used: Vec<String>,
}

impl ResolvedRepository {
    pub fn resolve(reference: &str, default_owner: &str) -> Result<Self, SchemaError> {
        let parsed = parse_repository_name(reference, default_owner)?;
        Ok(Self {
            git_url: build_git_url(&parsed.owner, &parsed.name),
            git_http_url: build_git_http_url(&parsed.owner, &parsed.name),
            name: parsed.name,
            owner: parsed.owner,
            explicit_owner: parsed.explicit_owner,
            languages_used: Vec::new(),
        })
    }
}

pub fn build_git_http_url(owner: &str, name: &str) -> GitUrl {
    GitUrl::new(format!(
        "https://{REPOSITORY_HOST}/{}/{}.git",
        escape_path_segment(owner),
        escape_path_segment(name)
    ))
}

pub fn build_git_url(owner: &str, name: &str) -> GitUrl {
    GitUrl::new(format!(
        "git@{REPOSITORY_HOST}:{}/{}.git",
        escape_path_segment(owner),
        escape_path_segment(name)
    ))
}

pub fn parse_repository_name(
    reference: &str,
    default_owner: &str,
) -> Result<ParsedRepositoryName, SchemaError> {
    let invalid = || SchemaError::InvalidRepository(reference.to_owned());

    let Some((host, path)) = split_url(reference) else {
        return parse_bare_path(reference, default_owner).ok_or_else(invalid);
    };

    if !host.eq_ignore_ascii_case(REPOSITORY_HOST) {
        return Err(invalid());
    }

    let mut components = path.trim_start_matches('/').split('/');
    let owner = components.next().unwrap_or_default();
    let name = components
        .next()
        .map(|n| n.strip_suffix(".git").unwrap_or(n))
        .unwrap_or_default();

    if owner.is_empty() || name.is_empty() {
        return Err(invalid());
    }

    Ok(ParsedRepositoryName {
        owner: owner.to_owned(),
        explicit_owner: true,
        name: name.to_owned(),
    })
}

fn parse_bare_path(reference: &str, default_owner: &str) -> Option<ParsedRepositoryName> {
    let parts: Vec<&str> = reference.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    match parts.as_slice() {
        [name] => Some(ParsedRepositoryName {
            owner: default_owner.to_owned(),
            explicit_owner: false,
            name: (*name).to_owned(),
        }),
        [owner, name] => Some(ParsedRepositoryName {
            owner: (*owner).to_owned(),
            explicit_owner: true,
            name: (*name).to_owned(),
        }),
        _ => None,
    }
}

/// Split a URL-shaped reference into `(host, path)`.
///
/// Returns `None` when the reference carries no host, in which case it is
/// treated as a bare path.
fn split_url(reference: &str) -> Option<(&str, &str)> {
    if let Some((_scheme, rest)) = reference.split_once("://") {
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let host = host_port.split(':').next().unwrap_or_default();
        return (!host.is_empty()).then_some((host, path));
    }

    split_scp_like(reference)
}

/// `[user@]host:[port/]path`, the scp-style syntax accepted by git.
fn split_scp_like(reference: &str) -> Option<(&str, &str)> {
    let (authority, path) = reference.split_once(':')?;
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

    if host.is_empty() || host.contains(['/', ' ', '\t']) {
        return None;
    }

    let path = match path.split_once('/') {
        Some((port, rest))
            if !port.is_empty() && port.len() <= 5 && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => path,
    };

    if path.is_empty() || path.starts_with('\\') {
        return None;
    }

    Some((host, path))
}

fn escape_path_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for b in segment.bytes() {
        let keep = b.is_ascii_alphanumeric()
            || matches!(b, b'-' | b'_' | b'.' | b'~' | b'$' | b'&' | b'+' | b'=' | b':' | b'@');
        if keep {
            escaped.push(char::from(b));
        } else {
            let _ = write!(escaped, "%{b:02X}");
        }
    }
    escaped
}

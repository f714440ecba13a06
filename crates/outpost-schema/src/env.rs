use crate::repository::ResolvedRepository;
use crate::types::EnvId;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Login user provisioned inside every environment.
pub const ENV_ROOT_USER: &str = "outpost";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvStatus {
    Creating,
    Created,
    Removing,
}

impl std::fmt::Display for EnvStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvStatus::Creating => write!(f, "creating"),
            EnvStatus::Created => write!(f, "created"),
            EnvStatus::Removing => write!(f, "removing"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshHostKey {
    pub algorithm: String,
    pub fingerprint: String,
}

/// A per-repository sandbox.
///
/// `infrastructure_json` and `additional_properties_json` are opaque to the
/// orchestration layer; their meaning is owned by the backend that wrote them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Env {
    pub id: EnvId,
    pub name: String,
    #[serde(default)]
    pub infrastructure_json: String,
    pub instance_type: String,
    #[serde(default)]
    pub instance_public_ip_address: String,
    #[serde(default)]
    pub ssh_host_keys: Vec<SshHostKey>,
    #[serde(default)]
    pub ssh_key_pair_pem_content: String,
    pub resolved_repository: ResolvedRepository,
    #[serde(default)]
    pub opened_ports: BTreeSet<u16>,
    pub status: EnvStatus,
    #[serde(default)]
    pub additional_properties_json: String,
    pub created_at_timestamp: i64,
}

impl Env {
    pub fn new(
        name: impl Into<String>,
        instance_type: impl Into<String>,
        resolved_repository: ResolvedRepository,
    ) -> Self {
        Self {
            id: EnvId::generate(),
            name: name.into(),
            infrastructure_json: String::new(),
            instance_type: instance_type.into(),
            instance_public_ip_address: String::new(),
            ssh_host_keys: Vec::new(),
            ssh_key_pair_pem_content: String::new(),
            resolved_repository,
            opened_ports: BTreeSet::new(),
            status: EnvStatus::Creating,
            additional_properties_json: String::new(),
            created_at_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn name_slug(&self) -> String {
        build_env_name_slug(&self.name)
    }

    pub fn ssh_key_pair_name(&self) -> String {
        format!("outpost-{}-key-pair", self.name_slug())
    }

    pub fn is_port_opened(&self, port: u16) -> bool {
        self.opened_ports.contains(&port)
    }

    pub fn set_infrastructure_json(
        &mut self,
        infrastructure: &impl Serialize,
    ) -> Result<(), SchemaError> {
        self.infrastructure_json = serde_json::to_string(infrastructure)?;
        Ok(())
    }

    pub fn set_additional_properties_json(
        &mut self,
        additional_properties: &impl Serialize,
    ) -> Result<(), SchemaError> {
        self.additional_properties_json = serde_json::to_string(additional_properties)?;
        Ok(())
    }
}

/// Derive a provider-safe identifier from an environment name.
///
/// Lowercases ASCII, collapses every run of other characters into a single
/// `-`, and trims dashes at both ends: `"Octo/Hello_World"` -> `"octo-hello-world"`.
pub fn build_env_name_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

pub fn build_env_name_from_repository(repository: &ResolvedRepository) -> String {
    format!("{}/{}", repository.owner, repository.name)
}

/// Parse `ssh-keyscan`-style host keys, one `algorithm fingerprint comment`
/// triple per line. Any malformed line fails the whole parse.
pub fn parse_ssh_host_keys(content: &str) -> Result<Vec<SshHostKey>, SchemaError> {
    content
        .trim()
        .split('\n')
        .map(|line| {
            let fields: Vec<&str> = line.trim().split(' ').collect();

            // eg: (ssh-rsa) (AAAAB3NzaC1yc===) (root@ip-10-0-0-200)
            match fields.as_slice() {
                [algorithm, fingerprint, _comment] => Ok(SshHostKey {
                    algorithm: (*algorithm).to_owned(),
                    fingerprint: (*fingerprint).to_owned(),
                }),
                _ => Err(SchemaError::InvalidHostKey(line.to_owned())),
            }
        })
        .collect()
}

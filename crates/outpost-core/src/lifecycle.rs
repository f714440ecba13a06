use crate::CoreError;
use outpost_schema::{ClusterStatus, Env, EnvStatus};

pub fn validate_env_transition(
    env_name: &str,
    from: EnvStatus,
    to: EnvStatus,
) -> Result<(), CoreError> {
    let valid = matches!(
        (from, to),
        (EnvStatus::Creating, EnvStatus::Creating | EnvStatus::Created)
            | (EnvStatus::Created, EnvStatus::Created)
            | (
                EnvStatus::Creating | EnvStatus::Created | EnvStatus::Removing,
                EnvStatus::Removing
            )
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::EnvTransition {
            env_name: env_name.to_owned(),
            from,
            to,
        })
    }
}

pub fn validate_cluster_transition(
    cluster: &str,
    from: ClusterStatus,
    to: ClusterStatus,
) -> Result<(), CoreError> {
    let valid = matches!(
        (from, to),
        (ClusterStatus::Creating, ClusterStatus::Creating | ClusterStatus::Created)
            | (ClusterStatus::Created, ClusterStatus::Created)
            | (
                ClusterStatus::Creating | ClusterStatus::Created | ClusterStatus::Removing,
                ClusterStatus::Removing
            )
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::ClusterTransition {
            cluster: cluster.to_owned(),
            from,
            to,
        })
    }
}

/// Port and edit operations only act on a steady-state environment.
pub fn ensure_env_ready(action: &'static str, env: &Env) -> Result<(), CoreError> {
    match env.status {
        EnvStatus::Created => Ok(()),
        status @ (EnvStatus::Creating | EnvStatus::Removing) => Err(CoreError::InvalidTransition {
            action,
            env_name: env.name.clone(),
            status,
        }),
    }
}

pub fn ensure_env_initializable(env: &Env) -> Result<(), CoreError> {
    if env.status == EnvStatus::Removing {
        return Err(CoreError::InvalidTransition {
            action: "initialize",
            env_name: env.name.clone(),
            status: env.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_schema::ResolvedRepository;

    fn env_with(status: EnvStatus) -> Env {
        let repo = ResolvedRepository::resolve("octo/hello", "octo").unwrap();
        let mut env = Env::new("octo/hello", "small", repo);
        env.status = status;
        env
    }

    #[test]
    fn valid_env_transitions() {
        assert!(validate_env_transition("e", EnvStatus::Creating, EnvStatus::Created).is_ok());
        assert!(validate_env_transition("e", EnvStatus::Creating, EnvStatus::Creating).is_ok()); // retry
        assert!(validate_env_transition("e", EnvStatus::Created, EnvStatus::Created).is_ok());
        assert!(validate_env_transition("e", EnvStatus::Creating, EnvStatus::Removing).is_ok());
        assert!(validate_env_transition("e", EnvStatus::Created, EnvStatus::Removing).is_ok());
        assert!(validate_env_transition("e", EnvStatus::Removing, EnvStatus::Removing).is_ok());
    }

    #[test]
    fn invalid_env_transitions() {
        assert!(validate_env_transition("e", EnvStatus::Removing, EnvStatus::Created).is_err());
        assert!(validate_env_transition("e", EnvStatus::Removing, EnvStatus::Creating).is_err());
        assert!(validate_env_transition("e", EnvStatus::Created, EnvStatus::Creating).is_err());
    }

    #[test]
    fn removing_cluster_never_returns_to_created() {
        assert!(matches!(
            validate_cluster_transition("default", ClusterStatus::Removing, ClusterStatus::Created),
            Err(CoreError::ClusterTransition { .. })
        ));
        assert!(
            validate_cluster_transition("default", ClusterStatus::Creating, ClusterStatus::Created)
                .is_ok()
        );
    }

    #[test]
    fn ready_requires_created() {
        assert!(ensure_env_ready("edit", &env_with(EnvStatus::Created)).is_ok());
        assert!(matches!(
            ensure_env_ready("edit", &env_with(EnvStatus::Creating)),
            Err(CoreError::InvalidTransition {
                status: EnvStatus::Creating,
                ..
            })
        ));
        assert!(matches!(
            ensure_env_ready("edit", &env_with(EnvStatus::Removing)),
            Err(CoreError::InvalidTransition {
                status: EnvStatus::Removing,
                ..
            })
        ));
    }

    #[test]
    fn init_refuses_only_removing() {
        assert!(ensure_env_initializable(&env_with(EnvStatus::Creating)).is_ok());
        assert!(ensure_env_initializable(&env_with(EnvStatus::Created)).is_ok());
        assert!(ensure_env_initializable(&env_with(EnvStatus::Removing)).is_err());
    }
}

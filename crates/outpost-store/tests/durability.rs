//! Durability checks for the configuration record file.

use outpost_schema::{Cluster, Config, Env, ResolvedRepository};
use outpost_store::{ConfigFile, StoreError, StoreLayout};
use std::fs;

fn populated_config() -> Config {
    let mut config = Config::new();
    config.set_cluster(Cluster::new("default", "small", true));
    let repo = ResolvedRepository::resolve("octo/hello", "octo").unwrap();
    let mut env = Env::new("octo/hello", "small", repo);
    env.opened_ports.insert(8080);
    env.infrastructure_json = r#"{"instance":"i-1"}"#.to_owned();
    config.set_env("default", env).unwrap();
    config
}

#[test]
fn record_survives_a_fresh_handle() {
    let dir = tempfile::tempdir().unwrap();
    let config = populated_config();

    {
        let file = ConfigFile::new(StoreLayout::new(dir.path()));
        file.create().unwrap();
        file.save(&config).unwrap();
    }

    let file = ConfigFile::new(StoreLayout::new(dir.path()));
    assert_eq!(file.load().unwrap(), config);
}

#[test]
fn stray_temp_files_do_not_affect_load() {
    let dir = tempfile::tempdir().unwrap();
    let file = ConfigFile::new(StoreLayout::new(dir.path()));
    file.create().unwrap();
    let config = populated_config();
    file.save(&config).unwrap();

    // Left behind by a writer killed before persist().
    fs::write(file.layout().store_dir().join(".tmpAbC123"), "{ partial").unwrap();

    assert_eq!(file.load().unwrap(), config);
}

#[test]
fn truncated_record_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = ConfigFile::new(StoreLayout::new(dir.path()));
    file.create().unwrap();
    file.save(&populated_config()).unwrap();

    let path = file.layout().config_file();
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, &content[..content.len() / 2]).unwrap();

    assert!(matches!(file.load(), Err(StoreError::Serialization(_))));
}

#[test]
fn overwrite_replaces_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let file = ConfigFile::new(StoreLayout::new(dir.path()));
    file.create().unwrap();

    let mut config = populated_config();
    file.save(&config).unwrap();

    config.remove_env("default", "octo/hello").unwrap();
    file.save(&config).unwrap();

    let loaded = file.load().unwrap();
    assert_eq!(loaded.count_envs_in_cluster("default").unwrap(), 0);
}

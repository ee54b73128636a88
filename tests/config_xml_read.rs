//! XML config parsing and the env-driven load path, without touching user state.

use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

use junction_move::{CONFIG_ENV, ConfigSource, LogLevel, load_config};
use junction_move::config::load_config_from_xml_path;

#[test]
fn reads_config_xml_and_applies_values() {
    let td = tempdir().expect("create tempdir");
    let cfg_path = td.path().join("config.xml");
    let source = td.path().join("src");
    let target = td.path().join("dst");
    let log_file = td.path().join("jm.log");

    let xml = format!(
        r#"
<config>
  <source_dir>{}</source_dir>
  <target_dir>  {}  </target_dir>
  <log_level>info</log_level>
  <log_file>{}</log_file>
  <process_pattern>myapp</process_pattern>
  <process_pattern>my app helper</process_pattern>
  <bulk_copy> false </bulk_copy>
  <copy_retries>
    4
  </copy_retries>
</config>
"#,
        source.display(),
        target.display(),
        log_file.display()
    );
    fs::write(&cfg_path, xml).expect("write config.xml");

    let cfg = load_config_from_xml_path(&cfg_path).expect("load_config_from_xml_path");
    assert_eq!(cfg.source_dir, source);
    assert_eq!(cfg.target_dir, target, "whitespace around paths is trimmed");
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert_eq!(cfg.log_file.as_deref(), Some(log_file.as_path()));
    assert_eq!(cfg.process_patterns, vec!["myapp", "my app helper"]);
    assert!(!cfg.bulk_copy);
    assert_eq!(cfg.copy_retries, 4);
    assert!(cfg.copy_options().bulk_tool.is_none());
}

#[test]
fn empty_fields_keep_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(
        &cfg_path,
        "<config><source_dir>   </source_dir><log_file></log_file></config>",
    )
    .unwrap();
    let cfg = load_config_from_xml_path(&cfg_path).unwrap();
    let defaults = junction_move::Config::default();
    assert_eq!(cfg.source_dir, defaults.source_dir);
    assert_eq!(cfg.process_patterns, defaults.process_patterns);
}

#[test]
fn unknown_fields_are_rejected() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("config.xml");
    fs::write(&cfg_path, "<config><download_base>/x</download_base></config>").unwrap();
    assert!(load_config_from_xml_path(&cfg_path).is_err());
}

#[test]
#[serial]
fn env_path_is_used_when_present() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("explicit.xml");
    fs::write(&cfg_path, "<config><target_dir>/mnt/big</target_dir></config>").unwrap();

    unsafe { env::set_var(CONFIG_ENV, &cfg_path) };
    let loaded = load_config();
    unsafe { env::remove_var(CONFIG_ENV) };

    let (cfg, source) = loaded.unwrap();
    assert_eq!(cfg.target_dir, PathBuf::from("/mnt/big"));
    assert_eq!(source, ConfigSource::File(cfg_path));
}

#[test]
#[serial]
fn missing_env_file_falls_back_to_defaults() {
    let td = tempdir().unwrap();
    unsafe { env::set_var(CONFIG_ENV, td.path().join("absent.xml")) };
    let loaded = load_config();
    unsafe { env::remove_var(CONFIG_ENV) };

    let (cfg, source) = loaded.unwrap();
    assert_eq!(source, ConfigSource::Defaults);
    assert_eq!(cfg.log_file, Some(td.path().join("junction_move.log")));
}

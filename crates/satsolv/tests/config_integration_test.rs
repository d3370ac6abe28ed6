/// Integration tests for the configuration system
///
/// These tests verify that configuration loaded from files and environment
/// variables reaches the pool and the solver.

use satsolv::config::{ConfigLoader, SolverConfig, SolverFlags};
use satsolv::pool::{DepKind, Pool};
use satsolv::solver::{JobQueue, ProblemKind, Solver};
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = SolverConfig::default();

    assert_eq!(config.flags, SolverFlags::default());
    assert_eq!(config.arch, None);
    assert!(!config.promote_epoch);
    assert_eq!(config.max_steps, None);
    assert_eq!(config.timeout(), None);
}

#[test]
fn test_load_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("solver.json");
    fs::write(
        &config_file,
        r#"{
            "flags": { "allow-uninstall": true, "ignore-recommended": true },
            "arch": "x86_64",
            "max-steps": 500,
            "timeout-ms": 2000
        }"#,
    )
    .unwrap();

    let loader = ConfigLoader::new(false);
    let config = loader.load(Some(&config_file)).unwrap();

    assert!(config.flags.allow_uninstall);
    assert!(config.flags.ignore_recommended);
    assert!(!config.flags.allow_downgrade);
    assert_eq!(config.arch.as_deref(), Some("x86_64"));
    assert_eq!(config.max_steps, Some(500));
    assert_eq!(config.timeout_ms, Some(2000));
}

#[test]
fn test_load_empty_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("solver.json");
    fs::write(&config_file, "{}").unwrap();

    let config = ConfigLoader::new(false).load(Some(&config_file)).unwrap();
    assert_eq!(config, SolverConfig::default());
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("solver.json");
    fs::write(&config_file, "{ not json").unwrap();

    assert!(ConfigLoader::new(false).load(Some(&config_file)).is_err());
}

#[test]
fn test_environment_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("solver.json");
    fs::write(&config_file, r#"{ "max-steps": 10 }"#).unwrap();

    env::set_var("SATSOLV_MAX_STEPS", "42");
    env::set_var("SATSOLV_ALLOW_DOWNGRADE", "yes");

    let config = ConfigLoader::new(true).load(Some(&config_file)).unwrap();

    env::remove_var("SATSOLV_MAX_STEPS");
    env::remove_var("SATSOLV_ALLOW_DOWNGRADE");

    assert_eq!(config.max_steps, Some(42));
    assert!(config.flags.allow_downgrade);
}

#[test]
fn test_config_drives_pool_and_solver() {
    let config = SolverConfig {
        arch: Some("x86_64".to_string()),
        flags: SolverFlags::new().allow_uninstall(true),
        ..SolverConfig::default()
    };

    let mut pool = Pool::new();
    pool.apply_config(&config).unwrap();
    let system = pool.create_repo("system").unwrap();
    let available = pool.create_repo("available").unwrap();
    pool.add_solvable_with(system, "C", "1.0", "x86_64", &[]).unwrap();
    let a = pool
        .add_solvable_with(available, "A", "1.0", "x86_64", &[(DepKind::Conflicts, "C")])
        .unwrap();
    pool.add_solvable_with(available, "A", "2.0", "ppc64", &[]).unwrap();
    pool.set_installed(system).unwrap();
    let name = pool.intern("A");
    pool.prepare();

    let mut jobs = JobQueue::new();
    jobs.install_name(name);

    let transaction = Solver::new(&pool).with_config(&config).solve(&jobs).unwrap();
    assert_eq!(transaction.installs().collect::<Vec<_>>(), vec![a]);
    assert_eq!(transaction.removals().count(), 1);

    let strict = SolverConfig {
        max_steps: Some(100),
        ..SolverConfig::default()
    };
    let err = Solver::new(&pool).with_config(&strict).solve(&jobs).unwrap_err();
    assert_eq!(err.problems().unwrap().problems()[0].kind, ProblemKind::PackageConflict);
}

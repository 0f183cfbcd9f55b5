//! Integration tests for the `lvplan` binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG: &str = "[routing]\n\
                      resolution = 100.0\n\
                      line_base_cost = 1000.0\n\
                      threads = 2\n";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Two three-point villages with an empty stretch and a substation between.
fn scenario(dir: &Path) {
    write(dir, "planning.toml", CONFIG);
    let mut points = String::from("ID,X,Y,Elevation,Population,Weight,Cluster\n");
    for i in 0..9 {
        let (population, cluster) = match i {
            0..=2 => (5, 1),
            6..=8 => (5, 2),
            _ => (0, -1),
        };
        points.push_str(&format!("{},{},0,0,{},1,{}\n", i + 1, i * 100, population, cluster));
    }
    write(dir, "points.csv", &points);
    write(
        dir,
        "clusters.csv",
        "Cluster,Population,Load [kW]\n1,15,6\n2,15,6\n",
    );
    write(
        dir,
        "substations.csv",
        "ID,X,Y,PowerAvailable,Type,Cost [keur],Exist\n1,400,0,1000,MV,10,yes\n",
    );
    write(
        dir,
        "microgrids.csv",
        "Cluster,Total Cost [k€],Energy Produced [MWh]\n1,500,100\n2,500,100\n",
    );
}

fn inputs(dir: &Path) -> Vec<String> {
    let arg = |name: &str| dir.join(name).display().to_string();
    vec![
        "--config".into(),
        arg("planning.toml"),
        "--points".into(),
        arg("points.csv"),
        "--clusters".into(),
        arg("clusters.csv"),
        "--out".into(),
        arg("out"),
    ]
}

#[test]
fn help_lists_subcommands() {
    cargo_bin_cmd!("lvplan")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("route"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn validate_accepts_a_good_config() {
    let dir = TempDir::new().unwrap();
    scenario(dir.path());
    cargo_bin_cmd!("lvplan")
        .args(["validate", "--config"])
        .arg(dir.path().join("planning.toml"))
        .arg("--points")
        .arg(dir.path().join("points.csv"))
        .arg("--clusters")
        .arg(dir.path().join("clusters.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("Points OK: 9"));
}

#[test]
fn validate_names_the_bad_field() {
    let dir = TempDir::new().unwrap();
    let config = write(
        dir.path(),
        "bad.toml",
        "[routing]\nresolution = 0.0\nline_base_cost = 1000.0\n",
    );
    cargo_bin_cmd!("lvplan")
        .args(["validate", "--config"])
        .arg(config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("routing.resolution"));
}

#[test]
fn route_writes_lines_and_resume() {
    let dir = TempDir::new().unwrap();
    scenario(dir.path());
    cargo_bin_cmd!("lvplan")
        .args(["--log-level", "warn", "route"])
        .args(inputs(dir.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Routed 2 clusters: 0.40 km"));

    let resume = fs::read_to_string(dir.path().join("out/grid_resume.csv")).unwrap();
    assert_eq!(resume.lines().count(), 3);
    let lines = fs::read_to_string(dir.path().join("out/lines.csv")).unwrap();
    assert_eq!(lines.lines().count(), 5);
}

#[test]
fn plan_writes_optimization_results() {
    let dir = TempDir::new().unwrap();
    scenario(dir.path());
    cargo_bin_cmd!("lvplan")
        .args(["--log-level", "warn", "plan"])
        .args(inputs(dir.path()))
        .arg("--substations")
        .arg(dir.path().join("substations.csv"))
        .arg("--microgrids")
        .arg(dir.path().join("microgrids.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("NPC Solution Summary"));

    let json = fs::read_to_string(dir.path().join("out/milp_results.json")).unwrap();
    assert!(json.contains("\"S1\""));
    let resume = fs::read_to_string(dir.path().join("out/grid_resume.csv")).unwrap();
    assert!(resume.contains(",MV,1,"));
}

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "planning.toml", CONFIG);
    cargo_bin_cmd!("lvplan")
        .args(["route"])
        .args(inputs(dir.path()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("points.csv"));
}

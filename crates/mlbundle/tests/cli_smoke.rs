use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn mlbundle() -> Command {
    let mut command = Command::cargo_bin("mlbundle").expect("binary exists");
    command.env_remove("MLBUNDLE_COMPILER").env_remove("MLBUNDLE_BACKEND");
    command
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut permissions = fs::metadata(path).expect("metadata").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("chmod");
}

#[test]
fn help_displays_usage() {
    mlbundle()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn missing_entry_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    mlbundle()
        .current_dir(temp.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Preparing .ml files..."))
        .stderr(predicate::str::contains("failed to read entry file"));
}

#[test]
fn missing_include_is_fatal_and_skips_compile() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("main.ml"), "#use \"gone.ml\";;\n").unwrap();

    mlbundle()
        .current_dir(temp.path())
        .args(["--bundle", "out/bundle.ml"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Compiling").not())
        .stderr(predicate::str::contains("gone.ml"));

    assert!(!temp.path().join("out/bundle.ml").exists());
}

#[test]
fn print_config_reflects_flags() {
    let temp = tempfile::tempdir().unwrap();
    mlbundle()
        .current_dir(temp.path())
        .args(["--print-config", "--backend", "bytecode", "--binary", "game"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backend = \"bytecode\""))
        .stdout(predicate::str::contains("binary = \"game\""));
}

#[test]
fn workspace_config_is_picked_up() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("mlbundle.toml"),
        "[paths]\nentry = \"src/game.ml\"\n",
    )
    .unwrap();

    mlbundle()
        .current_dir(temp.path())
        .arg("--print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("entry = \"src/game.ml\""));
}

#[test]
fn completions_are_generated() {
    mlbundle()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mlbundle"));
}

#[cfg(unix)]
#[test]
fn successful_build_prints_run_hint() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("game")).unwrap();
    fs::write(root.join("game/util.ml"), "let v = 1\n").unwrap();
    fs::write(
        root.join("game/main.ml"),
        "#use \"util.ml\";;\n#LOAD \"graphics.cma\";;\nlet () = print_int v\n",
    )
    .unwrap();
    let compiler = root.join("fake-ocamlopt");
    write_script(&compiler, "echo \"$@\" > args.txt; echo noise; exit 0");

    mlbundle()
        .current_dir(root.join("game"))
        .args(["--compiler", compiler.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Success!!"))
        .stdout(predicate::str::contains(
            "Run `../bin/BigCitiesOnTinyPlanets.exe` to play",
        ))
        .stdout(predicate::str::contains("noise").not());

    assert_eq!(
        fs::read_to_string(root.join("bin/bcotp.ml")).unwrap(),
        "let v = 1\n\n\nlet () = print_int v\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("game/args.txt")).unwrap(),
        "-o ../bin/BigCitiesOnTinyPlanets.exe graphics.cmxa ../bin/bcotp.ml\n"
    );
}

#[cfg(unix)]
#[test]
fn failed_build_echoes_compiler_output() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("main.ml"), "let () = oops\n").unwrap();
    let compiler = root.join("fake-ocamlopt");
    write_script(&compiler, "echo 'Error: Unbound value oops'; exit 2");

    mlbundle()
        .current_dir(root)
        .args(["--compiler", compiler.to_str().unwrap(), "--bundle", "bundle.ml"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Something went wrong :(\nError: Unbound value oops\n",
        ));
}

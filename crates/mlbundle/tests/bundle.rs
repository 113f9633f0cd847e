use std::fs;
use std::path::Path;

use insta::assert_snapshot;
use mlbundle::app::build::BuildSettings;
use mlbundle::app::bundle::{Bundler, BundlerOptions, InlineMode};
use mlbundle::app::command::CommandBuilder;
use mlbundle::app::compile::Backend;
use mlbundle::infra::config::Config;

fn native_bundler(base_dir: &Path) -> Bundler {
    Bundler::new(BundlerOptions {
        base_dir: base_dir.to_path_buf(),
        inline_mode: InlineMode::Single,
        library_rewrite: Backend::Native.library_rewrite(),
    })
}

#[test]
fn bundles_a_small_game() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("lib")).unwrap();
    fs::write(root.join("lib/vec.ml"), "type v = { x : float; y : float }\n").unwrap();
    fs::write(root.join("lib/draw.ml"), "let draw _ = ()\n").unwrap();
    fs::write(
        root.join("main.ml"),
        "#load \"graphics.cma\";;\n#use \"lib/vec.ml\";;\n#Use \"lib/draw.ml\";;\n#load \"unix.cma\";;\nlet () = draw ()\n",
    )
    .unwrap();

    let resolved = native_bundler(root).bundle_file(&root.join("main.ml")).unwrap();

    assert_eq!(
        resolved.text,
        b"\ntype v = { x : float; y : float }\n\nlet draw _ = ()\n\n\nlet () = draw ()\n"
    );
    assert_eq!(resolved.libraries, ["graphics.cmxa", "unix.cmxa"]);
}

#[test]
fn renders_native_command() {
    let settings = BuildSettings::from_config(&Config::default());
    let command = CommandBuilder::new(
        &settings.program,
        settings.backend.flags().iter().copied(),
        &settings.binary_path(),
    )
    .libraries(["graphics.cmxa"])
    .finish(&settings.bundle);

    assert_snapshot!(
        command.to_string(),
        @"ocamlopt -o ../bin/BigCitiesOnTinyPlanets.exe graphics.cmxa ../bin/bcotp.ml"
    );
}

#[test]
fn renders_bytecode_command() {
    let mut config = Config::default();
    config.compiler.backend = Some(Backend::Bytecode);
    let settings = BuildSettings::from_config(&config);
    let command = CommandBuilder::new(
        &settings.program,
        settings.backend.flags().iter().copied(),
        &settings.binary_path(),
    )
    .libraries(["graphics.cma"])
    .finish(&settings.bundle);

    assert_snapshot!(
        command.to_string(),
        @"ocamlc -custom -o ../bin/BigCitiesOnTinyPlanets.exe graphics.cma ../bin/bcotp.ml"
    );
}

//! Library integration tests.

use actionflow::FlowError;

#[test]
fn error_types_are_public() {
    let err = FlowError::ActionNotFound {
        name: "teleport".into(),
    };
    assert!(err.to_string().contains("teleport"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> actionflow::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use actionflow::cli::{Cli, Commands};
    use clap::Parser;

    let cli = Cli::parse_from(["actionflow", "run", "nightly.yml", "--json"]);

    if let Commands::Run(args) = cli.command {
        assert!(args.json);
        assert_eq!(args.file.to_str(), Some("nightly.yml"));
    } else {
        panic!("Expected Run command");
    }
}

#[test]
fn builtin_registry_is_public() {
    let registry = actionflow::registry::ActionRegistry::with_builtins().unwrap();
    for name in [
        "command",
        "sleep",
        "fail",
        "download",
        "sync-directories",
        "checkout",
        "set-resource",
    ] {
        assert!(registry.contains(name), "missing built-in '{}'", name);
    }
}

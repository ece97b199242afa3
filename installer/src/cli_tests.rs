//! Tests for CLI parsing and argument helpers.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["anyinstall"]);
    assert!(cli.command.is_none());
    assert!(cli.install.source.is_none());
    assert!(cli.install.tag.is_none());
    assert!(!cli.install.yes);
    assert!(cli.install.bin_dir.is_none());
    assert_eq!(cli.install.verbosity, 0);
    assert!(!cli.install.quiet);
}

#[test]
fn bare_source_installs() {
    let cli = Cli::parse_from(["anyinstall", "junegunn/fzf", "--yes"]);
    assert!(cli.command.is_none());
    assert_eq!(cli.install_args().source.as_deref(), Some("junegunn/fzf"));
    assert!(cli.install_args().yes);
}

#[rstest]
#[case::install("install")]
#[case::resolve("resolve")]
#[case::update("update")]
fn subcommands_carry_install_args(#[case] subcommand: &str) {
    let cli = Cli::parse_from(["anyinstall", subcommand, "owner/tool", "--tag", "v1.0"]);
    let args = cli.install_args();
    assert_eq!(args.source.as_deref(), Some("owner/tool"));
    assert_eq!(args.tag.as_deref(), Some("v1.0"));
}

#[test]
fn platform_overrides_parse_aliases() {
    let cli = Cli::parse_from([
        "anyinstall", "resolve", "owner/tool", "--os", "macos", "--arch", "aarch64",
    ]);
    let args = cli.install_args();
    assert_eq!(args.os, Some(Os::Darwin));
    assert_eq!(args.arch, Some(Arch::Arm64));
}

#[test]
fn unknown_os_is_rejected() {
    let result = Cli::try_parse_from(["anyinstall", "owner/tool", "--os", "plan9"]);
    assert!(result.is_err());
}

#[test]
fn cli_parses_list_with_json() {
    let cli = Cli::parse_from(["anyinstall", "list", "--json"]);
    match cli.command {
        Some(Command::List(args)) => assert!(args.json),
        _ => panic!("expected List command"),
    }
}

#[test]
fn verbose_and_quiet_conflict() {
    let result = Cli::try_parse_from(["anyinstall", "owner/tool", "-v", "-q"]);
    assert!(result.is_err());
}

#[rstest]
#[case::count_one(&["anyinstall", "x/y", "-v"], (1, false))]
#[case::count_three(&["anyinstall", "x/y", "-vvv"], (3, false))]
#[case::quiet(&["anyinstall", "x/y", "-q"], (0, true))]
#[case::list(&["anyinstall", "list", "-vv"], (2, false))]
fn verbosity_is_reported(#[case] argv: &[&str], #[case] expected: (u8, bool)) {
    let cli = Cli::parse_from(argv);
    assert_eq!(cli.verbosity(), expected);
}

#[rstest]
#[case::shorthand(Some("owner/tool"), Some("v2"), Some("owner/tool@v2"))]
#[case::pinned_wins(Some("owner/tool@v1"), Some("v2"), Some("owner/tool@v1"))]
#[case::url_unchanged(
    Some("https://example.com/tool.tar.gz"),
    Some("v2"),
    Some("https://example.com/tool.tar.gz")
)]
#[case::relative_path(Some("./dist/tool"), Some("v2"), Some("./dist/tool"))]
#[case::no_tag(Some("owner/tool"), None, Some("owner/tool"))]
#[case::no_source(None, Some("v2"), None)]
fn tags_fold_into_shorthands(
    #[case] source: Option<&str>,
    #[case] tag: Option<&str>,
    #[case] expected: Option<&str>,
) {
    let args = InstallArgs {
        source: source.map(ToOwned::to_owned),
        tag: tag.map(ToOwned::to_owned),
        ..InstallArgs::default()
    };
    assert_eq!(args.effective_source().as_deref(), expected);
}

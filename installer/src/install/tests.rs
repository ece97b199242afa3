//! Tests for the install-phase units.

use super::*;
use crate::error::Result as InstallerResult;
use crate::extract::{MockArchiveExtractor, StandardExtractor};
use crate::test_utils::{
    ExpectedCall, ScriptedConfirmer, StubExecutor, failure_output, success_output,
};
use anyinstall::context::Downloaded;
use anyinstall::pipeline::Unit;
use anyinstall::record::{InstallOutcome, InstalledFiles};
use anyinstall::CandidateOrigin;
use anyinstall::candidate::ScriptDocument;
use anyinstall_common::{Arch, CapabilitySet, InstallFormat, Os, PlatformProfile};
use rstest::{fixture, rstest};
use std::cell::RefCell;
use std::io::Write;
use std::process::Output;
use tempfile::TempDir;
use url::Url;

#[fixture]
fn temp() -> TempDir {
    tempfile::tempdir().expect("temp dir")
}

/// Context with `name` selected and downloaded to `file`.
fn downloaded(os: Os, name: &str, file: &Path) -> ResolutionContext {
    let mut ctx = ResolutionContext::new(
        "jqlang/jq",
        PlatformProfile::new(os, Arch::X86_64),
        CapabilitySet::default(),
    );
    ctx.source = Some(SourceKind::Repository {
        owner: "jqlang".to_owned(),
        repo: "jq".to_owned(),
        tag: None,
    });
    let url = Url::parse(&format!("https://example.com/{name}")).expect("valid url");
    ctx.selected = Some(Candidate::asset(name, CandidateOrigin::Url(url), "test", 100));
    ctx.download = Some(Downloaded {
        path: file.to_path_buf(),
        sha256: None,
    });
    ctx
}

fn script_context(code: &str) -> ResolutionContext {
    let mut ctx = ResolutionContext::new(
        "someone/tool",
        PlatformProfile::new(Os::Linux, Arch::X86_64),
        CapabilitySet::default(),
    );
    ctx.selected = Some(Candidate::script(code, ScriptDocument::Readme, "test", 100));
    ctx
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, bytes).expect("write file");
}

fn installed_paths(ctx: &ResolutionContext) -> Vec<PathBuf> {
    match ctx.outcome.as_ref().map(|outcome| &outcome.files) {
        Some(InstalledFiles::Paths(paths)) => paths.clone(),
        other => panic!("expected installed paths, got {other:?}"),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path).is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
}

#[rstest]
fn binaries_are_installed_under_the_repository_name(temp: TempDir) {
    let file = temp.path().join("jq-linux-amd64");
    write_file(&file, b"\x7fELF");
    let bin_dir = temp.path().join("bin");
    let mut ctx = downloaded(Os::Linux, "jq-linux-amd64", &file);
    let mut unit = BinaryInstaller::new(bin_dir.clone());

    assert!(unit.should_run(&ctx));
    unit.execute(&mut ctx).expect("install succeeds");

    assert_eq!(installed_paths(&ctx), vec![bin_dir.join("jq")]);
    #[cfg(unix)]
    assert!(is_executable(&bin_dir.join("jq")));
    assert!(!unit.should_run(&ctx), "an outcome stops further installs");
}

#[rstest]
fn windows_binaries_keep_an_exe_suffix(temp: TempDir) {
    let file = temp.path().join("jq-windows-amd64.exe");
    write_file(&file, b"MZ");
    let bin_dir = temp.path().join("bin");
    let mut ctx = downloaded(Os::Windows, "jq-windows-amd64.exe", &file);

    BinaryInstaller::new(bin_dir.clone())
        .execute(&mut ctx)
        .expect("install succeeds");

    assert_eq!(installed_paths(&ctx), vec![bin_dir.join("jq.exe")]);
}

#[cfg(unix)]
#[rstest]
fn archives_install_only_their_executables(temp: TempDir) {
    let archive = temp.path().join("jq-1.7-linux-amd64.tar.gz");
    let file = std::fs::File::create(&archive).expect("create archive");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, mode, data) in [
        ("jq-1.7/jq", 0o755, b"\x7fELF".as_slice()),
        ("jq-1.7/README.md", 0o644, b"# jq".as_slice()),
        ("jq-1.7/LICENSE", 0o755, b"MIT".as_slice()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(u64::try_from(data.len()).expect("fits"));
        header.set_mode(mode);
        header.set_cksum();
        builder.append_data(&mut header, name, data).expect("append");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
        .flush()
        .expect("flush");
    let bin_dir = temp.path().join("bin");
    let mut ctx = downloaded(Os::Linux, "jq-1.7-linux-amd64.tar.gz", &archive);
    let extractor = StandardExtractor::new(Rc::new(StubExecutor::new(Vec::new())));
    let mut unit = ArchiveInstaller::new(Box::new(extractor), bin_dir.clone());

    assert!(unit.should_run(&ctx));
    unit.execute(&mut ctx).expect("install succeeds");
    unit.cleanup(&mut ctx).expect("cleanup succeeds");

    assert_eq!(installed_paths(&ctx), vec![bin_dir.join("jq")]);
    assert!(is_executable(&bin_dir.join("jq")));
}

#[rstest]
fn archives_without_modes_fall_back_to_extensionless_files(temp: TempDir) {
    let unpacked = temp.path().join("unpacked");
    let program = unpacked.join("tool");
    let notes = unpacked.join("NOTES.txt");
    write_file(&program, b"binary");
    write_file(&notes, b"notes");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o644))
            .expect("clear exec bits");
    }
    let listed = vec![notes, program];
    let mut extractor = MockArchiveExtractor::new();
    extractor
        .expect_extract()
        .times(1)
        .returning(move |_, _, _| Ok(listed.clone()));
    let bin_dir = temp.path().join("bin");
    let archive = temp.path().join("tool.zip");
    write_file(&archive, b"PK");
    let mut ctx = downloaded(Os::Linux, "tool.zip", &archive);
    let mut unit = ArchiveInstaller::new(Box::new(extractor), bin_dir.clone());

    unit.execute(&mut ctx).expect("install succeeds");

    assert_eq!(installed_paths(&ctx), vec![bin_dir.join("tool")]);
}

#[rstest]
fn archives_without_programs_fail(temp: TempDir) {
    let readme = temp.path().join("README.md");
    write_file(&readme, b"docs");
    let mut extractor = MockArchiveExtractor::new();
    extractor
        .expect_extract()
        .returning(move |_, _, _| Ok(vec![readme.clone()]));
    let archive = temp.path().join("docs.zip");
    write_file(&archive, b"PK");
    let mut ctx = downloaded(Os::Linux, "docs.zip", &archive);
    let mut unit = ArchiveInstaller::new(Box::new(extractor), temp.path().join("bin"));

    let err = unit.execute(&mut ctx).expect_err("nothing to install");
    assert!(matches!(err, ResolveError::InstallFailed { .. }));
    assert!(ctx.outcome.is_none());
}

#[rstest]
fn debian_packages_run_dpkg_after_confirmation(temp: TempDir) {
    let package = temp.path().join("jq_1.7_amd64.deb");
    write_file(&package, b"!<arch>");
    let package_arg = package.to_string_lossy().into_owned();
    let executor = Rc::new(StubExecutor::new(vec![ExpectedCall::new(
        "sudo",
        &["dpkg", "-i", &package_arg],
        Ok(success_output()),
    )]));
    let confirmer = Rc::new(ScriptedConfirmer::answering(&[true]));
    let mut ctx = downloaded(Os::Linux, "jq_1.7_amd64.deb", &package);
    let mut unit = SystemPackageInstaller::new(executor.clone(), confirmer.clone());

    assert!(unit.should_run(&ctx));
    unit.execute(&mut ctx).expect("install succeeds");

    assert_eq!(
        ctx.outcome,
        Some(InstallOutcome {
            method: InstallMethod::SystemPackage,
            files: InstalledFiles::SystemInstall,
        })
    );
    let prompts = confirmer.prompts();
    assert!(prompts.iter().any(|p| p.contains("dpkg -i")), "{prompts:?}");
    executor.assert_finished();
}

#[rstest]
fn declined_packages_abort_without_running_anything(temp: TempDir) {
    let package = temp.path().join("tool.rpm");
    write_file(&package, b"rpm");
    let executor = Rc::new(StubExecutor::new(Vec::new()));
    let mut ctx = downloaded(Os::Linux, "tool.rpm", &package);
    let mut unit = SystemPackageInstaller::new(
        executor.clone(),
        Rc::new(ScriptedConfirmer::answering(&[false])),
    );

    let err = unit.execute(&mut ctx).expect_err("declined");
    assert!(matches!(err, ResolveError::UserAborted { .. }));
    executor.assert_finished();
}

#[rstest]
#[case::deb(InstallFormat::Deb, "sudo")]
#[case::rpm(InstallFormat::Rpm, "sudo")]
#[case::pkg(InstallFormat::Pkg, "sudo")]
#[case::msi(InstallFormat::Msi, "msiexec")]
fn native_packages_map_to_their_installer(#[case] format: InstallFormat, #[case] program: &str) {
    let command = package::package_command(format, Path::new("/tmp/pkg"));
    assert_eq!(command.map(|(p, _)| p), Some(program));
}

#[test]
fn archives_are_not_native_packages() {
    assert!(package::package_command(InstallFormat::TarGz, Path::new("/tmp/x")).is_none());
}

#[cfg(not(windows))]
#[test]
fn scripts_run_through_sh_once_confirmed() {
    let code = "curl -fsSL https://example.com/install.sh | sh";
    let executor = Rc::new(StubExecutor::new(vec![ExpectedCall::new(
        "sh",
        &["-c", code],
        Ok(success_output()),
    )]));
    let confirmer = Rc::new(ScriptedConfirmer::answering(&[true]));
    let mut ctx = script_context(code);
    let mut unit = ScriptInstaller::new(executor.clone(), confirmer.clone());

    assert!(unit.should_run(&ctx), "scripts need no download");
    unit.execute(&mut ctx).expect("script succeeds");

    assert_eq!(
        ctx.outcome.map(|outcome| outcome.files),
        Some(InstalledFiles::SystemInstall)
    );
    assert!(confirmer.prompts().iter().any(|p| p.contains(code)));
    executor.assert_finished();
}

#[cfg(not(windows))]
#[test]
fn failing_scripts_report_install_failed() {
    let code = "brew install tool";
    let executor = Rc::new(StubExecutor::new(vec![ExpectedCall::new(
        "sh",
        &["-c", code],
        Ok(failure_output("brew: command not found")),
    )]));
    let mut ctx = script_context(code);
    let mut unit = ScriptInstaller::new(executor, Rc::new(ScriptedConfirmer::answering(&[true])));

    let err = unit.execute(&mut ctx).expect_err("script fails");
    match err {
        ResolveError::InstallFailed { method, reason } => {
            assert_eq!(method, "script");
            assert!(reason.contains("brew: command not found"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn declined_scripts_never_run() {
    let executor = Rc::new(StubExecutor::new(Vec::new()));
    let mut ctx = script_context("brew install tool");
    let mut unit = ScriptInstaller::new(
        executor.clone(),
        Rc::new(ScriptedConfirmer::answering(&[false])),
    );

    let err = unit.execute(&mut ctx).expect_err("declined");
    assert!(matches!(err, ResolveError::UserAborted { .. }));
    executor.assert_finished();
}

/// Executor that imitates `hdiutil` and `ditto` on the real filesystem.
#[derive(Default)]
struct FakeMacTools {
    calls: RefCell<Vec<String>>,
}

impl CommandExecutor for FakeMacTools {
    fn run(&self, cmd: &str, args: &[&str]) -> InstallerResult<Output> {
        let call = match args.first() {
            Some(sub) if cmd == "hdiutil" => format!("{cmd} {sub}"),
            _ => cmd.to_owned(),
        };
        self.calls.borrow_mut().push(call);
        match (cmd, args) {
            ("hdiutil", ["attach", .., "-mountpoint", mount, _image]) => {
                std::fs::create_dir_all(Path::new(mount).join("Tool.app/Contents"))?;
                std::fs::write(Path::new(mount).join("Tool.app/Contents/Info.plist"), b"")?;
            }
            ("ditto", [source, dest]) => {
                assert!(Path::new(source).exists(), "copying from the mount");
                std::fs::create_dir_all(dest)?;
            }
            _ => {}
        }
        Ok(success_output())
    }
}

#[rstest]
fn disk_images_copy_bundles_and_detach_on_cleanup(temp: TempDir) {
    let image = temp.path().join("Tool-1.0.dmg");
    write_file(&image, b"koly");
    let applications = temp.path().join("Applications");
    let tools = Rc::new(FakeMacTools::default());
    let mut ctx = downloaded(Os::Darwin, "Tool-1.0.dmg", &image);
    let mut unit = DiskImageInstaller::new(tools.clone(), applications.clone());

    assert!(unit.should_run(&ctx));
    unit.execute(&mut ctx).expect("install succeeds");
    unit.cleanup(&mut ctx).expect("detach succeeds");

    assert_eq!(installed_paths(&ctx), vec![applications.join("Tool.app")]);
    assert_eq!(
        tools.calls.borrow().as_slice(),
        ["hdiutil attach", "ditto", "hdiutil detach"].map(|call| call.to_owned())
    );
}

#[rstest]
fn failed_attach_skips_detach(temp: TempDir) {
    let image = temp.path().join("broken.dmg");
    write_file(&image, b"");
    let executor = Rc::new(StubExecutor::new(vec![]));
    let mut ctx = downloaded(Os::Darwin, "broken.dmg", &image);
    let mut unit = DiskImageInstaller::new(executor.clone(), temp.path().join("Applications"));

    let err = unit.execute(&mut ctx).expect_err("stub rejects the attach");
    assert!(matches!(err, ResolveError::InstallFailed { .. }));
    unit.cleanup(&mut ctx).expect("nothing to detach");
}

#[test]
fn every_method_has_one_install_unit() {
    let mut builder = RegistryBuilder::new();
    let tools = InstallTools {
        executor: Rc::new(StubExecutor::new(Vec::new())),
        confirmer: Rc::new(ScriptedConfirmer::default()),
    };
    let target = InstallTarget {
        bin_dir: PathBuf::from("/tmp/bin"),
        applications_dir: PathBuf::from("/tmp/Applications"),
    };
    register_installers(
        &mut builder,
        &target,
        &tools,
        Box::new(MockArchiveExtractor::new()),
    );

    let registry = builder.build().expect("installers are consistent");
    let ids: Vec<&str> = registry.execution_order().map(|(_, id)| id).collect();
    assert_eq!(
        ids,
        [
            ArchiveInstaller::ID,
            BinaryInstaller::ID,
            DiskImageInstaller::ID,
            SystemPackageInstaller::ID,
            ScriptInstaller::ID,
        ]
    );
}

#[test]
fn command_names_fall_back_to_the_file_stem() {
    let mut ctx = script_context("true");
    ctx.source = None;
    let candidate = Candidate::asset(
        "rg-14.1.0-x86_64",
        CandidateOrigin::LocalPath(PathBuf::from("/tmp/rg-14.1.0-x86_64")),
        "test",
        0,
    );
    assert_eq!(command_name(&ctx, &candidate), "rg");
}

#[cfg(not(windows))]
#[rstest]
fn downloaded_shell_scripts_run_as_files(temp: TempDir) {
    let script = temp.path().join("install.sh");
    write_file(&script, b"echo installing\n");
    let script_arg = script.to_string_lossy().into_owned();
    let executor = Rc::new(StubExecutor::new(vec![ExpectedCall::new(
        "sh",
        &[&script_arg],
        Ok(success_output()),
    )]));
    let confirmer = Rc::new(ScriptedConfirmer::answering(&[true]));
    let mut ctx = downloaded(Os::Linux, "install.sh", &script);
    let mut unit = ScriptInstaller::new(executor.clone(), confirmer.clone());

    unit.execute(&mut ctx).expect("script succeeds");

    assert!(confirmer.prompts().iter().any(|p| p.contains("echo installing")));
    executor.assert_finished();
}

//! Shared test infrastructure: scratch git repositories and a stub
//! latexdiff so end-to-end runs need no TeX installation.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Throwaway git repository with deterministic identity config.
pub struct GitRepo {
    dir: TempDir,
}

impl GitRepo {
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let repo = Self { dir };
        repo.git(&["init", "--quiet", "--initial-branch=main"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "user.name", "Test"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, content).expect("write file");
    }

    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "-m", message]);
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .status()
            .expect("run git");
        assert!(status.success(), "git {args:?} failed");
    }
}

/// Install a stub `latexdiff` into `dir` that concatenates both inputs with
/// visible separators, so test assertions can see exactly what it was fed.
pub fn install_stub_latexdiff(dir: &Path) -> PathBuf {
    install_stub(
        dir,
        "#!/bin/sh\necho \"<<<OLD\"\ncat \"$1\"\necho \">>>NEW\"\ncat \"$2\"\n",
    )
}

/// Install `script` as a stub `latexdiff` and return the bin directory to
/// prepend to PATH.
pub fn install_stub(dir: &Path, script: &str) -> PathBuf {
    let bin_dir = dir.join("stub-bin");
    fs::create_dir_all(&bin_dir).expect("create stub bin dir");
    let path = bin_dir.join("latexdiff");
    fs::write(&path, script).expect("write stub latexdiff");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("make stub executable");
    }
    bin_dir
}

/// PATH value with `bin_dir` prepended to the current PATH.
pub fn path_with(bin_dir: &Path) -> OsString {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut paths = vec![bin_dir.to_path_buf()];
    paths.extend(std::env::split_paths(&current));
    std::env::join_paths(paths).expect("join PATH")
}

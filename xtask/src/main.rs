//! Development tasks for kube-bootstrap
//!
//! Usage: cargo xtask <command>
//!
//! - ci: formatting, clippy and the test suite
//! - schemas: render every supported kubeadm schema with the built binary
//! - package: release tarball and .deb under dist/

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const BIN: &str = "kube-bootstrap";

/// Oldest and newest minor releases the renderer maps to a schema
const SUPPORTED_MINORS: std::ops::RangeInclusive<u32> = 12..=18;

/// Fixed inputs so every rendered document is comparable between runs
const SMOKE_PARAMS: &[&str] = &[
    "--advertise-address",
    "10.0.0.5",
    "--pod-subnet",
    "10.244.0.0/16",
    "-D",
    "join.api-server-endpoint=10.0.0.5:6443",
    "-D",
    "join.token=abcdef.0123456789abcdef",
    "-D",
    "join.unsafe-skip-ca-verification=true",
];

#[derive(Parser)]
#[command(name = "xtask", about = "Development tasks for kube-bootstrap")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Check formatting, run clippy and the tests
    Ci,
    /// Render init and join documents for every supported minor release
    Schemas {
        /// Keep the rendered documents in this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build a release tarball and Debian package under dist/
    Package {
        /// Target triple (e.g., x86_64-unknown-linux-gnu)
        #[arg(long)]
        target: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(project_root()?);

    match cli.command {
        Task::Ci => ci(&sh),
        Task::Schemas { out } => schemas(&sh, out),
        Task::Package { target } => package(&sh, target),
    }
}

fn ci(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo fmt --all -- --check").run()?;
    cmd!(sh, "cargo clippy --all-targets -- -D warnings").run()?;
    cmd!(sh, "cargo test --all").run()?;
    println!("✅ CI checks passed");
    Ok(())
}

fn schemas(sh: &Shell, out: Option<PathBuf>) -> Result<()> {
    cmd!(sh, "cargo build --release --bin {BIN}").run()?;
    let binary = project_root()?.join("target/release").join(BIN);

    let out = out.unwrap_or_else(|| std::env::temp_dir().join("kube-bootstrap-schemas"));
    sh.create_dir(&out)?;

    for minor in SUPPORTED_MINORS {
        let version = format!("v1.{}.0", minor);
        for (kind, extra) in [("init", None), ("join", Some("--join"))] {
            let path = out.join(format!("{}-{}.yaml", version, kind));
            cmd!(sh, "{binary} render -k {version} {extra...} -o {path} {SMOKE_PARAMS...}")
                .quiet()
                .run()
                .with_context(|| format!("rendering {} {} failed", kind, version))?;

            let text = sh.read_file(&path)?;
            let expected = if kind == "init" { "InitConfiguration" } else { "JoinConfiguration" };
            if !text.contains(expected) {
                bail!("{} has no {} document", path.display(), expected);
            }
        }
        println!("✓ {}", version);
    }

    // one past the table must be refused
    let unsupported = format!("v1.{}.0", SUPPORTED_MINORS.end() + 1);
    if cmd!(sh, "{binary} render -k {unsupported} {SMOKE_PARAMS...}")
        .quiet()
        .ignore_stdout()
        .ignore_stderr()
        .run()
        .is_ok()
    {
        bail!("{} rendered although it is outside the schema table", unsupported);
    }

    println!("✅ Rendered documents in {}", out.display());
    Ok(())
}

fn package(sh: &Shell, target: Option<String>) -> Result<()> {
    let target_args: Vec<String> = target
        .iter()
        .flat_map(|t| ["--target".to_string(), t.clone()])
        .collect();
    cmd!(sh, "cargo build --release {target_args...}").run()?;

    let release_dir = match &target {
        Some(triple) => format!("target/{}/release", triple),
        None => "target/release".to_string(),
    };
    let dist = project_root()?.join("dist");
    sh.create_dir(&dist)?;
    sh.copy_file(Path::new(&release_dir).join(BIN), dist.join(BIN))?;

    // pkgid ends in `#kube-bootstrap@<version>` or `#<version>`
    let pkgid = cmd!(sh, "cargo pkgid -p {BIN}").read()?;
    let version = pkgid.rsplit(['#', '@']).next().unwrap_or("unknown");
    let archive = dist.join(format!("{}-{}.tar.gz", BIN, version));
    cmd!(sh, "tar -czf {archive} -C {dist} {BIN}")
        .run()
        .context("failed to create tarball")?;

    if cmd!(sh, "cargo deb --version").quiet().ignore_stdout().run().is_ok() {
        cmd!(sh, "cargo deb --no-build {target_args...} --output dist").run()?;
    } else {
        println!("cargo-deb not installed, skipping .deb");
    }

    println!("✅ Packages written to {}", dist.display());
    Ok(())
}

fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask is not inside the workspace")
}

use std::process::Command;

#[cfg(windows)]
extern crate winres;

fn main() {
    println!("cargo:rerun-if-env-changed=PACKAGE_VERSION");
    println!("cargo:rerun-if-env-changed=FILE_VERSION");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/heads");

    let info = VersionInfo::detect();

    println!("cargo:rustc-env=PACKAGE_VERSION={}", info.package);
    println!("cargo:rustc-env=FILE_VERSION={}", info.file);
    println!("cargo:rustc-env=BUILD_INFO={}", info.build);

    // Test and bench targets have no binary to attach resources to
    #[cfg(windows)]
    if std::env::var("CARGO_BIN_NAME").is_ok() {
        embed_windows_resources(&info);
    }
}

struct VersionInfo {
    package: String,
    file: String,
    build: String,
}

impl VersionInfo {
    fn detect() -> Self {
        // CI pipelines pin both versions explicitly
        if let (Ok(package), Ok(file)) = (
            std::env::var("PACKAGE_VERSION"),
            std::env::var("FILE_VERSION"),
        ) {
            let build = format!("{}+ci", file);
            return Self {
                package,
                file,
                build,
            };
        }

        let base = git(&["describe", "--tags", "--abbrev=0", "--match", "v[0-9]*"])
            .map(|tag| tag.trim_start_matches('v').to_string())
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
        let commits: u32 = git(&["rev-list", "--count", "HEAD"])
            .and_then(|count| count.parse().ok())
            .unwrap_or(0);
        let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
        let dirty = Command::new("git")
            .args(["diff", "--quiet"])
            .status()
            .map(|status| !status.success())
            .unwrap_or(false);

        Self {
            file: format!("{}.{}", base, commits),
            build: format!(
                "{}+build.{}.{}{}",
                base,
                commits,
                hash,
                if dirty { "-dirty" } else { "" }
            ),
            package: base,
        }
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

#[cfg(windows)]
fn embed_windows_resources(info: &VersionInfo) {
    // VERSIONINFO wants exactly four components
    let mut parts: Vec<u16> = info
        .file
        .split('.')
        .filter_map(|s| s.parse().ok())
        .collect();
    parts.resize(4, 0);
    let file_version = parts
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(".");
    let packed = parts
        .iter()
        .fold(0u64, |acc, part| (acc << 16) | u64::from(*part));

    let bin_name = std::env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "mt5-relay-server".into());

    let mut res = winres::WindowsResource::new();
    res.set("ProductVersion", &info.package)
        .set("ProductName", "MT5 Relay")
        .set("FileVersion", &file_version)
        .set(
            "FileDescription",
            "Remote automation bridge for the MetaTrader 5 terminal",
        )
        .set("OriginalFilename", &format!("{}.exe", bin_name));
    res.set_version_info(winres::VersionInfo::FILEVERSION, packed);
    res.set_version_info(winres::VersionInfo::PRODUCTVERSION, packed);

    if let Err(e) = res.compile() {
        println!("cargo:warning=Failed to compile Windows resources: {}", e);
    }
}

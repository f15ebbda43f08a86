use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Run the `brokerbench` binary with the given arguments.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_brokerbench<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = brokerbench_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("BROKERBENCH_LOG")
        .output()
        .map_err(|err| format!("run brokerbench failed: {}", err))
}

/// Fails with both output streams when the process exited unsuccessfully.
///
/// # Errors
///
/// Returns an error carrying stdout and stderr on a non-zero exit.
pub fn ensure_success(output: &Output) -> Result<(), String> {
    if output.status.success() {
        return Ok(());
    }
    Err(format!(
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    ))
}

/// Finds the single file in `dir` whose name starts with `prefix`.
///
/// # Errors
///
/// Returns an error when there is not exactly one such file.
pub fn single_file_with_prefix(dir: &Path, prefix: &str) -> Result<PathBuf, String> {
    let entries = fs::read_dir(dir).map_err(|err| format!("read_dir failed: {}", err))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| format!("read_dir entry failed: {}", err))?;
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            found.push(entry.path());
        }
    }
    match found.as_slice() {
        [path] => Ok(path.clone()),
        _ => Err(format!("Expected one '{}' file, found {:?}", prefix, found)),
    }
}

fn brokerbench_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_brokerbench").map_or_else(
        || Err("CARGO_BIN_EXE_brokerbench missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

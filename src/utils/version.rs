//! Build identification reported by `/ping` and the startup log

/// Crate version baked in by Cargo
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn get_version() -> &'static str {
    VERSION
}

/// `<version> (<commit>@<build date>)`
///
/// `GIT_HASH` and `BUILD_DATE` are read from the build environment; either
/// one missing shows as `unknown`.
pub fn get_detailed_version() -> String {
    let commit = option_env!("GIT_HASH").unwrap_or("unknown");
    let built = option_env!("BUILD_DATE").unwrap_or("unknown");

    format!("{} ({}@{})", VERSION, commit, built)
}

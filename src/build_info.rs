/// Build information captured at compile time
pub struct BuildInfo;

impl BuildInfo {
    /// Get the package version from Cargo.toml
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Get a formatted version string for display
    #[allow(dead_code)]
    pub fn display_version() -> String {
        format!("siftlog-diag {}", Self::version())
    }
}

mod cleanupcode;

pub use cleanupcode::{CleanupCode, Launcher};

/// File extensions owned by prettier when it runs alongside the formatter.
pub const PRETTIER_EXTENSIONS: [&str; 11] = [
    "js", "jsx", "json", "html", "ts", "tsx", "css", "less", "scss", "md", "yaml",
];

/// Exclude expression that skips every prettier-owned file type.
#[must_use]
pub fn prettier_exclude() -> String {
    PRETTIER_EXTENSIONS
        .iter()
        .map(|extension| format!("**/*.{extension}"))
        .collect::<Vec<_>>()
        .join(";")
}

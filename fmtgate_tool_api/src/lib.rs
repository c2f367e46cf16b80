mod types;

pub use types::{CommandSpec, FormatRequest, Profile, ToolError, ToolResult};

/// Trait implemented by formatter integrations (e.g., ReSharper cleanupcode).
pub trait FormatTool: Send + Sync {
    /// Stable identifier used for lookup and logging.
    fn id(&self) -> &'static str;

    /// Human-friendly label for messages.
    fn label(&self) -> &'static str;

    /// Command whose zero exit proves the tool can be launched.
    fn probe_command(&self) -> CommandSpec;

    /// Guidance printed when the probe fails.
    fn install_hint(&self) -> String;

    /// Compose the invocation for one batch.
    ///
    /// # Errors
    ///
    /// Returns tool-defined errors when the request cannot be expressed.
    fn invocation(&self, request: &FormatRequest<'_>) -> ToolResult<CommandSpec>;

    /// Whether an error-stream line means "no matching files".
    fn is_nothing_found(&self, line: &str) -> bool;

    /// Whether the tool expands include patterns itself.
    fn supports_native_patterns(&self) -> bool {
        true
    }
}

/// The supported output formats for rendered chord lines.
///
/// Why this exists:
/// - We want a single, strongly-typed representation of output formats
///   across the CLI, the server, and library code.
/// - Using an enum avoids stringly-typed conditionals and keeps format
///   selection explicit and discoverable.
///
/// Integration notes:
/// - The `ValueEnum` derive (behind the `cli` feature) allows this enum to
///   be used directly as a CLI flag with `clap`.
/// - Each variant maps to a concrete `LineEncoder` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputType {
    /// Output chord lines as a JSON array.
    Json,

    /// Output a Markdown chord sheet (bold timestamp+chords header, then lyrics).
    Sheet,
}

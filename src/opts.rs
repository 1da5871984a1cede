use crate::model_tier::ModelTier;
use crate::output_type::OutputType;

/// Options that control how a recording is analyzed.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI and server are responsible for mapping user input into this type so
/// that the library remains reusable outside of either frontend.
#[derive(Debug, Clone)]
pub struct Opts {
    /// Which Whisper model tier to transcribe with.
    ///
    /// The tier trades transcription speed for accuracy; it has no effect on
    /// the chord analysis, which always runs over the same audio.
    pub model_tier: ModelTier,

    /// Optional language hint (e.g. `"en"`, `"es"`).
    ///
    /// When `None`, we allow Whisper to auto-detect the sung language.
    pub language: Option<String>,

    /// Whether to translate lyrics to English instead of transcribing verbatim.
    pub translate_to_english: bool,

    /// The desired output format for the rendered chord sheet.
    pub output_type: OutputType,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            model_tier: ModelTier::default(),
            language: None,
            translate_to_english: false,
            output_type: OutputType::Sheet,
        }
    }
}

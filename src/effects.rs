//! Boundary to the external shader compositor.

use crate::encode::sink::FrameRGBA;
use crate::foundation::error::ScenecastResult;

/// One fragment-shader effect applied on top of a media frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShaderEffect {
    /// Fragment shader source.
    pub fragment: String,
    /// Animation progress in `[0, 1]`.
    pub progress: f64,
    /// Effect strength.
    pub intensity: f64,
}

/// External compositor running shader effects over a source frame.
///
/// Implementations are opaque to the media layer: it only hands over the frame, its size and the
/// effect list.
pub trait EffectCompositor {
    /// Composite `effects` over `source` and return the result.
    fn composite(&self, source: &FrameRGBA, effects: &[ShaderEffect]) -> ScenecastResult<FrameRGBA>;
}

/// Apply `effects` through `compositor`. An empty list returns `source` untouched without calling
/// the compositor.
pub fn apply_effects(
    compositor: &dyn EffectCompositor,
    source: FrameRGBA,
    effects: &[ShaderEffect],
) -> ScenecastResult<FrameRGBA> {
    if effects.is_empty() {
        return Ok(source);
    }
    compositor.composite(&source, effects)
}

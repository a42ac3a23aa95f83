/// Graphics context configuration.
///
/// Keep this structure small; per-draw state (transforms, clips) lives on the
/// context, not here.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GraphicsConfig {
    /// Device pixels per logical pixel. Also selects bitmap scale variants.
    pub pixel_scale: f32,

    /// Edge antialiasing, where the backend supports it.
    pub antialias: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self { pixel_scale: 1.0, antialias: true }
    }
}

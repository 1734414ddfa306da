//! Engine configuration.

/// How markers for sibling/ancestor relations are scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerStrategy {
    /// Reuse one shared, file-wide marker when only a single component in
    /// the file carries relations; switch every relation to a
    /// uniquely-scoped marker as soon as two could collide.
    #[default]
    SharedWhenSafe,
    /// Always allocate a uniquely-scoped marker per relation. Larger output,
    /// strictly simpler reasoning: a file growing a second relation later
    /// can never silently collide with an existing shared marker.
    AlwaysUnique,
}

/// Options for one lowering run.
#[derive(Debug, Clone)]
pub struct LowerOptions {
    /// Marker scoping strategy.
    pub marker_strategy: MarkerStrategy,
    /// The self-reference token in selectors.
    pub self_token: char,
    /// Emit advisory warnings for `!important` declarations.
    pub warn_important: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            marker_strategy: MarkerStrategy::default(),
            self_token: '&',
            warn_important: true,
        }
    }
}

impl LowerOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific marker strategy.
    pub fn with_marker_strategy(mut self, strategy: MarkerStrategy) -> Self {
        self.marker_strategy = strategy;
        self
    }

    /// Disable `!important` advisories.
    pub fn silence_important(mut self) -> Self {
        self.warn_important = false;
        self
    }
}

//! Composition options.

/// Default height of one fanned-out row slot, in layout units.
pub const DEFAULT_ROW_HEIGHT: u32 = 12;

/// Options for the composition engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Height of one row slot for `A:<name>` content
    pub row_height: u32,

    /// Compose customer records on the rayon worker pool
    pub parallel: bool,
}

impl ComposeOptions {
    /// Create new compose options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row slot height (minimum 1).
    pub fn with_row_height(mut self, row_height: u32) -> Self {
        self.row_height = row_height.max(1);
        self
    }

    /// Enable or disable parallel composition.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Compose records one after another.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            parallel: true,
        }
    }
}

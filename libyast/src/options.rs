//! Parse configuration.

/// Default limit on node nesting, deep enough for any hand-written document
/// while failing fast on pathological input.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling a tokenize/parse call.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Filename shown in error messages.
    pub filename: Option<String>,
    /// Maximum nesting depth of collections and node properties.
    pub max_depth: usize,
    /// Keep comment tokens in the token stream's side channel.
    pub retain_comments: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_comments(mut self, retain: bool) -> Self {
        self.retain_comments = retain;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            filename: None,
            max_depth: DEFAULT_MAX_DEPTH,
            retain_comments: true,
        }
    }
}

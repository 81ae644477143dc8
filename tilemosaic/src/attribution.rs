//! Attribution of the tile data source.

/// Represents an attribution, typically used for citing sources or providing
/// credit.
///
/// The compositor itself never renders the attribution; the value is carried
/// so the application showing the composed images can display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    text: String,
    url: Option<String>,
}

impl Attribution {
    /// Creates a new `Attribution` with the given text and optional URL.
    pub fn new(text: impl Into<String>, url: Option<String>) -> Self {
        Self {
            text: text.into(),
            url,
        }
    }

    /// The citation or credit message.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// URL where more information about the data source can be found.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

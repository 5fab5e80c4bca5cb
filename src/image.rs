//! The result of picking an image for a profile or post.

/// What the image picker produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSelection {
    /// The URI of the chosen image, either local or remote.
    Selected(String),
    /// The user closed the picker without choosing an image.
    Cancelled,
}

impl ImageSelection {
    /// Interpret the raw value of an image input, where a blank value means
    /// the picker was cancelled.
    pub fn from_input(raw: &str) -> Self {
        let uri = raw.trim();

        if uri.is_empty() {
            ImageSelection::Cancelled
        } else {
            ImageSelection::Selected(uri.to_owned())
        }
    }

    /// The image URI, or an empty string when no image was selected.
    ///
    /// Forms that require an image report the empty value as a field error.
    pub fn into_uri(self) -> String {
        match self {
            ImageSelection::Selected(uri) => uri,
            ImageSelection::Cancelled => String::new(),
        }
    }
}

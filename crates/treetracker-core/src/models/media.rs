use bytes::Bytes;
use serde::Serialize;

/// An image chosen through the media picker.
///
/// The binary payload is never serialized; records carry the name, declared
/// type, and size so a hand-off can be logged without dumping the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaAsset {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(skip)]
    data: Bytes,
}

impl MediaAsset {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into().to_lowercase(),
            size_bytes: data.len() as u64,
            data,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Declared type is an image (`image/*`)
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

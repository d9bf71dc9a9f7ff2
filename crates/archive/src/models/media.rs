use std::fmt::{Display, Formatter, Result as FmtResult};

/// Image formats recognized as comic pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    Webp,
}
impl MediaType {
    const EXTENSIONS: [(&'static str, MediaType); 5] = [
        (".jpg", MediaType::Jpeg),
        (".jpeg", MediaType::Jpeg),
        (".png", MediaType::Png),
        (".gif", MediaType::Gif),
        (".webp", MediaType::Webp),
    ];

    /// Detect the page format from an entry name (case-insensitive extension
    /// match). Returns `None` for anything that isn't a recognized image.
    pub fn from_name(name: impl AsRef<str>) -> Option<Self> {
        let lower = name.as_ref().to_ascii_lowercase();
        Self::EXTENSIONS.iter().find(|(ext, _)| lower.ends_with(ext)).map(|(_, media)| *media)
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
        }
    }
}
impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.mime())
    }
}

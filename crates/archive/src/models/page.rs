use super::MediaType;
use crate::resource::PageResource;

/// One page of an opened archive.
///
/// Pages are only produced by the [`Extractor`](crate::Extractor); the
/// `index` is the page's position in the natural ordering of the archive's
/// entry paths and can't be changed afterwards.
#[derive(Debug)]
pub struct Page {
    index: usize,
    name: String,
    media_type: MediaType,
    resource: PageResource,
}
impl Page {
    pub(crate) fn new(index: usize, name: String, media_type: MediaType, resource: PageResource) -> Self {
        Self { index, name, media_type, resource }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Full entry path inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn resource(&self) -> &PageResource {
        &self.resource
    }

    /// Give the page's resource handle back to its pool.
    pub fn release(self) {
        self.resource.release();
    }
}

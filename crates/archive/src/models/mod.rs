mod manga;
mod media;
mod page;
mod timestamp;

pub use self::manga::{MangaId, MangaRecord};
pub use self::media::MediaType;
pub use self::page::Page;
pub use self::timestamp::Timestamp;

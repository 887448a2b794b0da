pub mod error;
pub mod gamelist;
pub mod media;

pub use error::FrontendError;
pub use gamelist::{
    GamelistEntry, parse_gamelist, read_gamelist, relative_media_path, write_gamelist,
};
pub use media::AssetKind;

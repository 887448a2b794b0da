/// Errors that can occur while reading or writing ES-DE metadata.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Invalid gamelist: {0}")]
    InvalidGamelist(String),
}

impl FrontendError {
    pub fn invalid_gamelist(msg: impl Into<String>) -> Self {
        Self::InvalidGamelist(msg.into())
    }
}

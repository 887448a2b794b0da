/// Asset kinds the scraper collects and ES-DE can display.
///
/// The folder and tag vocabulary is frozen; renaming any of it would orphan
/// media from earlier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    /// Front box art (2D)
    Cover,
    /// 3D rendered box art
    Cover3D,
    /// Logo / marquee / wheel image
    Marquee,
    /// Composite miximage (screenshot + box + marquee)
    Miximage,
    /// In-game screenshot
    Screenshot,
}

impl AssetKind {
    /// All kinds, in the order they appear in gamelist entries.
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Cover,
        AssetKind::Cover3D,
        AssetKind::Marquee,
        AssetKind::Miximage,
        AssetKind::Screenshot,
    ];

    /// Subdirectory under the per-system media root.
    pub fn folder(&self) -> &'static str {
        match self {
            AssetKind::Cover => "covers",
            AssetKind::Cover3D => "3dboxes",
            AssetKind::Marquee => "marquees",
            AssetKind::Miximage => "miximages",
            AssetKind::Screenshot => "screenshots",
        }
    }

    /// Media type name used by the ScreenScraper API.
    pub fn remote_name(&self) -> &'static str {
        match self {
            AssetKind::Cover => "box-2D",
            AssetKind::Cover3D => "box-3D",
            AssetKind::Marquee => "screenmarquee",
            AssetKind::Miximage => "mixrbv2",
            AssetKind::Screenshot => "ss",
        }
    }

    /// Tag name inside a `<game>` element. ES-DE reads `image`, `thumbnail`
    /// and `marquee`; the remaining tags are harmless extras it ignores.
    pub fn gamelist_tag(&self) -> &'static str {
        match self {
            AssetKind::Cover => "image",
            AssetKind::Cover3D => "thumbnail",
            AssetKind::Marquee => "marquee",
            AssetKind::Miximage => "miximage",
            AssetKind::Screenshot => "screenshot",
        }
    }

    pub fn from_gamelist_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.gamelist_tag() == tag)
    }

    pub fn from_remote_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.remote_name() == name)
    }

    /// File extension for this asset kind.
    pub fn default_extension(&self) -> &'static str {
        "png"
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder())
    }
}

//! Reading, writing and merging ES-DE `gamelist.xml` manifests.
//!
//! The manifest is the durable record of what has been scraped. Reads are
//! tolerant (a malformed file is the caller's problem to degrade on); writes
//! always go through a temp file so an interrupted run can never truncate an
//! existing gamelist.

use std::collections::BTreeMap;
use std::fs;
use std::io::BufRead;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::FrontendError;
use crate::media::AssetKind;

/// One `<game>` element of a gamelist.
///
/// `path` is the ES-DE convention `./<rom file name>` and doubles as the
/// entry's identity. Unrecognized simple tags (ratings, favorites, play
/// counts from other tools) are carried in `extra` so a rewrite never drops
/// someone else's data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamelistEntry {
    pub path: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Raw date as scraped (`YYYY-MM-DD`) or as previously written
    /// (`YYYYMMDDTHHMMSS`); normalized at write time.
    pub release_date: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub players: Option<String>,
    /// Media tag value (path relative to the gamelist dir) per asset kind.
    pub media: BTreeMap<AssetKind, String>,
    /// Unknown simple tags, preserved verbatim.
    pub extra: BTreeMap<String, String>,
}

impl GamelistEntry {
    pub fn new(rom_file_name: &str) -> Self {
        Self {
            path: format!("./{rom_file_name}"),
            ..Self::default()
        }
    }

    /// ROM file name without the `./` prefix.
    pub fn file_name(&self) -> &str {
        self.path.strip_prefix("./").unwrap_or(&self.path)
    }

    /// ROM file name without its extension; media files are named after it.
    pub fn stem(&self) -> String {
        Path::new(self.file_name())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name().to_string())
    }

    fn set_field(&mut self, tag: &str, value: String) {
        match tag {
            "path" => self.path = value,
            "name" => self.name = Some(value),
            "desc" => self.description = Some(value),
            "releasedate" => self.release_date = Some(value),
            "developer" => self.developer = Some(value),
            "publisher" => self.publisher = Some(value),
            "genre" => self.genre = Some(value),
            "players" => self.players = Some(value),
            _ => {
                if let Some(kind) = AssetKind::from_gamelist_tag(tag) {
                    self.media.insert(kind, value);
                } else {
                    self.extra.insert(tag.to_string(), value);
                }
            }
        }
    }
}

/// Parse a gamelist from a file path. A missing file is not an error here;
/// callers that want to treat it as empty should check existence first.
pub fn read_gamelist(path: &Path) -> Result<Vec<GamelistEntry>, FrontendError> {
    let file = fs::File::open(path)?;
    parse_gamelist(std::io::BufReader::new(file))
}

/// Parse `<gameList>` content. Only `<game>` elements are modeled; a game
/// without a `<path>` has no identity and is dropped.
pub fn parse_gamelist<R: BufRead>(reader: R) -> Result<Vec<GamelistEntry>, FrontendError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut current: Option<GamelistEntry> = None;
    let mut current_tag = String::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag.as_str() {
                    "game" => current = Some(GamelistEntry::default()),
                    "gameList" => {}
                    _ => current_tag = tag,
                }
            }
            Event::Text(ref e) => {
                if let Some(ref mut entry) = current {
                    if !current_tag.is_empty() {
                        let text = e.unescape()?.to_string();
                        entry.set_field(&current_tag, text);
                    }
                }
            }
            Event::CData(ref e) => {
                if let Some(ref mut entry) = current {
                    if !current_tag.is_empty() {
                        let text = String::from_utf8_lossy(e.as_ref()).to_string();
                        entry.set_field(&current_tag, text);
                    }
                }
            }
            Event::End(ref e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "game" {
                    if let Some(entry) = current.take() {
                        if !entry.path.is_empty() {
                            entries.push(entry);
                        }
                    }
                } else {
                    current_tag.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Write a gamelist, replacing any existing file atomically.
pub fn write_gamelist(path: &Path, entries: &[GamelistEntry]) -> Result<(), FrontendError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\"?>\n");
    xml.push_str("<gameList>\n");
    for entry in entries {
        write_entry(&mut xml, entry);
    }
    xml.push_str("</gameList>\n");

    // Temp file + rename so an interrupted write leaves the old file intact
    let tmp = path.with_extension("xml.tmp");
    fs::write(&tmp, xml.as_bytes())?;
    fs::rename(&tmp, path)?;

    Ok(())
}

/// Media tag value for an asset: relative to the gamelist directory when a
/// relative path exists, absolute otherwise.
pub fn relative_media_path(gamelist_dir: &Path, asset_path: &Path) -> String {
    match pathdiff::diff_paths(asset_path, gamelist_dir) {
        Some(rel) => rel.display().to_string(),
        None => asset_path.display().to_string(),
    }
}

fn write_entry(xml: &mut String, entry: &GamelistEntry) {
    xml.push_str("  <game>\n");
    write_tag(xml, "path", &entry.path);

    if let Some(ref name) = entry.name {
        write_tag(xml, "name", name);
    }
    if let Some(ref desc) = entry.description {
        write_tag(xml, "desc", desc);
    }
    if let Some(ref date) = entry.release_date {
        write_tag(xml, "releasedate", &format_esde_date(date));
    }
    if let Some(ref dev) = entry.developer {
        write_tag(xml, "developer", dev);
    }
    if let Some(ref pub_) = entry.publisher {
        write_tag(xml, "publisher", pub_);
    }
    if let Some(ref genre) = entry.genre {
        write_tag(xml, "genre", genre);
    }
    if let Some(ref players) = entry.players {
        write_tag(xml, "players", players);
    }

    for kind in AssetKind::ALL {
        if let Some(media_path) = entry.media.get(&kind) {
            write_tag(xml, kind.gamelist_tag(), media_path);
        }
    }
    for (tag, value) in &entry.extra {
        write_tag(xml, tag, value);
    }

    xml.push_str("  </game>\n");
}

fn write_tag(xml: &mut String, tag: &str, value: &str) {
    xml.push_str("    <");
    xml.push_str(tag);
    xml.push('>');
    xml.push_str(&escape_xml(value));
    xml.push_str("</");
    xml.push_str(tag);
    xml.push_str(">\n");
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Convert YYYY-MM-DD (or an already-normalized value) to ES-DE's
/// YYYYMMDDTHHMMSS format.
fn format_esde_date(date: &str) -> String {
    let digits = date.replace('-', "");
    // Take chars, not bytes: foreign-tool gamelists can hold arbitrary text.
    let head: String = digits.chars().take(8).collect();
    format!("{head}T000000")
}

#[cfg(test)]
#[path = "tests/gamelist_tests.rs"]
mod tests;

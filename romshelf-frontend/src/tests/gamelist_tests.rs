use super::*;

const SAMPLE_GAMELIST: &str = r#"<?xml version="1.0"?>
<gameList>
    <game>
        <path>./Super Mario World (USA).sfc</path>
        <name>Super Mario World</name>
        <desc>Mario &amp; Yoshi save Dinosaur Land.</desc>
        <releasedate>19901121T000000</releasedate>
        <developer>Nintendo EAD</developer>
        <publisher>Nintendo</publisher>
        <genre>Platform</genre>
        <players>1-2</players>
        <image>../downloaded_media/snes/covers/Super Mario World (USA).png</image>
        <thumbnail>../downloaded_media/snes/3dboxes/Super Mario World (USA).png</thumbnail>
        <marquee>../downloaded_media/snes/marquees/Super Mario World (USA).png</marquee>
        <rating>0.9</rating>
    </game>
    <game>
        <path>./Earthbound (USA).sfc</path>
        <name>Earthbound</name>
    </game>
</gameList>"#;

#[test]
fn test_parse_sample() {
    let entries = parse_gamelist(SAMPLE_GAMELIST.as_bytes()).unwrap();
    assert_eq!(entries.len(), 2);

    let smw = &entries[0];
    assert_eq!(smw.path, "./Super Mario World (USA).sfc");
    assert_eq!(smw.file_name(), "Super Mario World (USA).sfc");
    assert_eq!(smw.stem(), "Super Mario World (USA)");
    assert_eq!(smw.name.as_deref(), Some("Super Mario World"));
    assert_eq!(
        smw.description.as_deref(),
        Some("Mario & Yoshi save Dinosaur Land.")
    );
    assert_eq!(smw.players.as_deref(), Some("1-2"));
    assert_eq!(
        smw.media.get(&AssetKind::Cover).map(String::as_str),
        Some("../downloaded_media/snes/covers/Super Mario World (USA).png")
    );
    assert!(smw.media.contains_key(&AssetKind::Cover3D));
    assert!(!smw.media.contains_key(&AssetKind::Miximage));
    // Tags we do not model survive in `extra`
    assert_eq!(smw.extra.get("rating").map(String::as_str), Some("0.9"));

    let eb = &entries[1];
    assert_eq!(eb.name.as_deref(), Some("Earthbound"));
    assert!(eb.description.is_none());
    assert!(eb.media.is_empty());
}

#[test]
fn test_parse_drops_pathless_game() {
    let xml = r#"<gameList><game><name>No Identity</name></game></gameList>"#;
    let entries = parse_gamelist(xml.as_bytes()).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_parse_empty_tags_stay_none() {
    let xml = r#"<gameList>
        <game>
            <path>./a.sfc</path>
            <developer></developer>
            <publisher>   </publisher>
        </game>
    </gameList>"#;
    let entries = parse_gamelist(xml.as_bytes()).unwrap();
    assert_eq!(entries[0].developer, None);
    assert_eq!(entries[0].publisher, None);
}

#[test]
fn test_parse_cdata_description() {
    let xml = r#"<gameList>
        <game>
            <path>./a.sfc</path>
            <desc><![CDATA[A game with <brackets> & ampersands]]></desc>
        </game>
    </gameList>"#;
    let entries = parse_gamelist(xml.as_bytes()).unwrap();
    assert_eq!(
        entries[0].description.as_deref(),
        Some("A game with <brackets> & ampersands")
    );
}

#[test]
fn test_write_then_parse_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let gamelist_path = dir.path().join("snes").join("gamelist.xml");

    let mut entry = GamelistEntry::new("Chrono Trigger (USA).sfc");
    entry.name = Some("Chrono Trigger".to_string());
    entry.description = Some("Time travel & frogs.".to_string());
    entry.release_date = Some("1995-03-11".to_string());
    entry.genre = Some("RPG".to_string());
    entry
        .media
        .insert(AssetKind::Cover, "../media/covers/Chrono Trigger (USA).png".to_string());
    entry.extra.insert("favorite".to_string(), "true".to_string());

    write_gamelist(&gamelist_path, &[entry.clone()]).unwrap();
    let parsed = read_gamelist(&gamelist_path).unwrap();

    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].path, entry.path);
    assert_eq!(parsed[0].name, entry.name);
    assert_eq!(parsed[0].description, entry.description);
    // Dates are normalized on write
    assert_eq!(parsed[0].release_date.as_deref(), Some("19950311T000000"));
    assert_eq!(parsed[0].media, entry.media);
    assert_eq!(parsed[0].extra, entry.extra);
}

#[test]
fn test_write_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let gamelist_path = dir.path().join("gamelist.xml");

    write_gamelist(&gamelist_path, &[GamelistEntry::new("a.sfc")]).unwrap();
    write_gamelist(&gamelist_path, &[GamelistEntry::new("b.sfc")]).unwrap();

    let parsed = read_gamelist(&gamelist_path).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].path, "./b.sfc");
    // No leftover temp file
    assert!(!dir.path().join("gamelist.xml.tmp").exists());
}

#[test]
fn test_format_esde_date() {
    assert_eq!(format_esde_date("1996-06-23"), "19960623T000000");
    assert_eq!(format_esde_date("19960623"), "19960623T000000");
    // Already normalized values pass through unchanged
    assert_eq!(format_esde_date("19960623T000000"), "19960623T000000");
    assert_eq!(format_esde_date("1996"), "1996T000000");
}

#[test]
fn test_format_esde_date_non_ascii() {
    // Garbage values from other tools must not panic mid-character.
    assert_eq!(format_esde_date("été 1996 º£¢"), "été 1996T000000");
    assert_eq!(format_esde_date("inconnu"), "inconnuT000000");
}

#[test]
fn test_escape_xml() {
    assert_eq!(escape_xml("Tom & Jerry"), "Tom &amp; Jerry");
    assert_eq!(escape_xml("a < b"), "a &lt; b");
    assert_eq!(escape_xml(r#"say "hi""#), "say &quot;hi&quot;");
}

#[test]
fn test_relative_media_path() {
    let gamelist_dir = Path::new("/library/gamelists/snes");
    let asset = Path::new("/library/downloaded_media/snes/covers/Game.png");
    assert_eq!(
        relative_media_path(gamelist_dir, asset),
        "../../downloaded_media/snes/covers/Game.png"
    );

    let inside = Path::new("/library/gamelists/snes/covers/Game.png");
    assert_eq!(relative_media_path(gamelist_dir, inside), "covers/Game.png");
}

use std::collections::HashMap;

use romshelf_frontend::AssetKind;
use serde::Deserialize;

/// Top-level response wrapper from jeuInfos.php.
#[derive(Debug, Deserialize)]
pub struct JeuInfosResponse {
    pub response: JeuInfosData,
}

#[derive(Debug, Deserialize)]
pub struct JeuInfosData {
    #[serde(default)]
    pub ssuser: Option<UserQuota>,
    pub jeu: GameInfo,
}

/// Game info from ScreenScraper. Fields use nested arrays with typed objects.
#[derive(Debug, Deserialize, Clone)]
pub struct GameInfo {
    pub id: String,
    #[serde(default)]
    pub noms: Vec<RegionText>,
    #[serde(default)]
    pub synopsis: Vec<LangueText>,
    #[serde(default)]
    pub dates: Vec<RegionText>,
    #[serde(default)]
    pub medias: Vec<Media>,
    #[serde(default)]
    pub editeur: Option<IdText>,
    #[serde(default)]
    pub developpeur: Option<IdText>,
    #[serde(default)]
    pub joueurs: Option<IdText>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl GameInfo {
    /// Distill the wire object into the fields and asset URLs the pipeline
    /// consumes. List-valued fields take the first entry, which ScreenScraper
    /// orders by its own region preference; for assets the first media of
    /// each recognized type wins.
    pub fn to_record(&self) -> RemoteRecord {
        let mut assets = HashMap::new();
        for media in &self.medias {
            if let Some(kind) = AssetKind::from_remote_name(&media.media_type) {
                assets.entry(kind).or_insert_with(|| media.url.clone());
            }
        }

        RemoteRecord {
            name: self.noms.first().map(|n| n.text.clone()),
            description: self.synopsis.first().map(|s| s.text.clone()),
            release_date: self.dates.first().map(|d| d.text.clone()),
            developer: self.developpeur.as_ref().map(|d| d.text.clone()),
            publisher: self.editeur.as_ref().map(|p| p.text.clone()),
            genre: self
                .genres
                .first()
                .and_then(|g| g.noms.first())
                .map(|n| n.text.clone()),
            players: self.joueurs.as_ref().map(|j| j.text.clone()),
            assets,
        }
    }
}

/// What the catalog knows about one title: the metadata fields we persist
/// plus a download URL per available asset kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub players: Option<String>,
    pub assets: HashMap<AssetKind, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegionText {
    pub region: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LangueText {
    pub langue: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdText {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Media {
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Genre {
    pub id: String,
    #[serde(default)]
    pub noms: Vec<LangueText>,
}

/// User info response from ssuserInfos.php.
#[derive(Debug, Deserialize)]
pub struct UserInfoResponse {
    pub response: UserInfoData,
}

#[derive(Debug, Deserialize)]
pub struct UserInfoData {
    pub ssuser: UserInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub maxthreads: Option<String>,
    #[serde(default)]
    pub requeststoday: Option<String>,
    #[serde(default)]
    pub maxrequestspermin: Option<String>,
    #[serde(default)]
    pub maxrequestsperday: Option<String>,
}

impl UserInfo {
    pub fn requests_today(&self) -> u32 {
        self.requeststoday
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    pub fn max_requests_per_day(&self) -> u32 {
        self.maxrequestsperday
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20000)
    }

    pub fn max_threads(&self) -> u32 {
        self.maxthreads
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1)
    }
}

/// Embedded user quota info returned in game lookup responses.
#[derive(Debug, Deserialize, Clone)]
pub struct UserQuota {
    #[serde(default)]
    pub requeststoday: Option<String>,
    #[serde(default)]
    pub maxrequestsperday: Option<String>,
}

impl UserQuota {
    pub fn requests_today(&self) -> u32 {
        self.requeststoday
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    pub fn max_requests_per_day(&self) -> u32 {
        self.maxrequestsperday
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_JEU_INFOS: &str = r#"{
        "response": {
            "ssuser": { "requeststoday": "42", "maxrequestsperday": "20000" },
            "jeu": {
                "id": "1234",
                "noms": [
                    { "region": "ss", "text": "Super Example World" },
                    { "region": "jp", "text": "Example Land" }
                ],
                "synopsis": [
                    { "langue": "en", "text": "An example adventure." }
                ],
                "dates": [
                    { "region": "us", "text": "1992-08-13" }
                ],
                "editeur": { "id": "1", "text": "Nintendo" },
                "developpeur": { "id": "2", "text": "Nintendo EAD" },
                "joueurs": { "text": "1-2" },
                "genres": [
                    { "id": "7", "noms": [ { "langue": "en", "text": "Platform" } ] }
                ],
                "medias": [
                    { "type": "sstitle", "url": "https://example.test/title.png", "region": "us" },
                    { "type": "box-2D", "url": "https://example.test/box.png", "region": "us" },
                    { "type": "box-2D", "url": "https://example.test/box-jp.png", "region": "jp" },
                    { "type": "ss", "url": "https://example.test/shot.png", "region": "us" }
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_jeu_infos() {
        let parsed: JeuInfosResponse = serde_json::from_str(SAMPLE_JEU_INFOS).unwrap();
        assert_eq!(parsed.response.jeu.id, "1234");
        assert_eq!(parsed.response.ssuser.unwrap().requests_today(), 42);
    }

    #[test]
    fn test_to_record_extraction() {
        let parsed: JeuInfosResponse = serde_json::from_str(SAMPLE_JEU_INFOS).unwrap();
        let record = parsed.response.jeu.to_record();

        assert_eq!(record.name.as_deref(), Some("Super Example World"));
        assert_eq!(record.description.as_deref(), Some("An example adventure."));
        assert_eq!(record.release_date.as_deref(), Some("1992-08-13"));
        assert_eq!(record.developer.as_deref(), Some("Nintendo EAD"));
        assert_eq!(record.publisher.as_deref(), Some("Nintendo"));
        assert_eq!(record.genre.as_deref(), Some("Platform"));
        assert_eq!(record.players.as_deref(), Some("1-2"));

        // First media of each recognized type wins; unknown types are ignored
        assert_eq!(
            record.assets.get(&AssetKind::Cover).map(String::as_str),
            Some("https://example.test/box.png")
        );
        assert_eq!(
            record.assets.get(&AssetKind::Screenshot).map(String::as_str),
            Some("https://example.test/shot.png")
        );
        assert!(!record.assets.contains_key(&AssetKind::Marquee));
    }

    #[test]
    fn test_to_record_tolerates_sparse_game() {
        let json = r#"{ "response": { "jeu": { "id": "9" } } }"#;
        let parsed: JeuInfosResponse = serde_json::from_str(json).unwrap();
        let record = parsed.response.jeu.to_record();
        assert_eq!(record, RemoteRecord::default());
    }
}

use serde::{Deserialize, Serialize};

/// Artist profile as listed by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub genre: Option<String>,
    pub bio: Option<String>,
    pub contact_email: Option<String>,
}

impl Artist {
    pub fn display_genre(&self) -> &str {
        self.genre.as_deref().unwrap_or("Unspecified")
    }
}

/// Payload for submitting a new artist profile.
#[derive(Debug, Clone, Serialize)]
pub struct NewArtist {
    pub name: String,
    pub genre: Option<String>,
    pub bio: Option<String>,
    pub contact_email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artist_listing() {
        let json = r#"[
            {"id": 7, "name": "The Midnight Coil", "genre": "post-rock", "bio": null, "contact_email": "band@coil.example"},
            {"id": 9, "name": "Vera Lund", "genre": null, "bio": "Solo cellist", "contact_email": null}
        ]"#;
        let artists: Vec<Artist> = serde_json::from_str(json).expect("Failed to parse artist list");
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].display_genre(), "post-rock");
        assert_eq!(artists[1].display_genre(), "Unspecified");
    }
}

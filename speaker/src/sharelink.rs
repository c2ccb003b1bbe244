//! Share link conversion
//!
//! Turns a Spotify share link (either the app URI form `spotify:track:ID`
//! or an `open.spotify.com` URL) into the URI and DIDL-Lite metadata the
//! AddURIToQueue action expects. The formats follow what the Sonos
//! controller apps emit for the Spotify music service.

/// Spotify music service number inside Sonos
const SPOTIFY_SERVICE: u32 = 2311;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    Track,
    Album,
    Playlist,
}

/// A recognized, decomposed share link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    kind: ShareKind,
    id: String,
}

impl ShareLink {
    /// Recognize a share link. Returns `None` for anything that is not a
    /// Spotify track/album/playlist reference.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        if let Some(rest) = input.strip_prefix("spotify:") {
            let (kind, id) = rest.split_once(':')?;
            return Self::build(kind, id);
        }

        for prefix in ["https://open.spotify.com/", "http://open.spotify.com/"] {
            if let Some(rest) = input.strip_prefix(prefix) {
                let mut segments = rest.splitn(2, '/');
                let kind = segments.next()?;
                let id = segments.next()?.split(['?', '/']).next()?;
                return Self::build(kind, id);
            }
        }

        None
    }

    fn build(kind: &str, id: &str) -> Option<Self> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let kind = match kind {
            "track" => ShareKind::Track,
            "album" => ShareKind::Album,
            "playlist" => ShareKind::Playlist,
            _ => return None,
        };
        Some(Self { kind, id: id.to_string() })
    }

    pub fn kind(&self) -> ShareKind {
        self.kind
    }

    /// The canonical Spotify URI with `:` percent-encoded, as Sonos wants
    /// it embedded in item ids and transport URIs.
    fn encoded_uri(&self) -> String {
        let kind = match self.kind {
            ShareKind::Track => "track",
            ShareKind::Album => "album",
            ShareKind::Playlist => "playlist",
        };
        format!("spotify%3a{}%3a{}", kind, self.id)
    }

    fn item_id(&self) -> String {
        let prefix = match self.kind {
            ShareKind::Track => "00032020",
            ShareKind::Album => "1004206c",
            ShareKind::Playlist => "1006206c",
        };
        format!("{}{}", prefix, self.encoded_uri())
    }

    /// URI for the EnqueuedURI argument
    pub fn enqueue_uri(&self) -> String {
        match self.kind {
            ShareKind::Track => format!(
                "x-sonos-spotify:{}?sid=12&flags=8224&sn=1",
                self.encoded_uri()
            ),
            ShareKind::Album | ShareKind::Playlist => {
                format!("x-rincon-cpcontainer:{}", self.item_id())
            }
        }
    }

    /// DIDL-Lite metadata for the EnqueuedURIMetaData argument
    pub fn metadata(&self) -> String {
        let upnp_class = match self.kind {
            ShareKind::Track => "object.item.audioItem.musicTrack",
            ShareKind::Album => "object.container.album.musicAlbum",
            ShareKind::Playlist => "object.container.playlistContainer",
        };
        format!(
            concat!(
                r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
                r#"xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" "#,
                r#"xmlns:r="urn:schemas-rinconnetworks-com:metadata-1-0/" "#,
                r#"xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/">"#,
                r#"<item id="{id}" restricted="true">"#,
                r#"<dc:title></dc:title>"#,
                r#"<upnp:class>{class}</upnp:class>"#,
                r#"<desc id="cdudn" nameSpace="urn:schemas-rinconnetworks-com:metadata-1-0/">"#,
                r#"SA_RINCON{svc}_X_#Svc{svc}-0-Token</desc>"#,
                r#"</item></DIDL-Lite>"#
            ),
            id = self.item_id(),
            class = upnp_class,
            svc = SPOTIFY_SERVICE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("spotify:track:6b8Be6ljOzmkOmFslEb23P", ShareKind::Track, "6b8Be6ljOzmkOmFslEb23P")]
    #[case("spotify:album:6QaVfG1pHYl1z15ZxkvVDW", ShareKind::Album, "6QaVfG1pHYl1z15ZxkvVDW")]
    #[case(
        "https://open.spotify.com/track/6b8Be6ljOzmkOmFslEb23P?si=abc123",
        ShareKind::Track,
        "6b8Be6ljOzmkOmFslEb23P"
    )]
    #[case(
        "https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M",
        ShareKind::Playlist,
        "37i9dQZF1DXcBWIGoYBM5M"
    )]
    fn recognizes_spotify_links(#[case] input: &str, #[case] kind: ShareKind, #[case] id: &str) {
        let link = ShareLink::parse(input).unwrap();
        assert_eq!(link.kind(), kind);
        assert_eq!(link.id, id);
    }

    #[rstest]
    #[case("")]
    #[case("not a link")]
    #[case("spotify:artist:4Z8W4fKeB5YxbusRsdQVPb")] // artists are not enqueueable
    #[case("https://open.spotify.com/")]
    #[case("spotify:track:")]
    #[case("https://music.apple.com/album/123")]
    fn rejects_unsupported_links(#[case] input: &str) {
        assert!(ShareLink::parse(input).is_none());
    }

    #[test]
    fn track_enqueue_uri_uses_spotify_scheme() {
        let link = ShareLink::parse("spotify:track:ABC123").unwrap();
        assert_eq!(
            link.enqueue_uri(),
            "x-sonos-spotify:spotify%3atrack%3aABC123?sid=12&flags=8224&sn=1"
        );
    }

    #[test]
    fn container_enqueue_uri_uses_cpcontainer_scheme() {
        let link = ShareLink::parse("spotify:album:XYZ9").unwrap();
        assert_eq!(
            link.enqueue_uri(),
            "x-rincon-cpcontainer:1004206cspotify%3aalbum%3aXYZ9"
        );
    }

    #[test]
    fn metadata_carries_item_id_and_service_token() {
        let link = ShareLink::parse("spotify:track:ABC123").unwrap();
        let metadata = link.metadata();
        assert!(metadata.contains(r#"<item id="00032020spotify%3atrack%3aABC123" restricted="true">"#));
        assert!(metadata.contains("object.item.audioItem.musicTrack"));
        assert!(metadata.contains("SA_RINCON2311_X_#Svc2311-0-Token"));
    }
}

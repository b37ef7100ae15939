//! Endpoint URLs of the backend's WebSocket routes.

use url::Url;

use crate::config::ConfigError;
use crate::infrastructure::auth::Credential;

/// Builds channel URLs from the backend's base WebSocket URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// `base` must be a `ws`/`wss` URL with a host. `http`/`https` are mapped to
    /// `ws`/`wss` so the same value can serve the REST and realtime clients.
    pub fn new(mut base: Url) -> Result<Self, ConfigError> {
        let scheme = match base.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        if base.host_str().is_none() {
            return Err(ConfigError::MissingHost(base.to_string()));
        }
        if base.scheme() != scheme && base.set_scheme(scheme).is_err() {
            return Err(ConfigError::UnsupportedScheme(base.scheme().to_string()));
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn parse(base: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base).map_err(|source| ConfigError::InvalidUrl {
            value: base.to_string(),
            source,
        })?;
        Self::new(url)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `/ws/realtime/?token=<credential>`
    pub fn realtime(&self, credential: &Credential) -> Url {
        let mut url = self.with_path(&["ws", "realtime", ""]);
        url.query_pairs_mut()
            .append_pair("token", credential.expose());
        url
    }

    /// `/ws/caro/rooms/`
    pub fn caro_rooms(&self) -> Url {
        self.with_path(&["ws", "caro", "rooms", ""])
    }

    /// `/ws/caro/game/<room>/`, with the room name percent-encoded as one segment.
    pub fn caro_game(&self, room_name: &str) -> Url {
        self.with_path(&["ws", "caro", "game", room_name, ""])
    }

    fn with_path(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Only fails for cannot-be-a-base URLs, which `new` rejects.
        if let Ok(mut path) = url.path_segments_mut() {
            path.clear().extend(segments);
        }
        url
    }
}

/// URL without its query string, safe to log (the realtime token lives in the query).
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::parse("ws://localhost:8000").expect("valid base")
    }

    #[test]
    fn realtime_url_carries_the_token() {
        let url = endpoints().realtime(&Credential::new("abc123"));
        assert_eq!(
            url.as_str(),
            "ws://localhost:8000/ws/realtime/?token=abc123"
        );
        assert_eq!(redacted(&url), "ws://localhost:8000/ws/realtime/");
    }

    #[test]
    fn caro_urls() {
        let endpoints = endpoints();
        assert_eq!(
            endpoints.caro_rooms().as_str(),
            "ws://localhost:8000/ws/caro/rooms/"
        );
        assert_eq!(
            endpoints.caro_game("room 1/b").as_str(),
            "ws://localhost:8000/ws/caro/game/room%201%2Fb/"
        );
    }

    #[test]
    fn http_schemes_map_to_websocket_schemes() {
        let secure = Endpoints::parse("https://play.example.com").expect("valid base");
        assert_eq!(secure.base().scheme(), "wss");

        let plain = Endpoints::parse("http://play.example.com").expect("valid base");
        assert_eq!(plain.base().scheme(), "ws");
    }

    #[test]
    fn rejects_unusable_bases() {
        assert!(matches!(
            Endpoints::parse("ftp://example.com"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            Endpoints::parse("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }
}

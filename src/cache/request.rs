use reqwest::Url;

const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "opus", "ogg", "m4a", "aac"];
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// An outgoing asset request as seen by the cache worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub accept: Option<String>,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".into(),
            url,
            accept: None,
        }
    }

    /// A page navigation: a GET that accepts HTML.
    pub fn navigate(url: Url) -> Self {
        Self {
            accept: Some("text/html,application/xhtml+xml".into()),
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn key(&self) -> &str {
        self.url.as_str()
    }

    pub fn same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }

    pub fn class(&self) -> AssetClass {
        AssetClass::of(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, body).with_header("Content-Type", "text/plain")
    }

    /// The response handed out when neither network nor cache can serve.
    pub fn network_error() -> Self {
        Self::text(408, "Network error occurred")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 2xx, the only responses the cache ever stores.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Which caching policy a request falls under.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssetClass {
    Audio,
    Image,
    Navigation,
    Other,
}

impl AssetClass {
    pub fn of(request: &Request) -> Self {
        let ext = extension(request.url.path());
        if let Some(ext) = ext.as_deref() {
            if AUDIO_EXTENSIONS.contains(&ext) {
                return AssetClass::Audio;
            }
            if IMAGE_EXTENSIONS.contains(&ext) {
                return AssetClass::Image;
            }
        }
        if request
            .accept
            .as_deref()
            .is_some_and(|a| a.contains("text/html"))
        {
            return AssetClass::Navigation;
        }
        AssetClass::Other
    }
}

fn extension(path: &str) -> Option<String> {
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

//! Access-controlled attachment links and download selection.

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Anonymous,
    User {
        username: String,
    },
}

impl Principal {
    pub fn user(username: impl Into<String>) -> Self {
        Self::User {
            username: username.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::User { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::User { username } => Some(username),
        }
    }
}

/// Scheme and host the request arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    scheme: String,
    host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn base(&self) -> Result<Url, AttachmentUrlError> {
        let invalid = |reason: String| AttachmentUrlError::InvalidOrigin {
            origin: format!("{}://{}", self.scheme, self.host),
            reason,
        };
        let authority = Authority::parse(&self.host)
            .ok_or_else(|| invalid("host is not a bare host[:port]".to_string()))?;
        Url::parse(&format!("{}://{authority}/", self.scheme)).map_err(|err| invalid(err.to_string()))
    }
}

/// A bare `host[:port]`, as carried by the `Host` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    host: String,
    port: Option<u16>,
}

impl Authority {
    /// Parse `raw`, refusing anything beyond `host[:port]` (userinfo, paths,
    /// queries, fragments, escapes).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        if raw.is_empty() || raw.contains(['@', '/', '\\', '?', '#', '%', ' ']) {
            return None;
        }
        let url = Url::parse(&format!("authority://{raw}/")).ok()?;
        let authority = Self {
            host: url.host_str().filter(|host| !host.is_empty())?.to_string(),
            port: url.port(),
        };
        (authority.to_string() == raw).then_some(authority)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Match against an allowed-host entry. `.example.org` covers the domain
    /// and its subdomains; an entry without a port accepts any port.
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.trim().to_ascii_lowercase();
        if let Some(domain) = pattern.strip_prefix('.') {
            return self.host == domain || self.host.ends_with(&pattern);
        }
        match Authority::parse(&pattern) {
            Some(entry) => {
                self.host == entry.host && entry.port.is_none_or(|port| self.port == Some(port))
            }
            None => false,
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.host),
            None => f.write_str(&self.host),
        }
    }
}

/// Where uploaded files live on disk and under which URL prefix they are served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocation {
    pub root: PathBuf,
    pub url: String,
}

impl From<&crate::config::MediaSettings> for MediaLocation {
    fn from(settings: &crate::config::MediaSettings) -> Self {
        Self {
            root: settings.root.clone(),
            url: settings.url.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentUrlError {
    #[error("attachment path `{path}` is outside the media root")]
    OutsideMediaRoot { path: String },
    #[error("attachment path is empty")]
    EmptyPath,
    #[error("request origin `{origin}` is not a valid URL base: {reason}")]
    InvalidOrigin { origin: String, reason: String },
    #[error("media URL `{url}` cannot be resolved: {reason}")]
    InvalidMediaUrl { url: String, reason: String },
}

/// Absolute URL of an attachment for an authenticated principal, `""` otherwise.
pub fn resolve_attachment_url(
    stored_path: &str,
    media: &MediaLocation,
    origin: &RequestOrigin,
    principal: &Principal,
) -> Result<String, AttachmentUrlError> {
    if !principal.is_authenticated() {
        return Ok(String::new());
    }

    let relative = relative_to_media_root(stored_path, &media.root)?;
    let prefix = media.url.trim_end_matches('/');
    let joined = format!("{prefix}/{relative}");

    let resolved = origin
        .base()?
        .join(&joined)
        .map_err(|err| AttachmentUrlError::InvalidMediaUrl {
            url: joined.clone(),
            reason: err.to_string(),
        })?;
    Ok(resolved.to_string())
}

/// Normalized `/`-separated path of `stored_path` below `root`.
fn relative_to_media_root(stored_path: &str, root: &Path) -> Result<String, AttachmentUrlError> {
    let outside = || AttachmentUrlError::OutsideMediaRoot {
        path: stored_path.to_string(),
    };

    let path = Path::new(stored_path);
    let relative = if path.is_absolute() {
        path.strip_prefix(root).map_err(|_| outside())?
    } else {
        path
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(escape_segment(&segment.to_string_lossy())),
            Component::CurDir => {}
            Component::ParentDir => {
                segments.pop().ok_or_else(outside)?;
            }
            Component::RootDir | Component::Prefix(_) => return Err(outside()),
        }
    }

    if segments.is_empty() {
        return Err(AttachmentUrlError::EmptyPath);
    }
    Ok(segments.join("/"))
}

fn escape_segment(segment: &str) -> String {
    segment
        .replace('%', "%25")
        .replace('?', "%3F")
        .replace('#', "%23")
}

/// Extensions offered individually on the download form.
pub const DEFAULT_DOWNLOAD_TYPES: [&str; 7] = ["mei", "xml", "midi", "pdf", "krn", "mid", "mxl"];

/// Token selecting every extension outside [`DEFAULT_DOWNLOAD_TYPES`].
pub const OTHERS_TOKEN: &str = "others";

/// Extension filter built from the requested type tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadFilter {
    extensions: HashSet<String>,
    others: bool,
}

impl DownloadFilter {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();
        for token in tokens {
            let token = token.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            match token.as_str() {
                "" => {}
                OTHERS_TOKEN => filter.others = true,
                "midi" => {
                    filter.extensions.insert("midi".to_string());
                    filter.extensions.insert("mid".to_string());
                }
                "xml" => {
                    filter.extensions.insert("xml".to_string());
                    filter.extensions.insert("mxl".to_string());
                }
                _ => {
                    filter.extensions.insert(token);
                }
            }
        }
        filter
    }

    /// Whether a file with `extension` belongs in the bundle.
    pub fn matches(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        if self.extensions.contains(&extension) {
            return true;
        }
        self.others && !DEFAULT_DOWNLOAD_TYPES.contains(&extension.as_str())
    }
}

/// One file of a download bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadEntry {
    pub id: i64,
    pub file_name: String,
    pub extension: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> MediaLocation {
        MediaLocation {
            root: PathBuf::from("/media/"),
            url: "/static/media/".to_string(),
        }
    }

    fn origin() -> RequestOrigin {
        RequestOrigin::new("https", "example.org")
    }

    fn user() -> Principal {
        Principal::user("lmiller")
    }

    #[test]
    fn anonymous_gets_empty_string_even_for_bad_paths() {
        let url = resolve_attachment_url("scores/piece1.pdf", &media(), &origin(), &Principal::Anonymous)
            .expect("anonymous never fails");
        assert_eq!(url, "");

        let url = resolve_attachment_url("../../etc/passwd", &media(), &origin(), &Principal::Anonymous)
            .expect("anonymous never fails");
        assert_eq!(url, "");
    }

    #[test]
    fn relative_path_resolves_under_media_url() {
        let url = resolve_attachment_url("scores/piece1.pdf", &media(), &origin(), &user())
            .expect("resolves");
        assert_eq!(url, "https://example.org/static/media/scores/piece1.pdf");
    }

    #[test]
    fn absolute_path_under_root_resolves() {
        let url = resolve_attachment_url("/media/scores/piece1.pdf", &media(), &origin(), &user())
            .expect("resolves");
        assert_eq!(url, "https://example.org/static/media/scores/piece1.pdf");
    }

    #[test]
    fn media_url_without_trailing_slash_joins_with_single_slash() {
        let media = MediaLocation {
            root: PathBuf::from("/media"),
            url: "/static/media".to_string(),
        };
        let url = resolve_attachment_url("./scores/a.mei", &media, &origin(), &user()).expect("resolves");
        assert_eq!(url, "https://example.org/static/media/scores/a.mei");
    }

    #[test]
    fn absolute_media_url_is_kept() {
        let media = MediaLocation {
            root: PathBuf::from("/media"),
            url: "https://cdn.example.net/elvis/".to_string(),
        };
        let url = resolve_attachment_url("x.krn", &media, &origin(), &user()).expect("resolves");
        assert_eq!(url, "https://cdn.example.net/elvis/x.krn");
    }

    #[test]
    fn paths_escaping_the_root_are_rejected() {
        let err = resolve_attachment_url("../secret.pdf", &media(), &origin(), &user())
            .expect_err("parent traversal rejected");
        assert!(matches!(err, AttachmentUrlError::OutsideMediaRoot { .. }));

        let err = resolve_attachment_url("/srv/other/file.pdf", &media(), &origin(), &user())
            .expect_err("foreign absolute path rejected");
        assert!(matches!(err, AttachmentUrlError::OutsideMediaRoot { .. }));
    }

    #[test]
    fn parent_segments_inside_the_root_are_normalised() {
        let url = resolve_attachment_url("scores/../piece1.pdf", &media(), &origin(), &user())
            .expect("stays under the root");
        assert_eq!(url, "https://example.org/static/media/piece1.pdf");

        let url = resolve_attachment_url("/media/a/b/../../scores/c.mei", &media(), &origin(), &user())
            .expect("stays under the root");
        assert_eq!(url, "https://example.org/static/media/scores/c.mei");

        let err = resolve_attachment_url("scores/../../piece1.pdf", &media(), &origin(), &user())
            .expect_err("climbs above the root");
        assert!(matches!(err, AttachmentUrlError::OutsideMediaRoot { .. }));
    }

    #[test]
    fn origin_hosts_carrying_more_than_an_authority_are_refused() {
        for host in ["example.org@evil.test", "evil.test/x?", "evil.test#frag", "evil%2etest"] {
            let err = resolve_attachment_url("a.pdf", &media(), &RequestOrigin::new("https", host), &user())
                .expect_err("hostile host rejected");
            assert!(matches!(err, AttachmentUrlError::InvalidOrigin { .. }), "{host}");
        }

        let url = resolve_attachment_url("a.pdf", &media(), &RequestOrigin::new("http", "Example.org:8080"), &user())
            .expect("plain authority");
        assert_eq!(url, "http://example.org:8080/static/media/a.pdf");
    }

    #[test]
    fn authority_parsing_and_allow_list_matching() {
        let authority = Authority::parse("Music.Example.net:8080").expect("authority");
        assert_eq!(authority.host(), "music.example.net");
        assert_eq!(authority.port(), Some(8080));
        assert_eq!(authority.to_string(), "music.example.net:8080");

        assert!(authority.matches(".example.net"));
        assert!(authority.matches("music.example.net"));
        assert!(authority.matches("music.example.net:8080"));
        assert!(!authority.matches("music.example.net:9090"));
        assert!(!authority.matches("example.net"));
        assert!(!authority.matches(".example.org"));

        assert!(Authority::parse("example.org:").is_none());
        assert!(Authority::parse("user@example.org").is_none());
        assert!(Authority::parse("").is_none());
    }

    #[test]
    fn reserved_characters_in_file_names_are_escaped() {
        let url = resolve_attachment_url("scores/what?#.pdf", &media(), &origin(), &user())
            .expect("resolves");
        assert_eq!(url, "https://example.org/static/media/scores/what%3F%23.pdf");
    }

    #[test]
    fn invalid_origin_is_reported() {
        let err = resolve_attachment_url("a.pdf", &media(), &RequestOrigin::new("https", ""), &user())
            .expect_err("empty host rejected");
        assert!(matches!(err, AttachmentUrlError::InvalidOrigin { .. }));
    }

    #[test]
    fn download_filter_aliases() {
        let filter = DownloadFilter::from_tokens(["midi", "XML"]);
        assert!(filter.matches("mid"));
        assert!(filter.matches("MIDI"));
        assert!(filter.matches("mxl"));
        assert!(filter.matches("xml"));
        assert!(!filter.matches("pdf"));
    }

    #[test]
    fn download_filter_others_excludes_default_types() {
        let filter = DownloadFilter::from_tokens(["OTHERS"]);
        assert!(filter.matches("abc"));
        assert!(filter.matches(""));
        assert!(!filter.matches("pdf"));
        assert!(!filter.matches("mid"));

        let combined = DownloadFilter::from_tokens(["pdf", "OTHERS"]);
        assert!(combined.matches("pdf"));
        assert!(combined.matches("abc"));
        assert!(!combined.matches("mei"));
    }
}

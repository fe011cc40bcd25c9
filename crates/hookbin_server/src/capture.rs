//! Inbound capture-request parsing.

use hookbin_model::{now_ms, Entry};

/// A raw inbound request hitting the capture endpoint.
///
/// The surrounding HTTP layer fills this in verbatim; parsing into an
/// [`Entry`] happens here so the capture endpoint stays framework-agnostic.
#[derive(Debug, Clone, Default)]
pub struct CaptureRequest {
    /// HTTP method, any verb.
    pub method: String,
    /// Full request path, including the webhook prefix.
    pub path: String,
    /// Raw query string without the leading `?`, if any.
    pub query_string: Option<String>,
    /// Header pairs as delivered by the transport. Duplicate keys collapse
    /// last-writer-wins.
    pub headers: Vec<(String, String)>,
    /// Raw body text, if any.
    pub body: Option<String>,
    /// Remote address of the sender, if known.
    pub remote_addr: Option<String>,
}

impl CaptureRequest {
    /// Builds the entry for this request, received now.
    ///
    /// The channel is the path remainder after `prefix`, with surrounding
    /// slashes trimmed; an empty remainder means no channel. Colon-prefixed
    /// pseudo-headers are excluded from the captured header map.
    #[must_use]
    pub fn into_entry(self, prefix: &str) -> Entry {
        let channel = channel_from_path(&self.path, prefix);

        let mut entry = Entry::new(self.method, self.path, now_ms());
        entry.channel = channel;
        entry.query_string = self.query_string.filter(|q| !q.is_empty());
        entry.source_ip = self.remote_addr;

        for (name, value) in self.headers {
            if name.starts_with(':') {
                continue;
            }
            if name.eq_ignore_ascii_case("content-type") {
                entry.content_type = Some(value.clone());
            }
            entry.headers.insert(name, value);
        }

        if let Some(body) = self.body {
            entry = entry.with_body(body);
        }
        entry
    }
}

fn channel_from_path(path: &str, prefix: &str) -> Option<String> {
    let remainder = path.strip_prefix(prefix)?;
    // The prefix must end on a segment boundary: `/webhookxyz` is not
    // under the `/webhook` prefix.
    if !remainder.is_empty() && !remainder.starts_with('/') {
        return None;
    }
    let channel = remainder.trim_matches('/');
    if channel.is_empty() {
        None
    } else {
        Some(channel.to_owned())
    }
}

//! Photo inlining.
//!
//! The registry returns person photos as URLs pointing at its own asset
//! host. The verification result embeds a self-contained copy instead,
//! so client systems can render the photo without a second authenticated
//! fetch. Inlining failures are reported to the caller, who keeps the
//! original reference; they never fail the verification.

use std::time::Instant;

use base64::Engine as _;
use url::Url;

use crate::error::AssetError;

/// Image extensions recognized on an asset URL path.
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// A fetched asset encoded for inline embedding.
///
/// Self-describing: the content type travels with the payload so
/// downstream consumers can render it without extra metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    /// MIME type reported by the origin, or guessed from the URL
    /// extension when the origin sent none.
    pub content_type: String,
    /// Base64-encoded asset bytes.
    pub base64: String,
}

impl EncodedAsset {
    /// Render as a self-describing `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.base64)
    }
}

/// Validate that `raw` is an http(s) URL whose path carries a recognized
/// image extension. No network I/O happens here; anything else is
/// rejected before a fetch is attempted.
pub fn validate_asset_url(raw: &str) -> Result<Url, AssetError> {
    let url = Url::parse(raw).map_err(|e| AssetError::InvalidUrl {
        reason: format!("{raw:?}: {e}"),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AssetError::InvalidUrl {
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }

    let path = url.path().to_ascii_lowercase();
    let recognized = path
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext));
    if !recognized {
        return Err(AssetError::InvalidUrl {
            reason: format!("path {:?} has no recognized image extension", url.path()),
        });
    }

    Ok(url)
}

/// Fetch `raw_url` and produce a base64-encoded inline copy.
///
/// The shared client's request timeout bounds the fetch (30 s in the
/// default configuration); exceeding it is a failure, not a hang.
pub async fn inline(http: &reqwest::Client, raw_url: &str) -> Result<EncodedAsset, AssetError> {
    let url = validate_asset_url(raw_url)?;
    let started = Instant::now();

    let resp = http.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            AssetError::Timeout {
                elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            AssetError::Fetch {
                reason: format!("{url}: {e}"),
            }
        }
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(AssetError::Fetch {
            reason: format!("{url}: HTTP {status}"),
        });
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| guess_content_type(url.path()));

    let bytes = resp.bytes().await.map_err(|e| AssetError::Fetch {
        reason: format!("{url}: {e}"),
    })?;
    if bytes.is_empty() {
        return Err(AssetError::InvalidContent {
            reason: format!("{url}: empty body"),
        });
    }

    Ok(EncodedAsset {
        content_type,
        base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
    })
}

/// Map a URL extension to a MIME type, for origins that omit the
/// Content-Type header.
fn guess_content_type(path: &str) -> String {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let mime = match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

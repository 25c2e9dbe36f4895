use serde_derive::{Deserialize, Serialize};

pub const METADATA_URL: &str = "https://www.googleapis.com/drive/v3/files";
pub const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
pub const TOKEN_INFO_URL: &str = "https://www.googleapis.com/oauth2/v1/tokeninfo";
pub const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

pub const SCOPE: &str =
    "https://www.googleapis.com/auth/drive.file https://www.googleapis.com/auth/drive.appdata";

/// The private per-application space every metadata request is scoped to.
pub const APP_DATA_FOLDER: &str = "appDataFolder";

/// Base urls of the remote api. Content updates must go through `upload`,
/// everything else through `metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub metadata: String,
    pub upload: String,
    pub token_info: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            metadata: METADATA_URL.to_string(),
            upload: UPLOAD_URL.to_string(),
            token_info: TOKEN_INFO_URL.to_string(),
        }
    }
}

/// Join `base`, an optional file id path segment and optional query params.
/// An empty `params` slice adds no query string.
pub fn build_url(base: &str, id: Option<&str>, params: &[(&str, &str)]) -> String {
    let mut url = base.to_owned();
    if let Some(id) = id {
        url.push('/');
        url.push_str(&urlencoding::encode(id));
    }
    if !params.is_empty() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        url.push('?');
        url.push_str(&query);
    }
    url
}

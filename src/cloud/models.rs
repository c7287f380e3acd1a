// remote2local/src/cloud/models.rs
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub distribution_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default)]
    pub id: Option<String>,
    pub environment_id: String,
    pub created_at: String,
}

/// List payloads come either wrapped in `items` or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Wrapped { items: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Wrapped { items } => items,
            Listing::Bare(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadLink {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadToken {
    pub token: String,
}

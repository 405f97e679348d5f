use serde::{Deserialize, Serialize};

/// JSON body returned by `POST /masspay/api/upload` whenever the request does
/// not end in a downloadable artifact.
///
/// A successful upload is answered with the artifact itself, so in practice the
/// backend only sends this shape with `success == false`. `file_url` stays in the
/// model for clients that still read it and is omitted from the JSON when unset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    pub success: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_url: Option<String>,
}

impl UploadResponse {
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            msg: msg.into(),
            file_url: None,
        }
    }
}

//! Wire types of the HTTP API.

use serde::{Deserialize, Serialize};

/// Body of `POST /query`.
#[derive(Deserialize, Debug)]
pub struct QueryRequest {
    pub prompt: String,
}

/// Reply text plus the icon of the coin now in focus (empty if none).
#[derive(Serialize, Deserialize, Debug)]
pub struct QueryResponse {
    pub response: String,
    pub icon_url: String,
}

/// Body of every 500 response.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub detail: String,
}

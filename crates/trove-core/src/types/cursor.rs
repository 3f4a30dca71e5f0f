//! Opaque cursor tokens for cursor-based pagination.
//!
//! A token records where a sorted scan stopped: the value of the
//! paginated field and the `_id` of the boundary document. The encoding
//! (URL-safe base64 over a small BSON document) is private to this
//! module and may change between releases.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

const VALUE_KEY: &str = "v";
const ID_KEY: &str = "id";

/// Opaque pagination cursor handed to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorToken(String);

/// Decoded position of a cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorPosition {
    /// Value of the paginated field at the boundary document.
    pub value: Bson,
    /// `_id` of the boundary document.
    pub id: Bson,
}

impl CursorToken {
    /// Encode a boundary position into a token.
    pub fn encode(value: &Bson, id: &Bson) -> AppResult<Self> {
        let mut position = Document::new();
        position.insert(VALUE_KEY, value.clone());
        position.insert(ID_KEY, id.clone());
        let mut bytes = Vec::new();
        position.to_writer(&mut bytes).map_err(|e| {
            AppError::with_source(ErrorKind::Repository, "Failed to encode cursor", e)
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Decode the boundary position held by this token.
    pub fn decode(&self) -> AppResult<CursorPosition> {
        let bytes = URL_SAFE_NO_PAD.decode(self.0.as_bytes()).map_err(|e| {
            AppError::with_source(ErrorKind::Repository, "Malformed cursor token", e)
        })?;
        let mut position = Document::from_reader(bytes.as_slice()).map_err(|e| {
            AppError::with_source(ErrorKind::Repository, "Malformed cursor token", e)
        })?;

        let (Some(value), Some(id)) = (position.remove(VALUE_KEY), position.remove(ID_KEY)) else {
            return Err(AppError::repository("Cursor token is missing its position"));
        };
        Ok(CursorPosition { value, id })
    }

    /// Return the token as handed to callers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CursorToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for CursorToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

//! The owner identity forwarded by the external auth layer.
//!
//! The core trusts an opaque owner ID resolved upstream (session cookie,
//! reverse proxy, whatever the deployment uses) and forwarded in the
//! `X-User-Id` header. It never issues or validates credentials.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::Error;

/// The request header carrying the resolved owner ID.
pub const OWNER_ID_HEADER: &str = "x-user-id";

/// An opaque ID identifying the owner of the records a request may touch.
///
/// Extracting this from a request fails with [Error::Unauthorized] when the
/// header is missing or empty, so handlers taking an [OwnerId] never run
/// for anonymous requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap a raw owner ID string.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The raw owner ID, as stored in the `owner_id` columns.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(OWNER_ID_HEADER)
            .ok_or(Error::Unauthorized)?;

        let owner_id = header_value
            .to_str()
            .map_err(|_| Error::Unauthorized)?
            .trim();

        if owner_id.is_empty() {
            return Err(Error::Unauthorized);
        }

        Ok(OwnerId::new(owner_id))
    }
}

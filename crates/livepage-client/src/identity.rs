//! Page identity token.

use std::fmt;

use livepage_dom::LiveDom;

use crate::error::ClientError;

/// Default `<head>` attribute carrying the article's destination filename.
pub const DEFAULT_IDENTITY_ATTRIBUTE: &str = "data-article-dst-filename";

/// Identifies which article a client wants live updates for.
///
/// Read from a `data-*` attribute on the document head at the moment the
/// connection opens, and sent as the first message of every connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// Read the token from `attribute` on `head`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingIdentity`] if there is no head, the
    /// attribute is absent, or its value is blank.
    pub fn read<D: LiveDom>(
        dom: &D,
        head: Option<&D::Node>,
        attribute: &str,
    ) -> Result<Self, ClientError> {
        head.and_then(|head| dom.attribute(head, attribute))
            .filter(|value| !value.trim().is_empty())
            .map(Self)
            .ok_or_else(|| ClientError::MissingIdentity {
                attribute: attribute.to_owned(),
            })
    }

    /// The token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

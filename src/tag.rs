use std::{borrow::Borrow, ops::Deref};

use derive_more::Display;
use ref_cast::{ref_cast_custom, RefCastCustom};

use crate::TagCodec;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("`{token}` is not a valid tag: tags cannot be empty or contain any of `{delims}`")]
pub struct InvalidTagError {
    token: String,
    delims: String,
}

impl InvalidTagError {
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(String);

#[derive(Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, RefCastCustom)]
#[repr(transparent)]
pub struct TagRef(str);

impl Tag {
    /// Validate `s` against the delimiters of `codec`.
    pub fn new(s: String, codec: &TagCodec) -> Result<Tag, InvalidTagError> {
        if codec.is_valid_tag(&s) {
            Ok(Tag(s))
        } else {
            Err(InvalidTagError {
                token: s,
                delims: codec.delims().to_owned(),
            })
        }
    }

    /// `s` must be non-empty and free of delimiters.
    pub(crate) fn new_unchecked(s: String) -> Tag {
        debug_assert!(!s.is_empty());
        Tag(s)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TagRef {
    #[ref_cast_custom]
    pub(crate) const fn new(s: &str) -> &Self;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Tag {
    type Target = TagRef;

    fn deref(&self) -> &Self::Target {
        self.borrow()
    }
}

impl AsRef<TagRef> for Tag {
    fn as_ref(&self) -> &TagRef {
        self.borrow()
    }
}

impl AsRef<TagRef> for TagRef {
    fn as_ref(&self) -> &TagRef {
        self
    }
}

impl Borrow<TagRef> for Tag {
    fn borrow(&self) -> &TagRef {
        TagRef::new(self.0.as_str())
    }
}

impl ToOwned for TagRef {
    type Owned = Tag;

    fn to_owned(&self) -> Self::Owned {
        Tag(self.0.to_owned())
    }
}

//! Access to the members of a replay container.
//!
//! Reading the container format itself is left to the caller. Anything that
//! can hand out the user-data block and named members implements
//! [`ReplayArchive`]; [`MemoryArchive`] does so for buffers already in
//! memory.

use std::borrow::Cow;
use std::collections::HashMap;

/// Errors raised while fetching archive content.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// No member with this name exists.
    #[error("archive has no member `{0}`")]
    MissingMember(String),

    /// The archive has no user-data block, so no replay header.
    #[error("archive has no user data")]
    MissingUserData,

    /// The backing store failed.
    #[error("reading `{member}`: {source}")]
    Io {
        member: String,
        #[source]
        source: std::io::Error,
    },
}

/// A source of replay members.
pub trait ReplayArchive {
    /// The user-data block, after its 16-byte preamble. Holds the
    /// versioned replay header.
    fn user_data(&self) -> Result<Cow<'_, [u8]>, ArchiveError>;

    /// The full content of a named member, e.g. `"replay.details"`.
    fn read_member(&self, name: &str) -> Result<Cow<'_, [u8]>, ArchiveError>;
}

impl<A: ReplayArchive + ?Sized> ReplayArchive for &A {
    fn user_data(&self) -> Result<Cow<'_, [u8]>, ArchiveError> {
        (**self).user_data()
    }

    fn read_member(&self, name: &str) -> Result<Cow<'_, [u8]>, ArchiveError> {
        (**self).read_member(name)
    }
}

/// An archive whose members are held in memory.
///
/// ```rust
/// use replaycodec::{MemoryArchive, ReplayArchive};
///
/// let archive = MemoryArchive::new(vec![0x05, 0x00])
///     .with_member("replay.details", vec![0x05, 0x00]);
///
/// assert_eq!(archive.read_member("replay.details").unwrap().len(), 2);
/// assert!(archive.read_member("replay.initData").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    user_data: Option<Vec<u8>>,
    members: HashMap<String, Vec<u8>>,
}

impl MemoryArchive {
    /// Creates an archive with the given user data and no members.
    pub fn new(user_data: Vec<u8>) -> Self {
        Self {
            user_data: Some(user_data),
            members: HashMap::new(),
        }
    }

    /// Adds or replaces a member.
    pub fn with_member(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.members.insert(name.into(), data);
    }

    pub fn set_user_data(&mut self, data: Vec<u8>) {
        self.user_data = Some(data);
    }

    /// Member names, in no particular order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

impl ReplayArchive for MemoryArchive {
    fn user_data(&self) -> Result<Cow<'_, [u8]>, ArchiveError> {
        self.user_data
            .as_deref()
            .map(Cow::Borrowed)
            .ok_or(ArchiveError::MissingUserData)
    }

    fn read_member(&self, name: &str) -> Result<Cow<'_, [u8]>, ArchiveError> {
        self.members
            .get(name)
            .map(|data| Cow::Borrowed(data.as_slice()))
            .ok_or_else(|| ArchiveError::MissingMember(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_archive_is_empty() {
        let archive = MemoryArchive::default();
        assert!(matches!(
            archive.user_data(),
            Err(ArchiveError::MissingUserData)
        ));
        assert_eq!(archive.member_names().count(), 0);
    }

    #[test]
    fn test_members_are_borrowed() {
        let mut archive = MemoryArchive::new(vec![1, 2, 3]);
        archive.insert("replay.initData", vec![9]);
        assert!(matches!(
            archive.read_member("replay.initData").unwrap(),
            Cow::Borrowed(&[9])
        ));
        assert_eq!(&*archive.user_data().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_reference_is_an_archive() {
        fn first_byte(archive: impl ReplayArchive) -> u8 {
            let data = archive.user_data().unwrap();
            data[0]
        }
        let archive = MemoryArchive::new(vec![7]);
        assert_eq!(first_byte(&archive), 7);
        assert_eq!(first_byte(&archive), 7);
    }
}

//! Object directory client.

use tracing::{debug, warn};

use crate::backend::DirectoryService;
use crate::error::BusError;
use crate::tree::ObjectTree;

const DIRECTORY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::directory");

/// Depth passed to subtree queries; zero leaves traversal to the directory.
const UNRESTRICTED_DEPTH: i32 = 0;

/// An object path paired with the service that serves it.
///
/// Produced per lookup and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedObject {
    /// Object path.
    pub path: String,
    /// Owning service.
    pub service: String,
}

/// Finds objects implementing an interface beneath a search root.
///
/// Results follow the order returned by the directory. When several objects
/// implement the same interface, the first one returned wins unless a path
/// substring narrows the choice.
#[derive(Debug, Clone, Copy)]
pub struct ObjectDirectory<'a, D: ?Sized> {
    directory: &'a D,
}

impl<'a, D> ObjectDirectory<'a, D>
where
    D: DirectoryService + ?Sized,
{
    /// Wraps a directory backend.
    #[must_use]
    pub const fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Returns every object under `root` implementing `interface`.
    ///
    /// # Errors
    ///
    /// Propagates the directory failure.
    pub fn subtree(&self, interface: &str, root: &str) -> Result<ObjectTree, BusError> {
        let interfaces = [interface.to_owned()];
        self.directory
            .get_sub_tree(root, UNRESTRICTED_DEPTH, &interfaces)
            .inspect_err(|error| {
                warn!(
                    target: DIRECTORY_TARGET,
                    interface,
                    root,
                    %error,
                    "subtree query failed"
                );
            })
    }

    /// Locates the object implementing `interface` under `root`.
    ///
    /// Without a pattern (or with an empty one) the first object returned by
    /// the directory is chosen. With a pattern, the first object whose path
    /// contains it is chosen. Either way the first service offered for that
    /// path is paired with it. Objects advertising no service are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NoImplementation`] when nothing implements the
    /// interface, [`BusError::NoMatch`] when no path contains the pattern, or
    /// the directory failure itself.
    pub fn locate(
        &self,
        interface: &str,
        root: &str,
        pattern: Option<&str>,
    ) -> Result<ResolvedObject, BusError> {
        let tree = self.subtree(interface, root)?;
        if tree.is_empty() {
            warn!(
                target: DIRECTORY_TARGET,
                interface,
                root,
                "no object implements interface"
            );
            return Err(BusError::no_implementation(interface, root));
        }

        let pattern = pattern.filter(|text| !text.is_empty());
        let found = tree.iter().find_map(|entry| {
            let matches = pattern.is_none_or(|text| entry.path.contains(text));
            if !matches {
                return None;
            }
            entry.first_service().map(|service| ResolvedObject {
                path: entry.path.clone(),
                service: service.to_owned(),
            })
        });

        match found {
            Some(object) => {
                debug!(
                    target: DIRECTORY_TARGET,
                    interface,
                    path = %object.path,
                    service = %object.service,
                    "resolved object"
                );
                Ok(object)
            }
            None => {
                let pattern = pattern.unwrap_or_default();
                warn!(
                    target: DIRECTORY_TARGET,
                    interface,
                    root,
                    pattern,
                    "no object path matches"
                );
                Err(BusError::no_match(interface, root, pattern))
            }
        }
    }
}

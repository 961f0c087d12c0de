use std::path::{Path, PathBuf};

use futures_util::future::{BoxFuture, FutureExt};

use crate::foundation::error::{BoardError, BoardResult, LoadError};

/// Resolves a locator to raw bytes.
///
/// Implementations must not block: return a future and do the I/O inside it.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, locator: &str) -> BoxFuture<'static, Result<Vec<u8>, LoadError>>;
}

/// Adapts a closure into a [`Fetch`].
pub struct FnFetcher<F>(pub F);

impl<F> Fetch for FnFetcher<F>
where
    F: Fn(&str) -> BoxFuture<'static, Result<Vec<u8>, LoadError>> + Send + Sync + 'static,
{
    fn fetch(&self, locator: &str) -> BoxFuture<'static, Result<Vec<u8>, LoadError>> {
        (self.0)(locator)
    }
}

/// Reads locators as paths relative to a root directory; `file://` prefixes are accepted.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, locator: &str) -> BoardResult<PathBuf> {
        let rel = locator.strip_prefix("file://").unwrap_or(locator);
        Ok(self.root.join(normalize_rel_path(rel)?))
    }
}

impl Fetch for FsFetcher {
    fn fetch(&self, locator: &str) -> BoxFuture<'static, Result<Vec<u8>, LoadError>> {
        let locator = locator.to_owned();
        let path = self.resolve(&locator);
        async move {
            let path = path.map_err(|e| LoadError::fetch(&locator, e))?;
            tokio::fs::read(&path)
                .await
                .map_err(|e| LoadError::fetch(&locator, format!("read '{}': {e}", path.display())))
        }
        .boxed()
    }
}

/// Normalize a relative locator: forward slashes, no `.` segments, no escapes above the root.
pub fn normalize_rel_path(source: &str) -> BoardResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(BoardError::validation("locators must be relative"));
    }
    if s.is_empty() {
        return Err(BoardError::validation("locator must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(BoardError::validation("locators must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(BoardError::validation("locator must contain a file name"));
    }

    Ok(out.join("/"))
}

use std::path::Path;

use glob::Pattern;

use crate::error::ConfigError;
use crate::{ChangeEvent, ChangeKind};

/// Decides whether a change notification is worth acting on.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    mask: ChangeKind,
    globs: Vec<Pattern>,
}

impl ChangeFilter {
    pub fn new(mask: ChangeKind, globs: Vec<Pattern>) -> Self {
        Self { mask, globs }
    }

    /// Compile glob strings, failing on the first malformed pattern.
    pub fn with_globs<S: AsRef<str>>(mask: ChangeKind, globs: &[S]) -> Result<Self, ConfigError> {
        let globs = globs
            .iter()
            .map(|glob| {
                let glob = glob.as_ref();
                Pattern::new(&shell_glob(glob)).map_err(|source| ConfigError::InvalidGlob {
                    pattern: glob.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(mask, globs))
    }

    pub fn mask(&self) -> ChangeKind {
        self.mask
    }

    pub fn globs(&self) -> &[Pattern] {
        &self.globs
    }

    /// The event's kind must fit entirely inside the mask, and with globs
    /// configured its base name has to match at least one of them.
    pub fn admit(&self, event: &ChangeEvent) -> bool {
        event.kind.is_subset_of(self.mask) && self.matches_name(&event.path)
    }

    fn matches_name(&self, path: &Path) -> bool {
        if self.globs.is_empty() {
            return true;
        }

        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => path.as_os_str().to_string_lossy(),
        };
        self.globs.iter().any(|glob| glob.matches(&name))
    }
}

/// Translate shell-style spellings the `glob` crate reads differently:
/// `[^...]` negates like `[!...]`, and a run of `*` is a single `*` since
/// only base names are matched.
fn shell_glob(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len());
    let mut chars = glob.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '*' if !in_class && out.ends_with('*') => continue,
            '[' if !in_class => {
                in_class = true;
                out.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('!');
                }
                continue;
            }
            ']' if in_class => in_class = false,
            _ => {}
        }
        out.push(c);
    }
    out
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self::new(ChangeKind::ALL, Vec::new())
    }
}

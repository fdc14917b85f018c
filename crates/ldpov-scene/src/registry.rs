//! Known and generated primitive names.
//!
//! The manifest is the header include that ships pre-built primitive
//! declarations. Each declared primitive is tagged with a `// #JBB <name>`
//! comment line; those names never need synthesis.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Tag that marks a pre-declared primitive in the manifest.
pub const MANIFEST_TAG: &str = "#JBB";

/// Names available without synthesis, and names synthesized so far.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveRegistry {
    known: BTreeSet<String>,
    generated: BTreeSet<String>,
    manifest: Option<PathBuf>,
}

impl PrimitiveRegistry {
    /// An empty registry with no manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry filled from a manifest file.
    ///
    /// A missing or unreadable manifest leaves the known set empty, so every
    /// procedural primitive will be synthesized.
    pub fn with_manifest(path: impl AsRef<Path>) -> Self {
        let mut registry = Self::for_manifest(path);
        registry.reload_manifest();
        registry
    }

    /// A registry bound to a manifest file that is not read until
    /// [`PrimitiveRegistry::reset`].
    pub fn for_manifest(path: impl AsRef<Path>) -> Self {
        Self {
            manifest: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Replace the known set with the tagged names read from `reader`.
    ///
    /// A line qualifies when its first two whitespace tokens are `//` and
    /// `#JBB` and a third token follows; everything else is ignored.
    pub fn load<R: BufRead>(&mut self, reader: R) -> io::Result<usize> {
        let mut known = BTreeSet::new();
        for line in reader.lines() {
            let line = line?;
            let mut tokens = line.split_whitespace();
            if let (Some("//"), Some(MANIFEST_TAG), Some(name)) =
                (tokens.next(), tokens.next(), tokens.next())
            {
                known.insert(name.to_lowercase());
            }
        }
        self.known = known;
        Ok(self.known.len())
    }

    /// Replace the known set with the tagged names in `text`.
    pub fn load_str(&mut self, text: &str) -> usize {
        // reading from a byte slice cannot fail
        self.load(text.as_bytes()).unwrap_or(0)
    }

    fn reload_manifest(&mut self) {
        let Some(path) = self.manifest.clone() else {
            return;
        };
        let loaded = File::open(&path).and_then(|f| self.load(BufReader::new(f)));
        match loaded {
            Ok(count) => debug!("Loaded {} primitive names from {}", count, path.display()),
            Err(e) => {
                warn!("Primitive manifest {} unavailable: {}", path.display(), e);
                self.known.clear();
            }
        }
    }

    /// Forget generated names, and re-read the manifest if one is set.
    pub fn reset(&mut self) {
        self.generated.clear();
        self.reload_manifest();
    }

    /// True if `name` is declared by the manifest.
    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// True if `name` was synthesized in this session.
    pub fn is_generated(&self, name: &str) -> bool {
        self.generated.contains(name)
    }

    /// True if `name` can be instantiated without synthesis.
    pub fn is_available(&self, name: &str) -> bool {
        self.is_known(name) || self.is_generated(name)
    }

    /// Record that `name` has been declared in the current output.
    pub fn mark_generated(&mut self, name: &str) {
        self.generated.insert(name.to_string());
    }

    /// Number of manifest names.
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    /// Number of synthesized names.
    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }

    /// Synthesized names, sorted.
    pub fn generated(&self) -> impl Iterator<Item = &str> {
        self.generated.iter().map(String::as_str)
    }

    /// Manifest path, if any.
    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest.as_deref()
    }
}

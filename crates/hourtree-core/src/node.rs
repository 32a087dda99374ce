//! Two-phase export tree
//!
//! A tree is assembled unprepared, then `prepare` resolves every node's
//! final path from the ancestor context and derives the index and
//! checksum artifacts from each indexed directory's finalized child name
//! set. Only a prepared tree can be written out, so materializing before
//! preparing is not representable in the API.
//!
//! A parent's artifacts depend on the final identities of its children,
//! which is why the build is two explicit passes instead of a streaming
//! write with incidental buffering.

use std::collections::BTreeSet;

use crate::checksum::Checksum;
use crate::error::CoreError;

/// Name of the listing artifact an indexed directory carries.
pub const INDEX_FILE_NAME: &str = "index";
/// Name of the checksum artifact published next to the index.
pub const CHECKSUM_FILE_NAME: &str = "index.checksum";

const PATH_SEPARATOR: &str = "/";

/// Immutable ancestor-path context threaded down during prepare.
///
/// Push-only: extending returns a new context and leaves the parent's
/// untouched, so sibling subtrees can be prepared independently.
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    segments: Vec<String>,
}

impl PathContext {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    pub fn join(&self) -> String {
        self.segments.join(PATH_SEPARATOR)
    }
}

/// Directory under assembly: uniquely named children, optionally carrying
/// index + checksum artifacts once prepared.
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    name: String,
    indexed: bool,
    children: Vec<Node>,
}

impl DirectoryNode {
    /// Plain directory: no index artifacts of its own.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indexed: false,
            children: Vec::new(),
        }
    }

    /// Directory that publishes `index` and `index.checksum` over its
    /// immediate child names.
    pub fn indexed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indexed: true,
            children: Vec::new(),
        }
    }

    /// Append a child. Name uniqueness is enforced later, at `prepare`,
    /// when the child set is final.
    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    fn prepare(self, ancestors: &PathContext) -> Result<PreparedNode, CoreError> {
        let context = ancestors.push(&self.name);

        // Child names are final here; validate before deriving artifacts.
        let mut names = BTreeSet::new();
        for child in &self.children {
            if self.indexed
                && (child.name() == INDEX_FILE_NAME || child.name() == CHECKSUM_FILE_NAME)
            {
                return Err(CoreError::ReservedChildName {
                    parent: context.join(),
                    name: child.name().to_string(),
                });
            }
            if !names.insert(child.name().to_string()) {
                return Err(CoreError::DuplicateChild {
                    parent: context.join(),
                    name: child.name().to_string(),
                });
            }
        }

        let mut children = Vec::with_capacity(self.children.len() + 2);
        for child in self.children {
            children.push(child.prepare(&context)?);
        }

        if self.indexed {
            let index_bytes = render_index(&names);
            let token = Checksum::of(&index_bytes);
            children.push(PreparedNode::File(PreparedFile {
                path: context.push(INDEX_FILE_NAME).join(),
                bytes: index_bytes,
            }));
            children.push(PreparedNode::File(PreparedFile {
                path: context.push(CHECKSUM_FILE_NAME).join(),
                bytes: token.to_hex().into_bytes(),
            }));
        }

        Ok(PreparedNode::Directory(PreparedDirectory {
            path: context.join(),
            children,
        }))
    }
}

/// File under assembly: opaque payload bytes.
#[derive(Debug, Clone)]
pub struct FileNode {
    name: String,
    bytes: Vec<u8>,
}

impl FileNode {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Unprepared tree node, a tagged variant: directories and files share
/// nothing but the two-phase lifecycle.
#[derive(Debug, Clone)]
pub enum Node {
    Directory(DirectoryNode),
    File(FileNode),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Directory(dir) => dir.name(),
            Node::File(file) => file.name(),
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            Node::Directory(dir) => Some(dir),
            Node::File(_) => None,
        }
    }

    /// Resolve final paths and derive index/checksum artifacts.
    ///
    /// Consumes the unprepared tree; the returned tree is fixed and will
    /// not change. Fails if a directory's final child name set contains
    /// duplicates or reserved artifact names.
    pub fn prepare(self, ancestors: &PathContext) -> Result<PreparedNode, CoreError> {
        match self {
            Node::Directory(dir) => dir.prepare(ancestors),
            Node::File(file) => Ok(PreparedNode::File(PreparedFile {
                path: ancestors.push(&file.name).join(),
                bytes: file.bytes,
            })),
        }
    }
}

impl From<DirectoryNode> for Node {
    fn from(dir: DirectoryNode) -> Self {
        Node::Directory(dir)
    }
}

impl From<FileNode> for Node {
    fn from(file: FileNode) -> Self {
        Node::File(file)
    }
}

/// Index bytes: sorted child names, one per line, newline-terminated.
fn render_index(names: &BTreeSet<String>) -> Vec<u8> {
    let mut out = String::new();
    for name in names {
        out.push_str(name);
        out.push('\n');
    }
    out.into_bytes()
}

/// Prepared directory: path resolved, artifacts attached.
#[derive(Debug, Clone)]
pub struct PreparedDirectory {
    pub path: String,
    pub children: Vec<PreparedNode>,
}

/// Prepared file: path resolved, bytes final.
#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Tree node after prepare. Materialization consumes it, so a tree is
/// written at most once per run.
#[derive(Debug, Clone)]
pub enum PreparedNode {
    Directory(PreparedDirectory),
    File(PreparedFile),
}

impl PreparedNode {
    pub fn path(&self) -> &str {
        match self {
            PreparedNode::Directory(dir) => &dir.path,
            PreparedNode::File(file) => &file.path,
        }
    }

    /// All files in this subtree, depth-first.
    pub fn files(&self) -> Vec<&PreparedFile> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a PreparedFile>) {
        match self {
            PreparedNode::File(file) => out.push(file),
            PreparedNode::Directory(dir) => {
                for child in &dir.children {
                    child.collect_files(out);
                }
            }
        }
    }
}

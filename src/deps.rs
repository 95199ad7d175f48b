//! # Dependency Trees
//!
//! Builds a tagged tree describing the transitive dependency closure of an
//! archive. Every node carries one of four tags:
//!
//! - `Installed`: the archive's dependencies are known; it has children.
//! - `Missing`: the dependency lookup failed; never expanded.
//! - `Circular`: the archive already appears on the path from the root.
//! - `Unexpanded`: the archive was already expanded elsewhere in the tree
//!   (shallow mode only).
//!
//! Two expansion policies are provided. **Shallow** expansion walks the graph
//! breadth-first and expands each distinct archive at most once, so the
//! amount of work is bounded by the number of distinct archives. **Deep**
//! expansion recurses fully into every branch and only stops at genuine
//! cycles.
//!
//! `sort_tree` and `summarize` are optional post-processing passes; both are
//! pure and return a new tree. Summarizing collapses runs of adjacent leaves
//! with the same tag into a single `Summarized` node that keeps every member,
//! so `unsummarize` restores the original tree exactly.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::io;

use console::style;
use log::warn;
use ptree::TreeItem;

use crate::archive::Archive;
use crate::error::{Error, Result};
use crate::hub::HubManager;
use crate::manifest::Manifest;

/// Node tags, declared in display priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Installed,
    Missing,
    Circular,
    Unexpanded,
}

impl NodeKind {
    fn label(self) -> &'static str {
        match self {
            NodeKind::Installed => "installed",
            NodeKind::Missing => "missing",
            NodeKind::Circular => "circular",
            NodeKind::Unexpanded => "see above",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyNode {
    Installed {
        archive: Archive,
        children: Vec<DependencyNode>,
    },
    Missing(Archive),
    Circular(Archive),
    Unexpanded(Archive),
    /// Adjacent sibling leaves sharing `kind`, in their original order.
    Summarized {
        kind: NodeKind,
        archives: Vec<Archive>,
    },
}

impl DependencyNode {
    /// A childless node of the given kind.
    pub fn leaf(kind: NodeKind, archive: Archive) -> Self {
        match kind {
            NodeKind::Installed => DependencyNode::Installed {
                archive,
                children: Vec::new(),
            },
            NodeKind::Missing => DependencyNode::Missing(archive),
            NodeKind::Circular => DependencyNode::Circular(archive),
            NodeKind::Unexpanded => DependencyNode::Unexpanded(archive),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            DependencyNode::Installed { .. } => NodeKind::Installed,
            DependencyNode::Missing(_) => NodeKind::Missing,
            DependencyNode::Circular(_) => NodeKind::Circular,
            DependencyNode::Unexpanded(_) => NodeKind::Unexpanded,
            DependencyNode::Summarized { kind, .. } => *kind,
        }
    }

    /// The archive of a non-summarized node.
    pub fn archive(&self) -> Option<&Archive> {
        match self {
            DependencyNode::Installed { archive, .. }
            | DependencyNode::Missing(archive)
            | DependencyNode::Circular(archive)
            | DependencyNode::Unexpanded(archive) => Some(archive),
            DependencyNode::Summarized { .. } => None,
        }
    }

    pub fn children(&self) -> &[DependencyNode] {
        match self {
            DependencyNode::Installed { children, .. } => children,
            _ => &[],
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            DependencyNode::Summarized { archives, .. } => archives
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            other => other.archive().map(|a| a.to_string()).unwrap_or_default(),
        }
    }

    fn is_plain_leaf(&self) -> bool {
        !matches!(self, DependencyNode::Summarized { .. }) && self.children().is_empty()
    }

    /// Every archive tagged `Installed` anywhere in the tree.
    pub fn installed_archives(&self) -> BTreeSet<Archive> {
        let mut found = BTreeSet::new();
        self.collect_kind(NodeKind::Installed, &mut found);
        found
    }

    /// Every archive carrying `kind` anywhere in the tree, summaries included.
    pub fn archives_of_kind(&self, kind: NodeKind) -> BTreeSet<Archive> {
        let mut found = BTreeSet::new();
        self.collect_kind(kind, &mut found);
        found
    }

    fn collect_kind(&self, kind: NodeKind, found: &mut BTreeSet<Archive>) {
        match self {
            DependencyNode::Summarized { kind: k, archives } if *k == kind => {
                found.extend(archives.iter().cloned());
            }
            DependencyNode::Summarized { .. } => {}
            node => {
                if node.kind() == kind {
                    if let Some(archive) = node.archive() {
                        found.insert(archive.clone());
                    }
                }
                for child in node.children() {
                    child.collect_kind(kind, found);
                }
            }
        }
    }

    /// Expand every `Summarized` node back into its member leaves.
    pub fn unsummarize(&self) -> DependencyNode {
        match self {
            DependencyNode::Installed { archive, children } => DependencyNode::Installed {
                archive: archive.clone(),
                children: children
                    .iter()
                    .flat_map(|child| match child {
                        DependencyNode::Summarized { kind, archives } => archives
                            .iter()
                            .map(|a| DependencyNode::leaf(*kind, a.clone()))
                            .collect(),
                        other => vec![other.unsummarize()],
                    })
                    .collect(),
            },
            other => other.clone(),
        }
    }
}

/// Expansion policy for [`build_tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Breadth-first, each distinct archive expanded once.
    Shallow,
    /// Depth-first, every branch expanded until a cycle.
    Deep,
}

/// Build the dependency tree of `root`.
///
/// `lookup` returns the direct dependencies of an archive, or `None` when
/// they cannot be determined (the archive becomes a `Missing` node).
pub fn build_tree<F>(root: &Archive, expansion: Expansion, lookup: F) -> DependencyNode
where
    F: FnMut(&Archive) -> Option<Vec<Archive>>,
{
    match expansion {
        Expansion::Shallow => build_shallow(root, lookup),
        Expansion::Deep => build_deep(root, lookup),
    }
}

struct Slot {
    archive: Archive,
    kind: NodeKind,
    children: Vec<usize>,
}

/// Breadth-first expansion that never expands an archive twice.
pub fn build_shallow<F>(root: &Archive, mut lookup: F) -> DependencyNode
where
    F: FnMut(&Archive) -> Option<Vec<Archive>>,
{
    let Some(root_deps) = lookup(root) else {
        return DependencyNode::Missing(root.clone());
    };

    let mut slots = vec![Slot {
        archive: root.clone(),
        kind: NodeKind::Installed,
        children: Vec::new(),
    }];
    let mut seen: HashSet<Archive> = HashSet::from([root.clone()]);
    let mut queue = VecDeque::from([(0usize, vec![root.clone()], root_deps)]);

    while let Some((parent, ancestors, deps)) = queue.pop_front() {
        for dep in deps {
            let index = slots.len();
            if seen.contains(&dep) {
                // Any earlier visit counts, whatever its tag was.
                let kind = if ancestors.contains(&dep) {
                    NodeKind::Circular
                } else {
                    NodeKind::Unexpanded
                };
                slots.push(Slot {
                    archive: dep,
                    kind,
                    children: Vec::new(),
                });
            } else {
                seen.insert(dep.clone());
                match lookup(&dep) {
                    None => slots.push(Slot {
                        archive: dep,
                        kind: NodeKind::Missing,
                        children: Vec::new(),
                    }),
                    Some(sub_deps) => {
                        let mut path = ancestors.clone();
                        path.push(dep.clone());
                        slots.push(Slot {
                            archive: dep,
                            kind: NodeKind::Installed,
                            children: Vec::new(),
                        });
                        queue.push_back((index, path, sub_deps));
                    }
                }
            }
            slots[parent].children.push(index);
        }
    }

    assemble(&slots, 0)
}

fn assemble(slots: &[Slot], index: usize) -> DependencyNode {
    let slot = &slots[index];
    match slot.kind {
        NodeKind::Installed => DependencyNode::Installed {
            archive: slot.archive.clone(),
            children: slot.children.iter().map(|&c| assemble(slots, c)).collect(),
        },
        kind => DependencyNode::leaf(kind, slot.archive.clone()),
    }
}

/// Depth-first expansion of every branch. Lookups are memoised, so each
/// archive's dependencies are asked for only once.
pub fn build_deep<F>(root: &Archive, mut lookup: F) -> DependencyNode
where
    F: FnMut(&Archive) -> Option<Vec<Archive>>,
{
    let mut memo = HashMap::new();
    let mut ancestors = Vec::new();
    expand_deep(root, &mut ancestors, &mut memo, &mut lookup)
}

fn expand_deep<F>(
    archive: &Archive,
    ancestors: &mut Vec<Archive>,
    memo: &mut HashMap<Archive, Option<Vec<Archive>>>,
    lookup: &mut F,
) -> DependencyNode
where
    F: FnMut(&Archive) -> Option<Vec<Archive>>,
{
    if ancestors.contains(archive) {
        return DependencyNode::Circular(archive.clone());
    }

    let deps = memo
        .entry(archive.clone())
        .or_insert_with(|| lookup(archive))
        .clone();
    let Some(deps) = deps else {
        return DependencyNode::Missing(archive.clone());
    };

    ancestors.push(archive.clone());
    let children = deps
        .iter()
        .map(|dep| expand_deep(dep, ancestors, memo, lookup))
        .collect();
    ancestors.pop();

    DependencyNode::Installed {
        archive: archive.clone(),
        children,
    }
}

/// Order children by tag priority, then alphabetically, at every level.
pub fn sort_tree(node: DependencyNode) -> DependencyNode {
    match node {
        DependencyNode::Installed { archive, children } => {
            let mut children: Vec<DependencyNode> = children.into_iter().map(sort_tree).collect();
            children.sort_by_cached_key(|child| (child.kind(), child.display_name()));
            DependencyNode::Installed { archive, children }
        }
        other => other,
    }
}

/// Collapse runs of two or more adjacent same-tag leaves into `Summarized`
/// nodes. Grandchildren are summarized before their parents.
pub fn summarize(node: DependencyNode) -> DependencyNode {
    match node {
        DependencyNode::Installed { archive, children } => {
            let children = children.into_iter().map(summarize).collect();
            DependencyNode::Installed {
                archive,
                children: merge_runs(children),
            }
        }
        other => other,
    }
}

fn merge_runs(children: Vec<DependencyNode>) -> Vec<DependencyNode> {
    let mut merged = Vec::with_capacity(children.len());
    let mut run: Vec<DependencyNode> = Vec::new();

    for child in children {
        if !child.is_plain_leaf() {
            flush_run(&mut run, &mut merged);
            merged.push(child);
            continue;
        }
        if run.last().is_some_and(|last| last.kind() != child.kind()) {
            flush_run(&mut run, &mut merged);
        }
        run.push(child);
    }
    flush_run(&mut run, &mut merged);

    merged
}

fn flush_run(run: &mut Vec<DependencyNode>, merged: &mut Vec<DependencyNode>) {
    if run.len() < 2 {
        merged.append(run);
        return;
    }
    let kind = run[0].kind();
    let archives = run.drain(..).filter_map(|n| n.archive().cloned()).collect();
    merged.push(DependencyNode::Summarized { kind, archives });
}

/// Direct dependencies of `archive` from its manifest.
///
/// `None` when the archive is not installed. A missing manifest means no
/// dependencies; a malformed one is reported and treated the same way.
pub fn manifest_dependencies(hub: &HubManager, archive: &Archive) -> Option<Vec<Archive>> {
    let local = hub.local_archive(archive).ok()?;
    match Manifest::read(local.path()).and_then(|m| m.dependencies()) {
        Ok(deps) => Some(
            deps.iter()
                .map(|dep| Archive::from_repo(archive.instance(), dep))
                .collect(),
        ),
        Err(Error::NoManifestFile { .. }) => Some(Vec::new()),
        Err(e) => {
            warn!("{}: manifest: {}", archive.qualified(), e);
            Some(Vec::new())
        }
    }
}

/// Build the dependency tree of an archive from installed manifests.
pub fn build_dependency_tree(hub: &HubManager, archive: &Archive, shallow: bool) -> DependencyNode {
    let expansion = if shallow {
        Expansion::Shallow
    } else {
        Expansion::Deep
    };
    build_tree(archive, expansion, |a| manifest_dependencies(hub, a))
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct RenderNode {
    label: String,
    children: Vec<RenderNode>,
}

impl TreeItem for RenderNode {
    type Child = RenderNode;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &ptree::Style) -> io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

fn to_render_node(node: &DependencyNode, highlight: &HashSet<Archive>) -> RenderNode {
    let label = match node {
        DependencyNode::Installed { archive, .. } => archive.to_string(),
        DependencyNode::Summarized { kind, archives } => {
            format!("[{}: {}] {}", kind.label(), archives.len(), node.display_name())
        }
        other => format!("{} [{}]", other.display_name(), other.kind().label()),
    };
    let label = match node.archive() {
        Some(archive) if highlight.contains(archive) => style(label).bold().to_string(),
        _ => label,
    };
    RenderNode {
        label,
        children: node
            .children()
            .iter()
            .map(|c| to_render_node(c, highlight))
            .collect(),
    }
}

/// Render `node` as an indented tree, emphasising archives in `highlight`.
pub fn render_tree(node: &DependencyNode, highlight: &HashSet<Archive>) -> Result<String> {
    let mut out = Vec::new();
    ptree::write_tree(&to_render_node(node, highlight), &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

//! Transitive closure of `requires` over a root set.
//!
//! [`resolve`] is a pure function of `(roots, catalog)`: it walks the
//! requires edges depth-first from every root (roots and edges in name
//! order, so diagnostics are stable), collects every module it reaches,
//! and fails fast on a missing module or a cycle.
//!
//! # Cycle detection
//!
//! Descriptors are required to form a DAG, but the traversal does not trust
//! that. Each module is *open* while its requires are being explored and
//! *done* afterwards; reaching an open module again means the requires graph
//! loops back on the current path.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use modgraph_core::{ModgraphError, ModuleCatalog, ModuleDescriptor, Result};
use tracing::{debug, instrument, trace};

/// The modules reachable from a root set, closed under `requires`.
///
/// Never mutated after construction; resolving a different root set
/// yields a new configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfiguration {
    roots: BTreeSet<String>,
    modules: BTreeMap<String, Arc<ModuleDescriptor>>,
}

impl ResolvedConfiguration {
    #[must_use]
    pub const fn roots(&self) -> &BTreeSet<String> {
        &self.roots
    }

    /// Member names in sorted order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Member descriptors in name order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<ModuleDescriptor>> {
        self.modules.values()
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&Arc<ModuleDescriptor>> {
        self.modules.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Direct requires targets of a member, in name order.
    #[must_use]
    pub fn direct_dependencies(&self, name: &str) -> Vec<&str> {
        self.modules
            .get(name)
            .map(|d| d.requires().map(|r| r.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Everything a member requires, directly or transitively, excluding
    /// the member itself. Empty for non-members.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> BTreeSet<String> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);

        while let Some(current) = queue.pop_front() {
            for target in self.direct_dependencies(current) {
                if seen.insert(target.to_string()) {
                    queue.push_back(target);
                }
            }
        }

        seen.remove(name);
        seen
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Open,
    Done,
}

struct Frame {
    name: String,
    targets: Vec<String>,
    next: usize,
}

impl Frame {
    fn new(descriptor: &ModuleDescriptor) -> Self {
        Self {
            name: descriptor.name().to_string(),
            targets: descriptor.requires().map(|r| r.name.clone()).collect(),
            next: 0,
        }
    }
}

/// Resolve the requires closure of `roots` against `catalog`.
///
/// # Errors
///
/// - [`ModgraphError::ModuleNotFound`] naming the first missing root.
/// - [`ModgraphError::RequiredModuleNotFound`] if a reached module requires
///   an unknown module.
/// - [`ModgraphError::CycleDetected`] with the offending path.
#[instrument(skip_all, fields(roots = tracing::field::Empty))]
pub fn resolve<I, S>(roots: I, catalog: &ModuleCatalog) -> Result<ResolvedConfiguration>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let roots: BTreeSet<String> = roots.into_iter().map(Into::into).collect();
    tracing::Span::current().record("roots", tracing::field::debug(&roots));

    for root in &roots {
        catalog.lookup(root)?;
    }

    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut modules: BTreeMap<String, Arc<ModuleDescriptor>> = BTreeMap::new();

    for root in &roots {
        if marks.contains_key(root) {
            continue;
        }

        let descriptor = catalog.lookup(root)?;
        marks.insert(root.clone(), Mark::Open);
        modules.insert(root.clone(), Arc::clone(descriptor));
        let mut frames = vec![Frame::new(descriptor)];

        while let Some(frame) = frames.last_mut() {
            let Some(target) = frame.targets.get(frame.next).cloned() else {
                marks.insert(frame.name.clone(), Mark::Done);
                frames.pop();
                continue;
            };
            frame.next += 1;

            match marks.get(&target) {
                Some(Mark::Done) => {}
                Some(Mark::Open) => {
                    return Err(ModgraphError::CycleDetected {
                        path: cycle_path(&frames, &target),
                    });
                }
                None => {
                    let Some(descriptor) = catalog.get(&target) else {
                        return Err(ModgraphError::RequiredModuleNotFound {
                            module: frame.name.clone(),
                            target,
                        });
                    };
                    trace!(module = %target, via = %frame.name, "module reached");
                    marks.insert(target.clone(), Mark::Open);
                    modules.insert(target, Arc::clone(descriptor));
                    frames.push(Frame::new(descriptor));
                }
            }
        }
    }

    debug!(modules = modules.len(), "configuration resolved");
    Ok(ResolvedConfiguration { roots, modules })
}

/// The open path from the first occurrence of `target` back to `target`.
fn cycle_path(frames: &[Frame], target: &str) -> Vec<String> {
    let start = frames
        .iter()
        .position(|f| f.name == target)
        .unwrap_or_default();
    let mut path: Vec<String> = frames[start..].iter().map(|f| f.name.clone()).collect();
    path.push(target.to_string());
    path
}

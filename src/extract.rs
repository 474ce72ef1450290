//! Patch extraction
//!
//! Walks the catalog once, classifies each root document as plain data or
//! a patch, and files every valid patch into its pass. Patches are removed
//! from the catalog; plain data stays.

use confpatch_pattern::{
    is_bracket_balanced, strip_pass_specifier, Command, NodeMatcher, PassSpecifier, PatternError,
};
use confpatch_tree::Node;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, DocumentRef, Origin};
use crate::known::KnownIdentifiers;
use crate::progress::Progress;

/// Child node marking a patch for reapplication while it still matches.
pub const PATCH_LOOP: &str = "MM_PATCH_LOOP";

/// A root patch ready for scheduling.
#[derive(Debug, Clone)]
pub struct Patch {
    pub origin: Origin,
    pub command: Command,
    /// Patch body; name has its pass specifier removed, loop marker stripped.
    pub node: Node,
    pub matcher: NodeMatcher,
    pub looping: bool,
}

#[derive(Debug, Clone)]
pub struct Pass {
    pub name: String,
    pub patches: Vec<Patch>,
}

impl Pass {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patches: Vec::new(),
        }
    }
}

/// Pass name and patch origins, for dry runs and summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub name: String,
    pub patches: Vec<String>,
}

/// Every pass in execution order.
#[derive(Debug, Clone)]
pub struct PatchList {
    passes: Vec<Pass>,
    first: usize,
    legacy: usize,
    final_pass: usize,
    /// Lower-cased identifier -> index of its Before pass; For and After follow.
    mod_passes: Vec<(String, usize)>,
    /// Lower-cased identifier -> index of its Last pass.
    last_passes: Vec<(String, usize)>,
}

impl PatchList {
    /// Lay out the passes for `known`: First, Legacy, Before/For/After per
    /// identifier, Last per identifier, Final.
    pub fn new(known: &KnownIdentifiers) -> Self {
        let mut passes = vec![Pass::new(":FIRST"), Pass::new(":LEGACY (default)")];
        let mut mod_passes = Vec::with_capacity(known.len());
        for id in known.iter() {
            mod_passes.push((id.to_lowercase(), passes.len()));
            passes.push(Pass::new(format!(":BEFORE[{}]", id)));
            passes.push(Pass::new(format!(":FOR[{}]", id)));
            passes.push(Pass::new(format!(":AFTER[{}]", id)));
        }
        let mut last_passes = Vec::with_capacity(known.len());
        for id in known.iter() {
            last_passes.push((id.to_lowercase(), passes.len()));
            passes.push(Pass::new(format!(":LAST[{}]", id)));
        }
        let final_pass = passes.len();
        passes.push(Pass::new(":FINAL"));

        Self {
            passes,
            first: 0,
            legacy: 1,
            final_pass,
            mod_passes,
            last_passes,
        }
    }

    fn lookup(table: &[(String, usize)], id: &str) -> Option<usize> {
        let key = id.to_lowercase();
        table.iter().find(|(k, _)| *k == key).map(|(_, i)| *i)
    }

    /// Pass index for a specifier, or None if its identifier is unknown.
    fn pass_for(&self, specifier: Option<&PassSpecifier>) -> Option<usize> {
        match specifier {
            None => Some(self.legacy),
            Some(PassSpecifier::First) => Some(self.first),
            Some(PassSpecifier::Final) => Some(self.final_pass),
            Some(PassSpecifier::Before(id)) => Self::lookup(&self.mod_passes, id),
            Some(PassSpecifier::For(id)) => Self::lookup(&self.mod_passes, id).map(|i| i + 1),
            Some(PassSpecifier::After(id)) => Self::lookup(&self.mod_passes, id).map(|i| i + 2),
            Some(PassSpecifier::Last(id)) => Self::lookup(&self.last_passes, id),
        }
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn patch_count(&self) -> usize {
        self.passes.iter().map(|p| p.patches.len()).sum()
    }

    /// Passes that hold at least one patch.
    pub fn report(&self) -> Vec<PassReport> {
        self.passes
            .iter()
            .filter(|p| !p.patches.is_empty())
            .map(|p| PassReport {
                name: p.name.clone(),
                patches: p.patches.iter().map(|patch| patch.origin.to_string()).collect(),
            })
            .collect()
    }
}

enum Classified {
    Data,
    Patch(Box<Patch>, Option<PassSpecifier>),
}

fn classify(node: &Node, origin: &Origin) -> Result<Classified, PatternError> {
    if !is_bracket_balanced(&node.name) {
        return Err(PatternError::UnbalancedBrackets(node.name.clone()));
    }

    let (command, rest) = Command::parse(&node.name);
    if command == Command::Insert {
        let (_, specifier) = strip_pass_specifier(&node.name)?;
        if specifier.is_some() {
            return Err(PatternError::SpecifierOnInsert(node.name.clone()));
        }
        return Ok(Classified::Data);
    }
    if !command.is_valid_at_root() {
        return Err(PatternError::InvalidRootCommand {
            command,
            name: node.name.clone(),
        });
    }

    let (selector, specifier) = strip_pass_specifier(rest)?;
    let matcher = NodeMatcher::parse(&selector)?;

    let mut body = node.clone();
    let looping = body.remove_nodes(PATCH_LOOP) > 0;
    body.name = format!("{}{}", &node.name[..node.name.len() - rest.len()], selector);

    Ok(Classified::Patch(
        Box::new(Patch {
            origin: origin.clone(),
            command,
            node: body,
            matcher,
            looping,
        }),
        specifier,
    ))
}

/// Extract every patch from the catalog.
///
/// Invalid patches and plain-data documents carrying a pass specifier are
/// reported and dropped. Patches naming an unknown identifier are reported
/// as unsatisfied and dropped.
pub fn extract_patches(
    catalog: &mut Catalog,
    known: &KnownIdentifiers,
    progress: &Progress,
) -> PatchList {
    let mut list = PatchList::new(known);

    for file in 0..catalog.file_count() {
        let mut index = 0;
        while index < catalog.documents_in(file) {
            let at = DocumentRef { file, index };
            let (origin, classified) = match (catalog.origin(at), catalog.document(at)) {
                (Some(origin), Some(node)) => {
                    let classified = classify(node, &origin);
                    (origin, classified)
                }
                _ => break,
            };

            match classified {
                Ok(Classified::Data) => {
                    index += 1;
                    continue;
                }
                Ok(Classified::Patch(patch, specifier)) => match list.pass_for(specifier.as_ref()) {
                    Some(pass) => list.passes[pass].patches.push(*patch),
                    None => {
                        let pass = specifier.map(|s| s.to_string()).unwrap_or_default();
                        progress.needs_unsatisfied_pass(&origin, pass);
                    }
                },
                Err(e) => progress.error(&origin, None, e.to_string()),
            }
            catalog.remove_document(at);
        }
    }

    progress.patches_extracted(list.patch_count());
    tracing::debug!(
        patches = list.patch_count(),
        passes = list.report().len(),
        "extracted patches"
    );
    list
}

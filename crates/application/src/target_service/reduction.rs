use std::collections::{BTreeSet, HashMap, HashSet};

use auditum_domain::{DirectoryNode, FlatGroupMap, GroupId, Right, Target};

/// Reduces base groups and their ancestors to a minimal covering target set.
///
/// `tree` supplies parent links. Every base node is kept and carries `right`.
/// An ancestor is kept when it has zero or several direct children among the
/// candidates (base nodes plus all their ancestors); single-child chains
/// collapse. Each target points at its nearest kept ancestor. Output is
/// sorted by path.
///
/// Ancestors are walked through `tree` only. Given the visible tree, a hidden
/// intermediate group ends the chain like the root does, so visible groups
/// below it do not share an ancestor above it.
#[must_use]
pub(crate) fn reduce(tree: &FlatGroupMap, base: &FlatGroupMap, right: Right) -> Vec<Target> {
    let mut visited: HashSet<GroupId> = HashSet::new();
    let mut ancestors: Vec<&DirectoryNode> = Vec::new();

    for node in base.nodes() {
        for ancestor in tree.ancestors_of(&node.id()) {
            if !visited.insert(ancestor.id()) {
                break;
            }
            if !base.contains(&ancestor.id()) {
                ancestors.push(ancestor);
            }
        }
    }

    let mut child_counts: HashMap<GroupId, usize> = HashMap::new();
    for parent_id in base
        .nodes()
        .chain(ancestors.iter().copied())
        .filter_map(DirectoryNode::parent_id)
    {
        *child_counts.entry(parent_id).or_default() += 1;
    }

    let mut retained: HashMap<GroupId, &DirectoryNode> =
        base.nodes().map(|node| (node.id(), node)).collect();
    for ancestor in ancestors {
        if child_counts.get(&ancestor.id()).copied().unwrap_or_default() != 1 {
            retained.insert(ancestor.id(), ancestor);
        }
    }

    let mut targets: Vec<(&str, Target)> = retained
        .values()
        .map(|node| {
            let parent = tree
                .ancestors_of(&node.id())
                .into_iter()
                .map(DirectoryNode::id)
                .find(|ancestor_id| retained.contains_key(ancestor_id));
            let rights = if base.contains(&node.id()) {
                BTreeSet::from([right])
            } else {
                BTreeSet::new()
            };

            (node.path(), Target::from_group(node, parent, rights))
        })
        .collect();

    targets.sort_by_key(|(path, _)| *path);
    targets.into_iter().map(|(_, target)| target).collect()
}

use std::collections::HashMap;

use crate::catalog::Record;

use super::error::BuildError;
use super::palette::{Rgb, palette_color};
use super::tree::{ClusterChildren, ClusterNode, LeafNode, Tree};

/// How a record without a grouping field is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingFieldPolicy {
    /// Group it under the empty-string key.
    #[default]
    Tolerant,
    /// Reject the whole build.
    Strict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Keep only this many leading records before grouping.
    pub limit: Option<usize>,
    pub missing_fields: MissingFieldPolicy,
    pub root_label: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            limit: None,
            missing_fields: MissingFieldPolicy::Tolerant,
            root_label: "catalog".to_owned(),
        }
    }
}

/// Groups `records` by each of `keys` in turn.
///
/// Groups appear in the order their value is first seen, and records keep
/// their input order inside a group. Top-level clusters take successive
/// palette colors; deeper clusters inherit the color of their top-level
/// cluster. With a single key the leaves get a lightened copy of their
/// cluster color.
pub fn build(
    records: &[Record],
    keys: &[String],
    options: &BuildOptions,
) -> Result<Tree, BuildError> {
    if keys.is_empty() {
        return Err(BuildError::InvalidArgument(
            "at least one group key is required".to_owned(),
        ));
    }

    let take = options.limit.map_or(records.len(), |limit| limit.min(records.len()));
    let indices = (0..take).collect::<Vec<_>>();
    let flat = keys.len() == 1;

    let groups = group_by_field(records, &indices, &keys[0], options.missing_fields)?;
    let mut children = Vec::with_capacity(groups.len());
    for (ordinal, (label, members)) in groups.into_iter().enumerate() {
        let color = palette_color(ordinal);
        children.push(ClusterNode {
            field: keys[0].clone(),
            label: label.to_owned(),
            depth: 1,
            color,
            children: build_children(records, &members, &keys[1..], 2, color, flat, options)?,
        });
    }

    let tree = Tree {
        root_label: options.root_label.clone(),
        keys: keys.to_vec(),
        children,
    };
    tracing::debug!(
        keys = ?tree.keys,
        limit = ?options.limit,
        depth = tree.depth(),
        clusters = tree.cluster_count(),
        leaves = tree.leaf_count(),
        "built catalog hierarchy"
    );
    Ok(tree)
}

fn build_children(
    records: &[Record],
    members: &[usize],
    remaining_keys: &[String],
    depth: usize,
    color: Rgb,
    flat: bool,
    options: &BuildOptions,
) -> Result<ClusterChildren, BuildError> {
    let Some((key, deeper_keys)) = remaining_keys.split_first() else {
        let leaf_color = flat.then(|| color.brighter(1.0));
        return Ok(ClusterChildren::Leaves(
            members
                .iter()
                .map(|&index| LeafNode {
                    index,
                    color: leaf_color,
                })
                .collect(),
        ));
    };

    let groups = group_by_field(records, members, key, options.missing_fields)?;
    let mut clusters = Vec::with_capacity(groups.len());
    for (label, sub_members) in groups {
        clusters.push(ClusterNode {
            field: key.clone(),
            label: label.to_owned(),
            depth,
            color,
            children: build_children(
                records,
                &sub_members,
                deeper_keys,
                depth + 1,
                color,
                flat,
                options,
            )?,
        });
    }
    Ok(ClusterChildren::Clusters(clusters))
}

fn group_by_field<'a>(
    records: &'a [Record],
    members: &[usize],
    field: &str,
    policy: MissingFieldPolicy,
) -> Result<Vec<(&'a str, Vec<usize>)>, BuildError> {
    let mut slot_by_value: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, Vec<usize>)> = Vec::new();

    for &index in members {
        let value = match (records[index].get(field), policy) {
            (Some(value), _) => value,
            (None, MissingFieldPolicy::Tolerant) => "",
            (None, MissingFieldPolicy::Strict) => {
                return Err(BuildError::MissingField {
                    index,
                    field: field.to_owned(),
                });
            }
        };

        let slot = *slot_by_value.entry(value).or_insert_with(|| {
            groups.push((value, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(index);
    }

    Ok(groups)
}

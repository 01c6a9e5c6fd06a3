use super::palette::Rgb;

#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    pub root_label: String,
    pub keys: Vec<String>,
    pub children: Vec<ClusterNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterNode {
    /// Field this level was grouped by.
    pub field: String,
    pub label: String,
    /// 1 for clusters directly under the root.
    pub depth: usize,
    pub color: Rgb,
    pub children: ClusterChildren,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClusterChildren {
    Clusters(Vec<ClusterNode>),
    Leaves(Vec<LeafNode>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafNode {
    /// Position of the record in the loaded catalog.
    pub index: usize,
    pub color: Option<Rgb>,
}

/// A leaf together with the cluster labels on the way down from the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafPath<'a> {
    pub labels: Vec<&'a str>,
    pub index: usize,
}

impl ClusterNode {
    pub fn child_count(&self) -> usize {
        match &self.children {
            ClusterChildren::Clusters(clusters) => clusters.len(),
            ClusterChildren::Leaves(leaves) => leaves.len(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match &self.children {
            ClusterChildren::Clusters(clusters) => clusters.iter().map(Self::leaf_count).sum(),
            ClusterChildren::Leaves(leaves) => leaves.len(),
        }
    }

    fn cluster_count(&self) -> usize {
        match &self.children {
            ClusterChildren::Clusters(clusters) => {
                1 + clusters.iter().map(Self::cluster_count).sum::<usize>()
            }
            ClusterChildren::Leaves(_) => 1,
        }
    }

    fn collect_leaf_paths<'a>(
        &'a self,
        prefix: &mut Vec<&'a str>,
        out: &mut Vec<LeafPath<'a>>,
    ) {
        prefix.push(self.label.as_str());
        match &self.children {
            ClusterChildren::Clusters(clusters) => {
                for cluster in clusters {
                    cluster.collect_leaf_paths(prefix, out);
                }
            }
            ClusterChildren::Leaves(leaves) => {
                out.extend(leaves.iter().map(|leaf| LeafPath {
                    labels: prefix.clone(),
                    index: leaf.index,
                }));
            }
        }
        prefix.pop();
    }
}

impl Tree {
    pub fn is_flat(&self) -> bool {
        self.keys.len() == 1
    }

    /// Number of levels below the root, leaves included.
    pub fn depth(&self) -> usize {
        self.keys.len() + 1
    }

    pub fn leaf_count(&self) -> usize {
        self.children.iter().map(ClusterNode::leaf_count).sum()
    }

    pub fn cluster_count(&self) -> usize {
        self.children.iter().map(ClusterNode::cluster_count).sum()
    }

    /// Every leaf in tree order with its ancestor labels.
    pub fn leaf_paths(&self) -> Vec<LeafPath<'_>> {
        let mut out = Vec::new();
        let mut prefix = Vec::with_capacity(self.keys.len());
        for cluster in &self.children {
            cluster.collect_leaf_paths(&mut prefix, &mut out);
        }
        out
    }
}

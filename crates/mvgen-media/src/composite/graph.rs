//! Explicit reduction graph over the rendered takes.
//!
//! ```text
//! level 0   T0    T1    T2    T3
//!             \  /  \  /  \  /
//! level 1      B0    B1    B2        B[i] = T[i+1] over T[i]
//!                \  /  \  /
//! level 2         M0    M1
//!                   \  /
//! level 3           final
//! ```
//!
//! Level `l` has `N - l` nodes; the single node at level `N - 1` is the
//! composite.

use std::path::{Path, PathBuf};

use mvgen_models::{ArtifactNames, BlendMode, BlendStep, ReductionPlan};
use tracing::debug;

use super::probe::ArtifactProbe;
use super::{ReductionError, ReductionResult};

/// Index of a node in a [`CompositeGraph`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeNode {
    /// A rendered take.
    Leaf { artifact: PathBuf },
    /// `top` composited over `bottom`.
    Blend {
        level: usize,
        index: usize,
        top: NodeId,
        bottom: NodeId,
        artifact: PathBuf,
    },
}

impl CompositeNode {
    pub fn artifact(&self) -> &Path {
        match self {
            CompositeNode::Leaf { artifact } => artifact,
            CompositeNode::Blend { artifact, .. } => artifact,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompositeGraph {
    nodes: Vec<CompositeNode>,
    levels: Vec<Vec<NodeId>>,
}

impl CompositeGraph {
    /// Build the graph for `takes` (in leaf order), naming blends in `dir`.
    pub fn build(takes: &[PathBuf], names: &ArtifactNames, dir: &Path) -> ReductionResult<Self> {
        if takes.is_empty() {
            return Err(ReductionError::NoTakes);
        }

        let n = takes.len();
        let mut nodes: Vec<CompositeNode> = takes
            .iter()
            .map(|t| CompositeNode::Leaf {
                artifact: t.clone(),
            })
            .collect();
        let mut levels: Vec<Vec<NodeId>> = vec![(0..n).collect()];

        for level in 1..n {
            let below = &levels[level - 1];
            let mut current = Vec::with_capacity(n - level);

            for index in 0..n - level {
                let name = if level == n - 1 {
                    names.generated()
                } else {
                    names.blend(level, index)
                };
                nodes.push(CompositeNode::Blend {
                    level,
                    index,
                    top: below[index + 1],
                    bottom: below[index],
                    artifact: dir.join(name),
                });
                current.push(nodes.len() - 1);
            }
            levels.push(current);
        }

        Ok(Self { nodes, levels })
    }

    pub fn node(&self, id: NodeId) -> &CompositeNode {
        &self.nodes[id]
    }

    /// Node ids per level, level 0 being the takes.
    pub fn levels(&self) -> &[Vec<NodeId>] {
        &self.levels
    }

    pub fn take_count(&self) -> usize {
        self.levels[0].len()
    }

    pub fn blend_count(&self) -> usize {
        self.nodes.len() - self.take_count()
    }

    pub fn final_node(&self) -> NodeId {
        // build() always pushes at least the leaf level and the top level has one node
        self.levels[self.levels.len() - 1][0]
    }

    pub fn final_artifact(&self) -> &Path {
        self.node(self.final_node()).artifact()
    }

    /// Work out which blends still have to run.
    ///
    /// Walks down from the composite: a node is needed only if its artifact
    /// is missing, and its inputs are consulted only when it is needed. A
    /// needed take that does not exist is an error.
    pub async fn plan<P: ArtifactProbe + ?Sized>(&self, probe: &P) -> ReductionResult<ReductionPlan> {
        let mut needed = vec![false; self.nodes.len()];
        let mut present: Vec<Option<bool>> = vec![None; self.nodes.len()];
        let mut skipped = Vec::new();

        let root = self.final_node();
        if self.blend_count() > 0 {
            if probe.exists(self.node(root).artifact()).await {
                skipped.push(self.node(root).artifact().to_path_buf());
            } else {
                needed[root] = true;
            }
        }

        for level in (1..self.levels.len()).rev() {
            for &id in &self.levels[level] {
                if !needed[id] {
                    continue;
                }
                let CompositeNode::Blend { top, bottom, .. } = &self.nodes[id] else {
                    continue;
                };

                for child in [*bottom, *top] {
                    if needed[child] || present[child].is_some() {
                        continue;
                    }
                    let artifact = self.node(child).artifact();
                    let exists = probe.exists(artifact).await;
                    present[child] = Some(exists);

                    match (&self.nodes[child], exists) {
                        (_, true) if level > 1 => skipped.push(artifact.to_path_buf()),
                        (_, true) => {}
                        (CompositeNode::Leaf { artifact }, false) => {
                            return Err(ReductionError::MissingArtifact(artifact.clone()));
                        }
                        (CompositeNode::Blend { .. }, false) => needed[child] = true,
                    }
                }
            }
        }

        let levels: Vec<Vec<BlendStep>> = self.levels[1..]
            .iter()
            .map(|ids| {
                ids.iter()
                    .rev()
                    .filter(|&&id| needed[id])
                    .filter_map(|&id| self.step_for(id))
                    .collect::<Vec<_>>()
            })
            .filter(|steps| !steps.is_empty())
            .collect();

        let plan = ReductionPlan {
            levels,
            skipped,
            final_artifact: self.final_artifact().to_path_buf(),
        };

        debug!(
            takes = self.take_count(),
            blends = self.blend_count(),
            needed = plan.step_count(),
            skipped = plan.skipped.len(),
            "Planned reduction"
        );

        Ok(plan)
    }

    fn step_for(&self, id: NodeId) -> Option<BlendStep> {
        match &self.nodes[id] {
            CompositeNode::Leaf { .. } => None,
            CompositeNode::Blend {
                level,
                index,
                top,
                bottom,
                artifact,
            } => Some(BlendStep {
                level: *level,
                index: *index,
                top: self.node(*top).artifact().to_path_buf(),
                bottom: self.node(*bottom).artifact().to_path_buf(),
                output: artifact.clone(),
                mode: BlendMode::Difference,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Probe backed by a fixed set of paths.
    struct SetProbe(HashSet<PathBuf>);

    #[async_trait]
    impl ArtifactProbe for SetProbe {
        async fn exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
    }

    fn takes(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("temp/song_subVid{}.mp4", i))).collect()
    }

    fn graph(n: usize) -> CompositeGraph {
        CompositeGraph::build(&takes(n), &ArtifactNames::new("song"), Path::new("temp")).unwrap()
    }

    fn probe(paths: &[PathBuf]) -> SetProbe {
        SetProbe(paths.iter().cloned().collect())
    }

    #[test]
    fn test_level_sizes() {
        let g = graph(4);
        let sizes: Vec<_> = g.levels().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 3, 2, 1]);
        assert_eq!(g.blend_count(), 6);
        assert_eq!(g.final_artifact(), Path::new("temp/song_generated.mp4"));
    }

    #[test]
    fn test_blend_inputs_and_names() {
        let g = graph(3);
        let b1 = g.levels()[1][1];
        match g.node(b1) {
            CompositeNode::Blend {
                top,
                bottom,
                artifact,
                ..
            } => {
                assert_eq!(g.node(*top).artifact(), Path::new("temp/song_subVid2.mp4"));
                assert_eq!(g.node(*bottom).artifact(), Path::new("temp/song_subVid1.mp4"));
                assert_eq!(artifact, &PathBuf::from("temp/song_blended1.mp4"));
            }
            other => panic!("expected blend, got {:?}", other),
        }
    }

    #[test]
    fn test_single_take_is_the_composite() {
        let g = graph(1);
        assert_eq!(g.blend_count(), 0);
        assert_eq!(g.final_artifact(), Path::new("temp/song_subVid0.mp4"));
    }

    #[test]
    fn test_no_takes() {
        assert!(matches!(
            CompositeGraph::build(&[], &ArtifactNames::new("song"), Path::new("temp")),
            Err(ReductionError::NoTakes)
        ));
    }

    #[tokio::test]
    async fn test_plan_from_scratch() {
        let g = graph(4);
        let plan = g.plan(&probe(&takes(4))).await.unwrap();

        let per_level: Vec<_> = plan.levels.iter().map(Vec::len).collect();
        assert_eq!(per_level, vec![3, 2, 1]);
        assert!(plan.skipped.is_empty());

        // Highest index first within a level
        let first_level: Vec<_> = plan.levels[0].iter().map(|s| s.index).collect();
        assert_eq!(first_level, vec![2, 1, 0]);
        assert_eq!(plan.levels[1][0].output, PathBuf::from("temp/song_mashed1.mp4"));
    }

    #[test]
    fn test_plan_skips_existing_final() {
        let g = graph(3);
        let mut present = takes(3);
        present.push(PathBuf::from("temp/song_generated.mp4"));

        let plan = tokio_test::block_on(g.plan(&probe(&present))).unwrap();
        assert!(plan.is_complete());
        assert_eq!(plan.skipped, vec![PathBuf::from("temp/song_generated.mp4")]);
    }

    #[tokio::test]
    async fn test_plan_reuses_intermediate_blends() {
        let g = graph(3);
        let mut present = takes(3);
        present.push(PathBuf::from("temp/song_blended0.mp4"));
        present.push(PathBuf::from("temp/song_blended1.mp4"));

        let plan = g.plan(&probe(&present)).await.unwrap();
        assert_eq!(plan.step_count(), 1);
        assert_eq!(plan.skipped.len(), 2);
        assert_eq!(plan.levels[0][0].level, 2);
    }

    #[tokio::test]
    async fn test_plan_missing_take() {
        let g = graph(2);
        let present = vec![takes(2)[0].clone()];
        assert!(matches!(
            g.plan(&probe(&present)).await,
            Err(ReductionError::MissingArtifact(p)) if p == PathBuf::from("temp/song_subVid1.mp4")
        ));
    }
}

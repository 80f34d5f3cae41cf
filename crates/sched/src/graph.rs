use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::pinning::Pinning;
use crate::task::AppTask;

/// The dependency graph over one frame's submitted tasks. An edge `a -> b`
/// means `b` was submitted after `a` and either their fingerprints conflict
/// or one of them is `Pinning::Synchronous`, so `b` cannot start until `a`
/// finishes. Built once per frame in submission order; tasks with no
/// incoming edges are ready immediately.
///
/// `Synchronous` pinning is an ordering constraint, not just a mutual-
/// exclusion one: a synchronous task serializes against every task
/// submitted before *and* after it, whether or not their fingerprints
/// overlap, mirroring "requires all workers idle while it runs".
pub struct TaskGraph {
    graph: DiGraph<(), ()>,
}

impl TaskGraph {
    pub fn build(tasks: &[AppTask]) -> Self {
        let mut graph = DiGraph::<(), ()>::with_capacity(tasks.len(), 0);
        let nodes: Vec<NodeIndex> = (0..tasks.len()).map(|_| graph.add_node(())).collect();

        for later in 1..tasks.len() {
            for earlier in 0..later {
                let conflicts = tasks[later].fingerprint().conflicts_with(tasks[earlier].fingerprint());
                let synchronous = tasks[later].pinning() == Pinning::Synchronous || tasks[earlier].pinning() == Pinning::Synchronous;
                if conflicts || synchronous {
                    graph.add_edge(nodes[earlier], nodes[later], ());
                }
            }
        }

        Self { graph }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Tasks with no unsatisfied predecessor: the initial ready set.
    pub fn roots(&self) -> Vec<usize> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph.neighbors_directed(n, Direction::Incoming).next().is_none())
            .map(|n| n.index())
            .collect()
    }

    /// Tasks unblocked by the completion of `task`, restricted to those
    /// whose *other* predecessors (if any) have also all finished, per
    /// `is_done`.
    pub fn successors_ready_after(&self, task: usize, is_done: impl Fn(usize) -> bool) -> Vec<usize> {
        let node = NodeIndex::new(task);
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter(|&succ| {
                self.graph
                    .neighbors_directed(succ, Direction::Incoming)
                    .all(|pred| is_done(pred.index()))
            })
            .map(|n| n.index())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use crate::pinning::Pinning;
    use gridkernel_ids::{AccessMode, DatabaseIndex, RowKind, RowTypeId, TableId};
    use std::sync::Arc;

    fn tid(i: u32) -> TableId {
        TableId::new(DatabaseIndex::Main, i)
    }

    fn task_with(fingerprint: Fingerprint) -> AppTask {
        AppTask {
            name: String::new(),
            fingerprint,
            pinning: Pinning::Any,
            callback: Arc::new(|_| {}),
        }
    }

    #[test]
    fn independent_tasks_are_both_roots() {
        let row = RowTypeId::from_name("unrelated", RowKind::Dense);
        let mut fa = Fingerprint::new();
        fa.add_row(tid(0), row, AccessMode::Read);
        let mut fb = Fingerprint::new();
        fb.add_row(tid(1), row, AccessMode::Read);
        let graph = TaskGraph::build(&[task_with(fa), task_with(fb)]);
        assert_eq!(graph.roots().len(), 2);
    }

    #[test]
    fn writer_then_reader_chains() {
        let row = RowTypeId::from_name("hp", RowKind::Dense);
        let mut writer = Fingerprint::new();
        writer.add_row(tid(0), row, AccessMode::Write);
        let mut reader = Fingerprint::new();
        reader.add_row(tid(0), row, AccessMode::Read);
        let graph = TaskGraph::build(&[task_with(writer), task_with(reader)]);
        assert_eq!(graph.roots(), vec![0]);
        assert_eq!(graph.successors_ready_after(0, |_| true), vec![1]);
    }

    fn task_with_pinning(fingerprint: Fingerprint, pinning: Pinning) -> AppTask {
        AppTask {
            name: String::new(),
            fingerprint,
            pinning,
            callback: Arc::new(|_| {}),
        }
    }

    #[test]
    fn synchronous_task_serializes_against_unrelated_tasks_on_both_sides() {
        let row = RowTypeId::from_name("unrelated", RowKind::Dense);
        let mut fa = Fingerprint::new();
        fa.add_row(tid(0), row, AccessMode::Read);
        let mut fb = Fingerprint::new();
        fb.add_row(tid(1), row, AccessMode::Read);

        let before = task_with(fa);
        let sync = task_with_pinning(Fingerprint::new(), Pinning::Synchronous);
        let after = task_with(fb);
        let graph = TaskGraph::build(&[before, sync, after]);

        assert_eq!(graph.roots(), vec![0]);
        assert_eq!(graph.successors_ready_after(0, |_| true), vec![1]);
        assert_eq!(graph.successors_ready_after(1, |_| true), vec![2]);
    }
}

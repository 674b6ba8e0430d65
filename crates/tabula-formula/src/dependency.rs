//! Dependency tracking for formula calculation
//!
//! Edges point from a formula cell to the cells it reads (its precedents);
//! the reverse map holds the dependents. The graph is kept acyclic: every
//! edit is checked against the proposed edge set before anything changes.

use crate::error::{FormulaError, FormulaResult};
use ahash::AHashMap;
use std::collections::{BTreeSet, VecDeque};
use tabula_core::CellReference;

/// Dependency graph for formula cells
///
/// Tracks which cells depend on which other cells, enabling incremental
/// recalculation in a reproducible order.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → cells it reads (precedents)
    precedents: AHashMap<CellReference, BTreeSet<CellReference>>,
    /// Cell → cells that read it (dependents)
    dependents: AHashMap<CellReference, BTreeSet<CellReference>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cells `cell` reads
    ///
    /// Fails without touching the graph if `cell` reads itself or if the new
    /// edges would close a cycle.
    pub fn set_dependencies(
        &mut self,
        cell: CellReference,
        references: BTreeSet<CellReference>,
    ) -> FormulaResult<()> {
        if references.contains(&cell) {
            return Err(FormulaError::DataSelfReference(cell));
        }

        let cycle = find_cycle(cell, |node| {
            if node == cell {
                Some(&references)
            } else {
                self.precedents.get(&node)
            }
        });
        if let Some(cycle) = cycle {
            tracing::debug!(%cell, "rejecting dependencies that close a cycle");
            return Err(FormulaError::DataDependency { cycle });
        }

        self.clear_dependencies(cell);
        for &precedent in &references {
            self.dependents.entry(precedent).or_default().insert(cell);
        }
        if !references.is_empty() {
            tracing::trace!(%cell, count = references.len(), "dependencies set");
            self.precedents.insert(cell, references);
        }
        Ok(())
    }

    /// Drop the cells `cell` reads; cells reading `cell` are kept
    pub fn clear_dependencies(&mut self, cell: CellReference) {
        if let Some(precedents) = self.precedents.remove(&cell) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }
    }

    /// Delete the cell and every edge touching it
    pub fn remove(&mut self, cell: CellReference) {
        self.clear_dependencies(cell);

        if let Some(dependents) = self.dependents.remove(&cell) {
            for dependent in dependents {
                if let Some(precs) = self.precedents.get_mut(&dependent) {
                    precs.remove(&cell);
                    if precs.is_empty() {
                        self.precedents.remove(&dependent);
                    }
                }
            }
        }
    }

    /// Cells that `cell` reads directly
    pub fn precedents(&self, cell: CellReference) -> impl Iterator<Item = CellReference> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Cells that read `cell` directly
    pub fn dependents(&self, cell: CellReference) -> impl Iterator<Item = CellReference> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Whether any edge touches `cell`
    pub fn contains(&self, cell: CellReference) -> bool {
        self.precedents.contains_key(&cell) || self.dependents.contains_key(&cell)
    }

    /// Cells that transitively read `cell`, not including `cell`
    pub fn affected_closure(&self, cell: CellReference) -> BTreeSet<CellReference> {
        reachable(cell, |node| self.dependents.get(&node))
    }

    /// Cells that `cell` transitively reads, not including `cell`
    pub fn precedent_closure(&self, cell: CellReference) -> BTreeSet<CellReference> {
        reachable(cell, |node| self.precedents.get(&node))
    }

    /// Order `subset` so every cell comes after the cells it reads
    ///
    /// Only edges inside `subset` constrain the order. Among cells that are
    /// ready at the same time the lowest coordinate (row-major) goes first.
    pub fn topological_order(&self, subset: &BTreeSet<CellReference>) -> Vec<CellReference> {
        let mut in_degree: AHashMap<CellReference, usize> = subset
            .iter()
            .map(|&cell| {
                let degree = self.precedents(cell).filter(|p| subset.contains(p)).count();
                (cell, degree)
            })
            .collect();

        let mut ready: BTreeSet<CellReference> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(&cell, _)| cell)
            .collect();

        let mut order = Vec::with_capacity(subset.len());
        while let Some(cell) = ready.pop_first() {
            order.push(cell);
            for dependent in self.dependents(cell) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() < subset.len() {
            // Unreachable while the graph stays acyclic
            tracing::warn!(
                remaining = subset.len() - order.len(),
                "cycle inside recalculation set, appending in coordinate order"
            );
            let placed: BTreeSet<_> = order.iter().copied().collect();
            order.extend(subset.difference(&placed).copied());
        }

        order
    }

    /// Cycle through `cell`, if any, as a path ending where it started
    pub fn detect_cycle(&self, cell: CellReference) -> Option<Vec<CellReference>> {
        find_cycle(cell, |node| self.precedents.get(&node))
    }

    /// Number of cells with at least one edge
    pub fn len(&self) -> usize {
        self.precedents.len()
            + self
                .dependents
                .keys()
                .filter(|cell| !self.precedents.contains_key(cell))
                .count()
    }

    /// Check whether the graph has no edges
    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty() && self.dependents.is_empty()
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

fn reachable<'g>(
    start: CellReference,
    edges: impl Fn(CellReference) -> Option<&'g BTreeSet<CellReference>>,
) -> BTreeSet<CellReference> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([start]);

    while let Some(cell) = queue.pop_front() {
        for &next in edges(cell).into_iter().flatten() {
            if next != start && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    seen
}

/// Depth-first search with in-progress/done marks
///
/// Meeting an in-progress node closes a cycle; the path from that node to
/// the top of the stack, plus the node again, is returned.
fn find_cycle<'g>(
    start: CellReference,
    edges: impl Fn(CellReference) -> Option<&'g BTreeSet<CellReference>>,
) -> Option<Vec<CellReference>> {
    type Neighbors<'g> = std::iter::Flatten<std::option::IntoIter<&'g BTreeSet<CellReference>>>;

    let mut marks: AHashMap<CellReference, Mark> = AHashMap::new();
    let mut stack: Vec<(CellReference, Neighbors<'g>)> = Vec::new();

    marks.insert(start, Mark::InProgress);
    stack.push((start, edges(start).into_iter().flatten()));

    while let Some((_, neighbors)) = stack.last_mut() {
        match neighbors.next() {
            Some(&next) => match marks.get(&next) {
                Some(Mark::InProgress) => {
                    let from = stack.iter().position(|(cell, _)| *cell == next)?;
                    let mut cycle: Vec<_> = stack[from..].iter().map(|(cell, _)| *cell).collect();
                    cycle.push(next);
                    return Some(cycle);
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(next, Mark::InProgress);
                    stack.push((next, edges(next).into_iter().flatten()));
                }
            },
            None => {
                if let Some((cell, _)) = stack.pop() {
                    marks.insert(cell, Mark::Done);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c(s: &str) -> CellReference {
        CellReference::parse(s).unwrap()
    }

    fn cells(list: &[&str]) -> BTreeSet<CellReference> {
        list.iter().map(|s| c(s)).collect()
    }

    fn names(list: impl IntoIterator<Item = CellReference>) -> Vec<String> {
        list.into_iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn test_set_dependencies() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(c("B1"), cells(&["A1", "A2"])).unwrap();

        assert_eq!(names(graph.precedents(c("B1"))), vec!["A1", "A2"]);
        assert_eq!(names(graph.dependents(c("A1"))), vec!["B1"]);
        assert_eq!(graph.len(), 3);

        // Replacing drops the old edges
        graph.set_dependencies(c("B1"), cells(&["A3"])).unwrap();
        assert_eq!(names(graph.precedents(c("B1"))), vec!["A3"]);
        assert_eq!(graph.dependents(c("A1")).count(), 0);
        assert!(!graph.contains(c("A1")));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_self_reference() {
        let mut graph = DependencyGraph::new();
        assert_eq!(
            graph.set_dependencies(c("A1"), cells(&["A1", "B1"])),
            Err(FormulaError::DataSelfReference(c("A1")))
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn test_cycle_rejected_atomically() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(c("B1"), cells(&["A1"])).unwrap();
        graph.set_dependencies(c("C1"), cells(&["B1"])).unwrap();

        let err = graph.set_dependencies(c("A1"), cells(&["C1", "D1"])).unwrap_err();
        assert_eq!(
            err,
            FormulaError::DataDependency {
                cycle: vec![c("A1"), c("C1"), c("B1"), c("A1")],
            }
        );
        assert_eq!(err.to_string(), "Circular reference: A1 -> C1 -> B1 -> A1");

        // Nothing changed
        assert_eq!(graph.precedents(c("A1")).count(), 0);
        assert_eq!(graph.dependents(c("D1")).count(), 0);
        assert_eq!(graph.detect_cycle(c("A1")), None);
    }

    #[test]
    fn test_replacing_edges_can_remove_cycle_risk() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(c("B1"), cells(&["A1"])).unwrap();
        // B1 stops reading A1, so A1 may now read B1
        graph.set_dependencies(c("B1"), cells(&["C1"])).unwrap();
        assert!(graph.set_dependencies(c("A1"), cells(&["B1"])).is_ok());
    }

    #[test]
    fn test_closures() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(c("B1"), cells(&["A1"])).unwrap();
        graph.set_dependencies(c("C1"), cells(&["B1"])).unwrap();
        graph.set_dependencies(c("D1"), cells(&["A1", "C1"])).unwrap();
        graph.set_dependencies(c("E1"), cells(&["Z9"])).unwrap();

        assert_eq!(names(graph.affected_closure(c("A1"))), vec!["B1", "C1", "D1"]);
        assert_eq!(names(graph.affected_closure(c("D1"))), Vec::<String>::new());
        assert_eq!(names(graph.precedent_closure(c("D1"))), vec!["A1", "B1", "C1"]);
    }

    #[test]
    fn test_topological_order() {
        let mut graph = DependencyGraph::new();
        // A2 <- A1 <- B3, and C1 independent
        graph.set_dependencies(c("A1"), cells(&["A2"])).unwrap();
        graph.set_dependencies(c("B3"), cells(&["A1"])).unwrap();
        graph.set_dependencies(c("C1"), cells(&["Z9"])).unwrap();

        let order = graph.topological_order(&cells(&["A1", "A2", "B3", "C1"]));
        assert_eq!(names(order), vec!["C1", "A2", "A1", "B3"]);

        // Edges leaving the subset do not constrain it
        let order = graph.topological_order(&cells(&["B3", "A1"]));
        assert_eq!(names(order), vec!["A1", "B3"]);
    }

    #[test]
    fn test_topological_order_diamond() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(c("B1"), cells(&["A1"])).unwrap();
        graph.set_dependencies(c("B2"), cells(&["A1"])).unwrap();
        graph.set_dependencies(c("C1"), cells(&["B1", "B2"])).unwrap();

        let mut subset = graph.affected_closure(c("A1"));
        subset.insert(c("A1"));
        assert_eq!(
            names(graph.topological_order(&subset)),
            vec!["A1", "B1", "B2", "C1"]
        );
    }

    #[test]
    fn test_remove() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(c("B1"), cells(&["A1"])).unwrap();
        graph.set_dependencies(c("C1"), cells(&["B1"])).unwrap();

        graph.remove(c("B1"));
        assert!(!graph.contains(c("B1")));
        assert!(graph.is_empty());

        graph.set_dependencies(c("B1"), cells(&["A1"])).unwrap();
        graph.clear_dependencies(c("B1"));
        assert!(graph.is_empty());

        graph.set_dependencies(c("B1"), cells(&["A1"])).unwrap();
        graph.clear();
        assert_eq!(graph.len(), 0);
    }
}

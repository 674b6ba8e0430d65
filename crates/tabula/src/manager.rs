//! Cell store with dependency tracking
//!
//! [`DataManager`] owns the cells, the dependency graph between them and the
//! registered watchers. Every edit goes through [`DataManager::set_cell_content`]
//! or [`DataManager::clear_cell`], which either commit completely (store,
//! graph, recalculation and notifications) or leave everything untouched.
//!
//! # Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut manager = DataManager::new();
//! let a1: CellReference = "A1".parse().unwrap();
//! let b1: CellReference = "B1".parse().unwrap();
//!
//! manager.set_cell_content(a1, "5").unwrap();
//! manager.set_cell_content(b1, "=A1*2").unwrap();
//! assert_eq!(manager.get_cell_value(b1), Value::Integer(10));
//!
//! let summary = manager.set_cell_content(a1, "10").unwrap();
//! assert_eq!(summary.changed, vec![a1, b1]);
//! assert_eq!(manager.get_cell_value(b1), Value::Integer(20));
//! ```

use crate::document::{CellContent, LoadReport};
use crate::options::ManagerOptions;
use crate::watcher::{CellWatcher, Subscription, WatcherId};
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};
use tabula_core::{CellReference, Value};
use tabula_formula::{
    evaluate, DependencyGraph, EvaluationContext, Expression, FormulaError, FormulaResult, Parser,
    Registry,
};

/// Outcome of a committed edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcSummary {
    /// Cells whose value changed, in the order watchers saw them
    pub changed: Vec<CellReference>,
    /// Number of formulas evaluated
    pub recalculated: usize,
}

/// Read/write access to cells, as used by front ends
pub trait DataAccess {
    /// Current value of a cell, [`Value::Empty`] if it was never written
    fn get(&mut self, reference: CellReference) -> Value;

    /// Replace the raw content of a cell
    fn set(&mut self, reference: CellReference, raw: &str) -> Result<RecalcSummary>;

    /// Register a watcher for value changes
    fn subscribe(&mut self, watcher: Box<dyn CellWatcher + Send>) -> WatcherId;
}

#[derive(Debug, Clone)]
struct Cell {
    /// Raw content as entered
    text: String,
    /// Parsed formula, `None` for literals and rejected formulas
    expression: Option<Expression>,
    /// Last computed value
    value: Value,
    /// Why the value is an error, if it is one
    error: Option<FormulaError>,
}

impl Cell {
    fn literal(text: &str, value: Value) -> Self {
        Self {
            text: text.to_string(),
            expression: None,
            value,
            error: None,
        }
    }

    fn formula(text: &str, expression: Expression) -> Self {
        Self {
            text: text.to_string(),
            expression: Some(expression),
            value: Value::Empty,
            error: None,
        }
    }

    fn rejected(text: &str, error: FormulaError) -> Self {
        Self {
            text: text.to_string(),
            expression: None,
            value: Value::Error(error.cell_error()),
            error: Some(error),
        }
    }
}

/// Parsed raw content, ready to be committed
enum Content {
    Literal(Value),
    Formula(Expression),
}

impl Content {
    fn references(&self) -> BTreeSet<CellReference> {
        match self {
            Content::Literal(_) => BTreeSet::new(),
            Content::Formula(expression) => expression.references(),
        }
    }

    fn into_cell(self, text: &str) -> Cell {
        match self {
            Content::Literal(value) => Cell::literal(text, value),
            Content::Formula(expression) => Cell::formula(text, expression),
        }
    }
}

/// Spreadsheet data manager
pub struct DataManager {
    registry: &'static Registry,
    options: ManagerOptions,
    cells: BTreeMap<CellReference, Cell>,
    graph: DependencyGraph,
    /// Formula cells whose value must be computed before it is read
    ///
    /// Closed under dependents: every cell reading a stale cell is stale too.
    stale: BTreeSet<CellReference>,
    watchers: Vec<Subscription>,
    next_watcher: u64,
}

impl std::fmt::Debug for DataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataManager")
            .field("options", &self.options)
            .field("cells", &self.cells.len())
            .field("graph", &self.graph)
            .field("stale", &self.stale.len())
            .field("watchers", &self.watchers)
            .finish()
    }
}

impl Default for DataManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DataManager {
    /// Create an empty manager with the built-in functions
    pub fn new() -> Self {
        Self::with_options(ManagerOptions::default())
    }

    /// Create an empty manager with custom options
    pub fn with_options(options: ManagerOptions) -> Self {
        Self::with_registry(Registry::global(), options)
    }

    /// Create an empty manager using a custom function registry
    pub fn with_registry(registry: &'static Registry, options: ManagerOptions) -> Self {
        Self {
            registry,
            options,
            cells: BTreeMap::new(),
            graph: DependencyGraph::new(),
            stale: BTreeSet::new(),
            watchers: Vec::new(),
            next_watcher: 0,
        }
    }

    /// Options in effect
    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// Replace the raw content of a cell and recalculate everything that reads it
    ///
    /// Text starting with `=` is a formula, anything else a literal. Empty
    /// text clears the cell. Parse errors, cycles and self references reject
    /// the edit and leave the manager unchanged.
    pub fn set_cell_content(&mut self, reference: CellReference, raw: &str) -> Result<RecalcSummary> {
        if raw.is_empty() {
            return self.clear_cell(reference);
        }

        let content = self.compile(raw).and_then(|content| {
            self.graph
                .set_dependencies(reference, content.references())
                .map(|()| content)
        });
        let content = match content {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(cell = %reference, error = %err, "edit rejected");
                return Err(err);
            }
        };

        let mut targets = self.graph.affected_closure(reference);
        targets.insert(reference);
        let before = self.snapshot(&targets);

        self.store(reference, content.into_cell(raw));
        Ok(self.propagate(reference, before))
    }

    /// Delete a cell; cells reading it now see an empty value
    pub fn clear_cell(&mut self, reference: CellReference) -> Result<RecalcSummary> {
        if !self.cells.contains_key(&reference) {
            return Ok(RecalcSummary::default());
        }

        let mut targets = self.graph.affected_closure(reference);
        targets.insert(reference);
        let before = self.snapshot(&targets);

        self.graph.clear_dependencies(reference);
        self.cells.remove(&reference);
        self.stale.remove(&reference);
        Ok(self.propagate(reference, before))
    }

    /// Current value of a cell, computing stale formulas first
    ///
    /// Cells that were never written read as [`Value::Empty`].
    pub fn get_cell_value(&mut self, reference: CellReference) -> Value {
        if self.stale.contains(&reference) {
            let mut stale = self.stale_precedents([reference]);
            stale.insert(reference);
            let order = self.graph.topological_order(&stale);
            self.recalculate(&order);
        }

        self.cells
            .get(&reference)
            .map(|cell| cell.value.clone())
            .unwrap_or_default()
    }

    /// Stored value without computing anything; `None` if absent or stale
    pub fn cached_value(&self, reference: CellReference) -> Option<&Value> {
        self.cells
            .get(&reference)
            .filter(|_| !self.stale.contains(&reference))
            .map(|cell| &cell.value)
    }

    /// Value formatted for display, using the configured error text
    pub fn display_value(&mut self, reference: CellReference) -> String {
        match self.get_cell_value(reference) {
            Value::Error(code) => match &self.options.error_text {
                Some(text) => text.clone(),
                None => code.to_string(),
            },
            value => value.to_text(),
        }
    }

    /// Raw content as entered
    pub fn cell_text(&self, reference: CellReference) -> Option<&str> {
        self.cells.get(&reference).map(|cell| cell.text.as_str())
    }

    /// Parsed formula of a cell
    pub fn cell_expression(&self, reference: CellReference) -> Option<&Expression> {
        self.cells
            .get(&reference)
            .and_then(|cell| cell.expression.as_ref())
    }

    /// Why a cell holds an error value
    pub fn cell_error(&self, reference: CellReference) -> Option<&FormulaError> {
        self.cells
            .get(&reference)
            .and_then(|cell| cell.error.as_ref())
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether a formula cell still has to be computed
    pub fn is_dirty(&self, reference: CellReference) -> bool {
        self.stale.contains(&reference)
    }

    /// Stored cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellReference> + '_ {
        self.cells.keys().copied()
    }

    /// Register a watcher; it sees every value change from now on
    pub fn subscribe(&mut self, watcher: impl CellWatcher + Send + 'static) -> WatcherId {
        self.add_watcher(Box::new(watcher))
    }

    fn add_watcher(&mut self, watcher: Box<dyn CellWatcher + Send>) -> WatcherId {
        let id = WatcherId(self.next_watcher);
        self.next_watcher += 1;
        self.watchers.push(Subscription { id, watcher });
        id
    }

    /// Remove a watcher, returning whether it was registered
    pub fn unsubscribe(&mut self, id: WatcherId) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|subscription| subscription.id != id);
        self.watchers.len() != before
    }

    /// Evaluate a formula against the current cells without storing it
    ///
    /// The leading `=` is optional.
    pub fn evaluate_formula(&mut self, text: &str) -> Result<Value> {
        let parser = Parser::new(self.registry);
        let expression = if text.trim_start().starts_with('=') {
            parser.parse_formula(text)?
        } else {
            parser.parse_expression(text)?
        };
        self.check_ranges(&expression)?;

        let mut stale: BTreeSet<CellReference> = expression
            .references()
            .into_iter()
            .filter(|cell| self.stale.contains(cell))
            .collect();
        if !stale.is_empty() {
            let ancestors = self.stale_precedents(stale.iter().copied());
            stale.extend(ancestors);
            let order = self.graph.topological_order(&stale);
            self.recalculate(&order);
        }

        let cells = &self.cells;
        let resolver = |cell: CellReference| -> FormulaResult<Value> { Ok(stored_value(cells, cell)) };
        let ctx = EvaluationContext::new(&resolver).with_registry(self.registry);
        evaluate(&expression, &ctx)
    }

    /// Insert many cells at once without evaluating them
    ///
    /// Formulas are computed on first read. Existing cells with the same
    /// reference are replaced. A formula that does not parse or would close
    /// a cycle is stored as text with an error value and reported.
    pub fn load<I, S>(&mut self, contents: I) -> LoadReport
    where
        I: IntoIterator<Item = (CellReference, S)>,
        S: AsRef<str>,
    {
        let mut report = LoadReport::default();

        for (reference, text) in contents {
            let text = text.as_ref();
            if text.is_empty() {
                self.graph.clear_dependencies(reference);
                self.cells.remove(&reference);
                self.stale.remove(&reference);
                self.mark_dependents_stale(reference);
                continue;
            }

            let outcome = self.compile(text).and_then(|content| {
                self.graph
                    .set_dependencies(reference, content.references())
                    .map(|()| content)
            });
            let cell = match outcome {
                Ok(content) => content.into_cell(text),
                Err(err) => {
                    tracing::warn!(cell = %reference, error = %err, "rejected while loading");
                    self.graph.clear_dependencies(reference);
                    report.rejected.push((reference, err.clone()));
                    Cell::rejected(text, err)
                }
            };

            self.store(reference, cell);
            self.mark_dependents_stale(reference);
            report.loaded += 1;
        }

        tracing::debug!(
            loaded = report.loaded,
            rejected = report.rejected.len(),
            "document loaded"
        );
        report
    }

    /// Raw contents of every stored cell, in row-major order
    pub fn export(&self) -> Vec<CellContent> {
        self.cells
            .iter()
            .map(|(&reference, cell)| CellContent::new(reference, cell.text.clone()))
            .collect()
    }

    /// Parse raw text into a literal or a formula within the configured limits
    fn compile(&self, raw: &str) -> Result<Content> {
        if !raw.trim_start().starts_with('=') {
            return Ok(Content::Literal(Value::parse_literal(raw)));
        }

        let expression = Parser::new(self.registry).parse_formula(raw)?;
        self.check_ranges(&expression)?;
        Ok(Content::Formula(expression))
    }

    fn check_ranges(&self, expression: &Expression) -> Result<()> {
        let limit = self.options.max_range_cells;
        match expression
            .ranges()
            .into_iter()
            .find(|range| range.cell_count() > limit)
        {
            Some(range) => Err(FormulaError::ExpressionParsing(format!(
                "range {} covers {} cells, more than the limit of {}",
                range,
                range.cell_count(),
                limit
            ))),
            None => Ok(()),
        }
    }

    /// Store a cell, queueing it for computation if it holds a formula
    fn store(&mut self, reference: CellReference, cell: Cell) {
        if cell.expression.is_some() {
            self.stale.insert(reference);
        } else {
            self.stale.remove(&reference);
        }
        self.cells.insert(reference, cell);
    }

    fn mark_dependents_stale(&mut self, reference: CellReference) {
        let mut queue: Vec<CellReference> = self.graph.dependents(reference).collect();
        while let Some(cell) = queue.pop() {
            // Dependents of a stale cell are already stale
            if self.stale.insert(cell) {
                queue.extend(self.graph.dependents(cell));
            }
        }
    }

    /// Stale cells that `roots` read, directly or through other stale cells
    ///
    /// A clean cell never reads a stale one, so the walk only needs to
    /// follow stale cells.
    fn stale_precedents(
        &self,
        roots: impl IntoIterator<Item = CellReference>,
    ) -> BTreeSet<CellReference> {
        let mut found = BTreeSet::new();
        if self.stale.is_empty() {
            return found;
        }

        let mut queue: Vec<CellReference> = roots
            .into_iter()
            .filter(|cell| self.stale.contains(cell))
            .collect();
        while let Some(cell) = queue.pop() {
            for precedent in self.graph.precedents(cell) {
                if self.stale.contains(&precedent) && found.insert(precedent) {
                    queue.push(precedent);
                }
            }
        }
        found
    }

    fn snapshot(&self, targets: &BTreeSet<CellReference>) -> BTreeMap<CellReference, Value> {
        targets
            .iter()
            .map(|&cell| (cell, stored_value(&self.cells, cell)))
            .collect()
    }

    /// Recalculate the cells in `before` after `edited` was committed, then notify
    fn propagate(
        &mut self,
        edited: CellReference,
        before: BTreeMap<CellReference, Value>,
    ) -> RecalcSummary {
        // Stale precedents left over from a load are refreshed as well
        let mut subset: BTreeSet<CellReference> = before.keys().copied().collect();
        let stale = self.stale_precedents(subset.iter().copied());
        subset.extend(stale);

        let order = self.graph.topological_order(&subset);
        let recalculated = self.recalculate(&order);

        let changed: Vec<(CellReference, Value)> = order
            .iter()
            .filter_map(|cell| {
                let old = before.get(cell)?;
                let new = stored_value(&self.cells, *cell);
                (!same_value(old, &new)).then_some((*cell, new))
            })
            .collect();

        for (cell, value) in &changed {
            for subscription in &mut self.watchers {
                subscription.watcher.on_cell_changed(*cell, value);
            }
        }

        tracing::debug!(
            cell = %edited,
            recalculated,
            changed = changed.len(),
            "edit committed"
        );

        RecalcSummary {
            changed: changed.into_iter().map(|(cell, _)| cell).collect(),
            recalculated,
        }
    }

    /// Evaluate the formula cells of `order`, which must be topologically sorted
    fn recalculate(&mut self, order: &[CellReference]) -> usize {
        let mut evaluated = 0;

        for &cell in order {
            self.stale.remove(&cell);
            let outcome = match self.cells.get(&cell) {
                Some(Cell {
                    expression: Some(expression),
                    ..
                }) => {
                    let cells = &self.cells;
                    let resolver = |reference: CellReference| -> FormulaResult<Value> {
                        Ok(stored_value(cells, reference))
                    };
                    let ctx = EvaluationContext::new(&resolver)
                        .with_registry(self.registry)
                        .for_cell(cell);
                    evaluate(expression, &ctx)
                }
                _ => continue,
            };

            if let Some(entry) = self.cells.get_mut(&cell) {
                match outcome {
                    Ok(value) => {
                        entry.value = value;
                        entry.error = None;
                    }
                    Err(err) => {
                        entry.value = Value::Error(err.cell_error());
                        entry.error = Some(err);
                    }
                }
                tracing::trace!(%cell, value = %entry.value, "recalculated");
            }
            evaluated += 1;
        }

        evaluated
    }
}

/// Equal and of the same kind, so `2` and `2.0` count as a change
fn same_value(old: &Value, new: &Value) -> bool {
    std::mem::discriminant(old) == std::mem::discriminant(new) && old == new
}

fn stored_value(cells: &BTreeMap<CellReference, Cell>, reference: CellReference) -> Value {
    cells
        .get(&reference)
        .map(|cell| cell.value.clone())
        .unwrap_or_default()
}

impl DataAccess for DataManager {
    fn get(&mut self, reference: CellReference) -> Value {
        self.get_cell_value(reference)
    }

    fn set(&mut self, reference: CellReference, raw: &str) -> Result<RecalcSummary> {
        self.set_cell_content(reference, raw)
    }

    fn subscribe(&mut self, watcher: Box<dyn CellWatcher + Send>) -> WatcherId {
        self.add_watcher(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use tabula_core::CellError;

    fn cell(a1: &str) -> CellReference {
        a1.parse().unwrap()
    }

    fn recorder(manager: &mut DataManager) -> Arc<Mutex<Vec<(String, Value)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        manager.subscribe(move |reference: CellReference, value: &Value| {
            sink.lock().unwrap().push((reference.to_string(), value.clone()));
        });
        seen
    }

    #[test]
    fn test_literal_and_formula() {
        let mut manager = DataManager::new();
        manager.set_cell_content(cell("A1"), "5").unwrap();
        manager.set_cell_content(cell("A2"), "hello").unwrap();
        manager.set_cell_content(cell("A3"), "=A1*2").unwrap();

        assert_eq!(manager.get_cell_value(cell("A1")), Value::Integer(5));
        assert_eq!(manager.get_cell_value(cell("A2")), Value::String("hello".into()));
        assert_eq!(manager.get_cell_value(cell("A3")), Value::Integer(10));
        assert_eq!(manager.get_cell_value(cell("Z99")), Value::Empty);
        assert_eq!(manager.cell_text(cell("A3")), Some("=A1*2"));
        assert_eq!(manager.cell_count(), 3);
    }

    #[test]
    fn test_summary_lists_changes_in_order() {
        let mut manager = DataManager::new();
        manager.set_cell_content(cell("A1"), "5").unwrap();
        manager.set_cell_content(cell("B1"), "=A1*2").unwrap();
        manager.set_cell_content(cell("C1"), "=B1+1").unwrap();
        manager.set_cell_content(cell("D1"), "7").unwrap();

        let summary = manager.set_cell_content(cell("A1"), "10").unwrap();
        assert_eq!(summary.changed, vec![cell("A1"), cell("B1"), cell("C1")]);
        assert_eq!(summary.recalculated, 2);
    }

    #[test]
    fn test_rejected_edit_changes_nothing() {
        let mut manager = DataManager::new();
        manager.set_cell_content(cell("A1"), "=B1").unwrap();
        let seen = recorder(&mut manager);

        let err = manager.set_cell_content(cell("B1"), "=A1").unwrap_err();
        assert!(matches!(err, FormulaError::DataDependency { .. }));
        let err = manager.set_cell_content(cell("A1"), "=A1+1").unwrap_err();
        assert_eq!(err, FormulaError::DataSelfReference(cell("A1")));
        let err = manager.set_cell_content(cell("A1"), "=1+").unwrap_err();
        assert!(matches!(err, FormulaError::ExpressionParsing(_)));

        assert_eq!(manager.cell_text(cell("A1")), Some("=B1"));
        assert_eq!(manager.cell_text(cell("B1")), None);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_range_limit() {
        let options = ManagerOptions::default().with_max_range_cells(4);
        let mut manager = DataManager::with_options(options);

        assert!(manager.set_cell_content(cell("C1"), "=SUM(A1:B2)").is_ok());
        let err = manager.set_cell_content(cell("C2"), "=SUM(A1:B3)").unwrap_err();
        assert!(matches!(err, FormulaError::ExpressionParsing(_)));
        assert_eq!(manager.cell_count(), 1);
    }

    #[test]
    fn test_error_state() {
        let mut manager = DataManager::new();
        manager.set_cell_content(cell("A1"), "=1/0").unwrap();
        manager.set_cell_content(cell("A2"), "=A1+1").unwrap();
        manager.set_cell_content(cell("A3"), "=2+2").unwrap();

        assert_eq!(manager.get_cell_value(cell("A1")), Value::Error(CellError::Div0));
        assert_eq!(manager.get_cell_value(cell("A2")), Value::Error(CellError::Div0));
        assert_eq!(manager.get_cell_value(cell("A3")), Value::Integer(4));
        assert!(manager.cell_error(cell("A1")).is_some());
        assert!(manager.cell_error(cell("A3")).is_none());

        // Fixing the source recovers every reader
        let summary = manager.set_cell_content(cell("A1"), "1").unwrap();
        assert_eq!(summary.changed, vec![cell("A1"), cell("A2")]);
        assert_eq!(manager.get_cell_value(cell("A2")), Value::Integer(2));
        assert!(manager.cell_error(cell("A2")).is_none());
    }

    #[test]
    fn test_display_value() {
        let mut manager = DataManager::new();
        manager.set_cell_content(cell("A1"), "=1/0").unwrap();
        manager.set_cell_content(cell("A2"), "=2.5*2").unwrap();
        assert_eq!(manager.display_value(cell("A1")), "#DIV/0!");
        assert_eq!(manager.display_value(cell("A2")), "5");

        let mut manager = DataManager::with_options(ManagerOptions::default().with_error_text("ERR"));
        manager.set_cell_content(cell("A1"), "=1/0").unwrap();
        assert_eq!(manager.display_value(cell("A1")), "ERR");
    }

    #[test]
    fn test_clear_cell() {
        let mut manager = DataManager::new();
        manager.set_cell_content(cell("A1"), "3").unwrap();
        manager.set_cell_content(cell("B1"), "=A1+1").unwrap();
        let seen = recorder(&mut manager);

        let summary = manager.clear_cell(cell("A1")).unwrap();
        assert_eq!(summary.changed, vec![cell("A1"), cell("B1")]);
        assert_eq!(manager.get_cell_value(cell("B1")), Value::Integer(1));
        assert_eq!(manager.cell_text(cell("A1")), None);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("A1".to_string(), Value::Empty), ("B1".to_string(), Value::Integer(1))]
        );

        // Empty text is the same as clearing
        manager.set_cell_content(cell("B1"), "").unwrap();
        assert_eq!(manager.cell_count(), 0);
        assert_eq!(manager.clear_cell(cell("C1")).unwrap(), RecalcSummary::default());
    }

    #[test]
    fn test_unsubscribe() {
        let mut manager = DataManager::new();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = manager.subscribe(move |_: CellReference, _: &Value| *sink.lock().unwrap() += 1);

        manager.set_cell_content(cell("A1"), "1").unwrap();
        assert!(manager.unsubscribe(id));
        assert!(!manager.unsubscribe(id));
        manager.set_cell_content(cell("A1"), "2").unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_load_is_lazy() {
        let mut manager = DataManager::new();
        let seen = recorder(&mut manager);
        let report = manager.load(vec![
            (cell("A2"), "=A1*3"),
            (cell("A1"), "2"),
            (cell("A3"), "=A2+A1"),
        ]);

        assert!(report.is_clean());
        assert_eq!(report.loaded, 3);
        assert!(manager.is_dirty(cell("A3")));
        assert_eq!(manager.cached_value(cell("A3")), None);
        assert_eq!(manager.cached_value(cell("A1")), Some(&Value::Integer(2)));

        assert_eq!(manager.get_cell_value(cell("A3")), Value::Integer(8));
        assert!(!manager.is_dirty(cell("A2")));
        assert_eq!(manager.cached_value(cell("A2")), Some(&Value::Integer(6)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_load_rejects_bad_formulas() {
        let mut manager = DataManager::new();
        let report = manager.load(vec![
            (cell("A1"), "=B1"),
            (cell("B1"), "=A1"),
            (cell("C1"), "=SUM("),
            (cell("D1"), "=D1"),
        ]);

        assert_eq!(report.loaded, 4);
        let rejected: Vec<_> = report.rejected.iter().map(|(cell, _)| cell.to_string()).collect();
        assert_eq!(rejected, vec!["B1", "C1", "D1"]);
        assert_eq!(manager.get_cell_value(cell("B1")), Value::Error(CellError::Cycle));
        assert_eq!(manager.get_cell_value(cell("C1")), Value::Error(CellError::Name));
        assert_eq!(manager.cell_text(cell("B1")), Some("=A1"));
        assert_eq!(manager.get_cell_value(cell("A1")), Value::Error(CellError::Cycle));
    }

    #[test]
    fn test_export_round_trip() {
        let mut manager = DataManager::new();
        manager.set_cell_content(cell("B2"), "=A1+1").unwrap();
        manager.set_cell_content(cell("A1"), "1").unwrap();
        manager.set_cell_content(cell("C1"), "text").unwrap();

        let exported = manager.export();
        let refs: Vec<_> = exported.iter().map(|c| c.reference.to_string()).collect();
        assert_eq!(refs, vec!["A1", "C1", "B2"]);

        let mut copy = DataManager::new();
        copy.load(exported.into_iter().map(<(CellReference, String)>::from));
        assert_eq!(copy.get_cell_value(cell("B2")), Value::Integer(2));
    }

    #[test]
    fn test_evaluate_formula() {
        let mut manager = DataManager::new();
        manager.load(vec![(cell("A1"), "4"), (cell("A2"), "=A1*2")]);

        assert_eq!(manager.evaluate_formula("=SUM(A1:A2)").unwrap(), Value::Integer(12));
        assert_eq!(manager.evaluate_formula("A2 - 1").unwrap(), Value::Integer(7));
        assert!(manager.evaluate_formula("=FOO(1)").is_err());
        assert_eq!(manager.cell_count(), 2);
    }

    #[test]
    fn test_data_access() {
        fn drive(access: &mut dyn DataAccess) -> Value {
            access.set(cell("A1"), "=2^3").unwrap();
            access.get(cell("A1"))
        }

        let mut manager = DataManager::new();
        assert_eq!(drive(&mut manager), Value::Integer(8));
    }
}

//! Built-in functions

pub mod logical;
pub mod math;
pub mod statistical;
pub mod text;

use crate::ast::Expression;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::EvaluationContext;
use ahash::AHashMap;
use tabula_core::Value;

/// Function taking already-evaluated arguments
pub type EagerFn = fn(&[Value], &EvaluationContext) -> FormulaResult<Value>;

/// Function deciding itself which arguments to evaluate
pub type LazyFn = fn(&[Expression], &EvaluationContext) -> FormulaResult<Value>;

/// Function implementation
///
/// Nearly every function is eager: arguments are evaluated left to right
/// before the call. Short-circuiting functions (IF, IFERROR) are lazy.
#[derive(Clone, Copy)]
pub enum FunctionImpl {
    Eager(EagerFn),
    Lazy(LazyFn),
}

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Define an eager function
    pub fn eager(name: &'static str, min_args: usize, max_args: Option<usize>, f: EagerFn) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation: FunctionImpl::Eager(f),
        }
    }

    /// Define a short-circuiting function
    pub fn lazy(name: &'static str, min_args: usize, max_args: Option<usize>, f: LazyFn) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation: FunctionImpl::Lazy(f),
        }
    }

    /// Human-readable argument count, e.g. "2", "at least 1", "2 to 3"
    pub fn expected_arguments(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }

    /// Check an argument count against the declared arity
    pub fn check_arity(&self, actual: usize) -> FormulaResult<()> {
        let too_few = actual < self.min_args;
        let too_many = self.max_args.map_or(false, |max| actual > max);
        if too_few || too_many {
            return Err(FormulaError::FunctionArgument {
                function: self.name.to_string(),
                expected: self.expected_arguments(),
                actual,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_math_functions();
        registry.register_statistical_functions();
        registry.register_text_functions();
        registry.register_logical_functions();

        registry
    }

    /// Create a registry without any functions
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function, replacing any function of the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check whether the registry has no functions
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn register_math_functions(&mut self) {
        // Constants
        self.register(FunctionDef::eager("PI", 0, Some(0), math::fn_pi));
        self.register(FunctionDef::eager("E", 0, Some(0), math::fn_e));

        self.register(FunctionDef::eager("POW", 2, Some(2), math::fn_pow));
        self.register(FunctionDef::eager("SQRT", 1, Some(1), math::fn_sqrt));
        self.register(FunctionDef::eager("CBRT", 1, Some(1), math::fn_cbrt));
        self.register(FunctionDef::eager("ABS", 1, Some(1), math::fn_abs));
        self.register(FunctionDef::eager("CEILING", 1, Some(1), math::fn_ceiling));
        self.register(FunctionDef::eager("FLOOR", 1, Some(1), math::fn_floor));
        self.register(FunctionDef::eager("MOD", 2, Some(2), math::fn_mod));

        // Trigonometry
        self.register(FunctionDef::eager("SIN", 1, Some(1), math::fn_sin));
        self.register(FunctionDef::eager("COS", 1, Some(1), math::fn_cos));
        self.register(FunctionDef::eager("TAN", 1, Some(1), math::fn_tan));
        self.register(FunctionDef::eager("CTG", 1, Some(1), math::fn_ctg));
        self.register(FunctionDef::eager("ASIN", 1, Some(1), math::fn_asin));
        self.register(FunctionDef::eager("ACOS", 1, Some(1), math::fn_acos));
        self.register(FunctionDef::eager("ATAN", 1, Some(1), math::fn_atan));

        // Logarithms
        self.register(FunctionDef::eager("LN", 1, Some(1), math::fn_ln));
        self.register(FunctionDef::eager("LOG", 2, Some(2), math::fn_log));
    }

    fn register_statistical_functions(&mut self) {
        self.register(FunctionDef::eager("SUM", 1, None, statistical::fn_sum));
        self.register(FunctionDef::eager("AVERAGE", 1, None, statistical::fn_average));
        self.register(FunctionDef::eager("COUNT", 1, None, statistical::fn_count));
        self.register(FunctionDef::eager("MIN", 1, None, statistical::fn_min));
        self.register(FunctionDef::eager("MAX", 1, None, statistical::fn_max));
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef::eager("CONTAINS", 2, Some(2), text::fn_contains));
        self.register(FunctionDef::eager("CONCAT", 1, None, text::fn_concat));
        self.register(FunctionDef::eager("REPEAT", 2, Some(2), text::fn_repeat));
        self.register(FunctionDef::eager("LENGTH", 1, Some(1), text::fn_length));
        self.register(FunctionDef::eager("STRING", 1, Some(1), text::fn_string));
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef::lazy("IF", 2, Some(3), logical::fn_if));
        self.register(FunctionDef::lazy("IFERROR", 2, Some(2), logical::fn_iferror));
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch a scalar argument as a double
pub(crate) fn number_arg(name: &str, args: &[Value], index: usize) -> FormulaResult<f64> {
    match args.get(index) {
        Some(Value::Iterable(_)) => Err(FormulaError::evaluation(
            tabula_core::CellError::Value,
            format!("{}: argument {} must be a single value", name, index + 1),
        )),
        Some(value) => Ok(value.to_f64()?),
        None => Err(FormulaError::FunctionArgument {
            function: name.to_string(),
            expected: format!("at least {}", index + 1),
            actual: args.len(),
        }),
    }
}

/// Fetch a scalar argument as text
pub(crate) fn text_arg(name: &str, args: &[Value], index: usize) -> FormulaResult<String> {
    match args.get(index) {
        Some(Value::Iterable(_)) => Err(FormulaError::evaluation(
            tabula_core::CellError::Value,
            format!("{}: argument {} must be a single value", name, index + 1),
        )),
        Some(value) => Ok(value.to_text()),
        None => Err(FormulaError::FunctionArgument {
            function: name.to_string(),
            expected: format!("at least {}", index + 1),
            actual: args.len(),
        }),
    }
}

//! Error types for binding and evaluating transformations.

use thiserror::Error;

/// Which side of a transformation a species specification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecRole {
    Consumed,
    Produced,
}

impl std::fmt::Display for SpecRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecRole::Consumed => f.write_str("consumed"),
            SpecRole::Produced => f.write_str("produced"),
        }
    }
}

/// Species lookup failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("'{role}' species specification is empty")]
    EmptySpec { role: SpecRole },

    #[error("'{role}' specification '{spec}' matches no species in the catalog")]
    UnknownSpecies { role: SpecRole, spec: String },

    #[error("'{role}' specification '{spec}' is ambiguous, matches {candidates:?}")]
    AmbiguousSpec {
        role: SpecRole,
        spec: String,
        candidates: Vec<String>,
    },

    #[error("kinetics '{kinetics}' references no species")]
    NoInputSpecies { kinetics: String },

    #[error("kinetics '{kinetics}' could not be tokenized: {message}")]
    Tokenize { kinetics: String, message: String },
}

/// Failures while substituting parameters and slots into the kinetics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("parameter '{name}' has no value in parameter_values")]
    MissingParameterValue { name: String },

    #[error("parameter '{name}' is declared but never used in the kinetics")]
    UnusedParameter { name: String },

    #[error("parameter '{name}' has the same name as a chemical species")]
    ParameterShadowsSpecies { name: String },

    #[error("parameter '{name}' has non-finite value {value}")]
    NonFiniteParameter { name: String, value: f64 },

    #[error("identifier '{name}' is neither a species, a parameter nor a constant")]
    UnknownIdentifier { name: String },
}

/// Failures turning bound tokens into an executable program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("syntax error: {message}")]
    Syntax { message: String },

    #[error("unknown function '{name}' with {arity} argument(s)")]
    UnknownFunction { name: String, arity: usize },

    #[error("expression does not reduce to a single value")]
    StackImbalance,

    #[error("unsupported token {token}")]
    UnsupportedToken { token: String },
}

/// Runtime numeric faults in the grid pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("non-finite transfer {value} at cell ({x}, {y}, {z})")]
    NonFinite {
        x: usize,
        y: usize,
        z: usize,
        value: f64,
    },
}

/// Anything that stops a single transformation from being applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("binding failed: {0}")]
    Binding(#[from] BindingError),

    #[error("compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("framework '{framework}' is not defined in CYCLING_FRAMEWORKS")]
    UnknownFramework { framework: String },

    #[error("transformation record '{ordinal}' is missing")]
    MissingRecord { ordinal: u32 },

    #[error("transformation record '{ordinal}' could not be read: {reason}")]
    InvalidRecord { ordinal: u32, reason: String },
}

/// Crate-level errors outside the per-transformation path.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("species catalog error: {0}")]
    Catalog(String),

    #[error("compartment '{0}' already exists")]
    DuplicateCompartment(String),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config(message.into())
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        EngineError::Catalog(message.into())
    }
}

/// A transformation that could not be applied, with enough context for the user to find it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("compartment '{compartment}', framework '{framework}', transformation {}: {error}",
    .ordinal.map(|o| o.to_string()).unwrap_or_else(|| "-".to_string()))]
pub struct TransformationFailure {
    pub compartment: String,
    pub framework: String,
    pub ordinal: Option<u32>,
    pub error: TransformError,
}

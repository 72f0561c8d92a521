pub mod validation;

pub use validation::ParameterValidator;

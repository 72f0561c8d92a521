use crate::ai::ModelParameters;
use crate::error::AgentError;

pub struct ParameterValidator;

impl ParameterValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, parameters: &ModelParameters) -> Result<(), AgentError> {
        self.validate_temperature(parameters.temperature)?;
        self.validate_top_p(parameters.top_p)?;
        self.validate_max_tokens(parameters.max_tokens)
    }

    pub fn validate_temperature(&self, temperature: f32) -> Result<(), AgentError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AgentError::InvalidParameter(format!(
                "Temperature must be between 0 and 2, got {temperature}"
            )));
        }
        Ok(())
    }

    pub fn validate_top_p(&self, top_p: f32) -> Result<(), AgentError> {
        if !(0.0..=1.0).contains(&top_p) {
            return Err(AgentError::InvalidParameter(format!(
                "Top-p must be between 0 and 1, got {top_p}"
            )));
        }
        Ok(())
    }

    pub fn validate_max_tokens(&self, max_tokens: usize) -> Result<(), AgentError> {
        if max_tokens == 0 {
            return Err(AgentError::InvalidParameter(
                "Max tokens must be positive, got 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ParameterValidator {
    fn default() -> Self {
        Self::new()
    }
}

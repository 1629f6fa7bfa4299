use crate::EngineError;

/// One named user parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: f64,
    error: f64,
    lower: Option<f64>,
    upper: Option<f64>,
    fixed: bool,
}

impl Parameter {
    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Current step size or uncertainty.
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Lower limit, if any.
    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    /// Upper limit, if any.
    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    /// Is the parameter held constant during minimization?
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Does the parameter have at least one limit?
    pub fn has_limits(&self) -> bool {
        self.lower.is_some() || self.upper.is_some()
    }
}

/// Ordered list of user parameters, addressed by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    /// No parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free, unbounded parameter. Returns its index.
    pub fn add(&mut self, name: impl Into<String>, value: f64, error: f64) -> usize {
        self.params.push(Parameter {
            name: name.into(),
            value,
            error: error.abs(),
            lower: None,
            upper: None,
            fixed: false,
        });
        self.params.len() - 1
    }

    /// Add a free parameter bounded on both sides. Returns its index.
    pub fn add_limited(
        &mut self,
        name: impl Into<String>,
        value: f64,
        error: f64,
        lower: f64,
        upper: f64,
    ) -> Result<usize, EngineError> {
        let index = self.add(name, value, error);
        if let Err(e) = self.set_limits(index, lower, upper) {
            self.params.pop();
            return Err(e);
        }
        Ok(index)
    }

    /// Hold a parameter at its current value.
    pub fn fix(&mut self, index: usize) -> Result<(), EngineError> {
        self.get_mut(index)?.fixed = true;
        Ok(())
    }

    /// Let a fixed parameter vary again.
    pub fn release(&mut self, index: usize) -> Result<(), EngineError> {
        self.get_mut(index)?.fixed = false;
        Ok(())
    }

    /// Move a parameter to a new value.
    pub fn set_value(&mut self, index: usize, value: f64) -> Result<(), EngineError> {
        let p = self.get_mut(index)?;
        if !value.is_finite() {
            return Err(EngineError::NonFinite {
                name: p.name.clone(),
                what: "value",
            });
        }
        p.value = value;
        Ok(())
    }

    /// Bound a parameter on both sides.
    pub fn set_limits(&mut self, index: usize, lower: f64, upper: f64) -> Result<(), EngineError> {
        let p = self.get_mut(index)?;
        if !lower.is_finite() || !upper.is_finite() {
            return Err(EngineError::NonFinite {
                name: p.name.clone(),
                what: "limit",
            });
        }
        if lower >= upper {
            return Err(EngineError::InvalidLimits {
                name: p.name.clone(),
                lower,
                upper,
            });
        }
        p.lower = Some(lower);
        p.upper = Some(upper);
        Ok(())
    }

    /// Bound a parameter from below only. Replaces any existing limits.
    pub fn set_lower_limit(&mut self, index: usize, lower: f64) -> Result<(), EngineError> {
        let p = self.get_mut(index)?;
        if !lower.is_finite() {
            return Err(EngineError::NonFinite {
                name: p.name.clone(),
                what: "limit",
            });
        }
        p.lower = Some(lower);
        p.upper = None;
        Ok(())
    }

    /// Bound a parameter from above only. Replaces any existing limits.
    pub fn set_upper_limit(&mut self, index: usize, upper: f64) -> Result<(), EngineError> {
        let p = self.get_mut(index)?;
        if !upper.is_finite() {
            return Err(EngineError::NonFinite {
                name: p.name.clone(),
                what: "limit",
            });
        }
        p.lower = None;
        p.upper = Some(upper);
        Ok(())
    }

    /// Number of parameters, fixed ones included.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Are there no parameters at all?
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of parameters that are not fixed.
    pub fn n_free(&self) -> usize {
        self.params.iter().filter(|p| !p.fixed).count()
    }

    /// Parameter at `index`.
    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    /// All parameters in order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Current values of all parameters.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }

    /// Current errors of all parameters.
    pub fn errors(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.error).collect()
    }

    /// Parameter at `index`, or an error naming the valid range.
    pub fn checked(&self, index: usize) -> Result<&Parameter, EngineError> {
        let len = self.params.len();
        self.params
            .get(index)
            .ok_or(EngineError::ParameterOutOfRange { index, len })
    }

    /// Overwrite value and error without validation, for results.
    pub(crate) fn set_state(&mut self, index: usize, value: f64, error: f64) {
        if let Some(p) = self.params.get_mut(index) {
            p.value = value;
            p.error = error;
        }
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Parameter, EngineError> {
        let len = self.params.len();
        self.params
            .get_mut(index)
            .ok_or(EngineError::ParameterOutOfRange { index, len })
    }
}

impl std::ops::Index<usize> for Parameters {
    type Output = Parameter;

    fn index(&self, index: usize) -> &Self::Output {
        &self.params[index]
    }
}

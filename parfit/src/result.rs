use std::io;

use parfit_engine::{FunctionMinimum, MinosError};
use serde::Serialize;

use crate::{Error, WorkloadId};

/// Asymmetric interval reported for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinosSummary {
    /// Parameter index.
    pub parameter: usize,
    /// Were both crossings found?
    pub valid: bool,
    /// Offset to the lower crossing, negative.
    pub lower: f64,
    /// Offset to the upper crossing, positive.
    pub upper: f64,
}

impl From<&MinosError> for MinosSummary {
    fn from(e: &MinosError) -> Self {
        Self {
            parameter: e.parameter(),
            valid: e.is_valid(),
            lower: e.lower(),
            upper: e.upper(),
        }
    }
}

/// Outcome of one workload.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Name of the engine that produced the result.
    pub runner: &'static str,
    /// Which workload ran.
    pub workload: WorkloadId,
    /// Algorithm label of the workload.
    pub algorithm: &'static str,
    /// Engine validity flag.
    pub valid: bool,
    /// Objective value at the minimum.
    pub fval: f64,
    /// Estimated distance to the minimum.
    pub edm: f64,
    /// Objective evaluations, as counted by the engine.
    pub nfcn: usize,
    /// Every parameter value, fixed ones included.
    pub params: Vec<f64>,
    /// Every parameter error, fixed ones included.
    pub errors: Vec<f64>,
    /// Covariance of the free parameters, row-major.
    pub covariance: Option<Vec<Vec<f64>>>,
    /// Asymmetric interval, for workloads that request one.
    pub minos: Option<MinosSummary>,
}

impl RunResult {
    /// Collect the reported quantities from a minimum.
    pub fn from_minimum(
        workload: WorkloadId,
        algorithm: &'static str,
        minimum: &FunctionMinimum,
        minos: Option<MinosSummary>,
    ) -> Self {
        let state = minimum.user_state();
        Self {
            runner: parfit_engine::ENGINE_NAME,
            workload,
            algorithm,
            valid: minimum.is_valid(),
            fval: minimum.fval(),
            edm: minimum.edm(),
            nfcn: minimum.nfcn(),
            params: state.params(),
            errors: state.errors(),
            covariance: state.covariance().map(|c| c.to_rows()),
            minos,
        }
    }

    /// Is a covariance matrix present?
    pub fn has_covariance(&self) -> bool {
        self.covariance.is_some()
    }

    /// Is a Minos interval present?
    pub fn has_minos(&self) -> bool {
        self.minos.is_some()
    }

    /// One-line JSON object with a fixed key order. Floats are written with
    /// 17 significant digits, non-finite ones as `null`.
    pub fn to_json(&self) -> Result<String, Error> {
        let view = RunResultJson {
            runner: self.runner,
            workload: self.workload.as_str(),
            algorithm: self.algorithm,
            valid: self.valid,
            fval: self.fval,
            edm: self.edm,
            nfcn: self.nfcn,
            params: &self.params,
            errors: &self.errors,
            has_covariance: self.has_covariance(),
            covariance: self.covariance.as_deref(),
            has_minos: self.has_minos(),
            minos: self.minos.map(|m| MinosJson {
                valid: m.valid,
                parameter: m.parameter,
                lower: m.lower,
                upper: m.upper,
            }),
        };
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, ScientificFloats);
        view.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

#[derive(Serialize)]
struct RunResultJson<'a> {
    runner: &'a str,
    workload: &'a str,
    algorithm: &'a str,
    valid: bool,
    fval: f64,
    edm: f64,
    nfcn: usize,
    params: &'a [f64],
    errors: &'a [f64],
    has_covariance: bool,
    covariance: Option<&'a [Vec<f64>]>,
    has_minos: bool,
    minos: Option<MinosJson>,
}

#[derive(Serialize)]
struct MinosJson {
    valid: bool,
    parameter: usize,
    lower: f64,
    upper: f64,
}

/// Writes every finite float as `{:.16e}`, enough digits to round-trip.
struct ScientificFloats;

impl serde_json::ser::Formatter for ScientificFloats {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        write!(writer, "{value:.16e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunResult {
        RunResult {
            runner: "parfit-engine",
            workload: WorkloadId::Quadratic2MinosP0,
            algorithm: "migrad+hesse+minos",
            valid: true,
            fval: 0.5,
            edm: 0.125,
            nfcn: 42,
            params: vec![1.0, -2.0],
            errors: vec![0.1, f64::NAN],
            covariance: Some(vec![vec![1.0, 0.0], vec![0.0, 0.25]]),
            minos: Some(MinosSummary {
                parameter: 0,
                valid: true,
                lower: -0.5,
                upper: 0.5,
            }),
        }
    }

    #[test]
    fn key_order_and_float_format() {
        let json = sample().to_json().unwrap();
        let expected = concat!(
            r#"{"runner":"parfit-engine","workload":"quadratic2_minos_p0","#,
            r#""algorithm":"migrad+hesse+minos","valid":true,"#,
            r#""fval":5.0000000000000000e-1,"edm":1.2500000000000000e-1,"nfcn":42,"#,
            r#""params":[1.0000000000000000e0,-2.0000000000000000e0],"#,
            r#""errors":[1.0000000000000001e-1,null],"has_covariance":true,"#,
            r#""covariance":[[1.0000000000000000e0,0.0000000000000000e0],[0.0000000000000000e0,2.5000000000000000e-1]],"#,
            r#""has_minos":true,"#,
            r#""minos":{"valid":true,"parameter":0,"lower":-5.0000000000000000e-1,"upper":5.0000000000000000e-1}}"#,
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn absent_companions_are_null() {
        let mut r = sample();
        r.covariance = None;
        r.minos = None;
        let json = r.to_json().unwrap();
        assert!(json.contains(r#""has_covariance":false,"covariance":null"#));
        assert!(json.ends_with(r#""has_minos":false,"minos":null}"#));
    }

    #[test]
    fn output_is_valid_json_that_round_trips_floats() {
        let mut r = sample();
        r.fval = 0.1 + 0.2;
        let json = r.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["fval"].is_f64());
        assert!(parsed["errors"][1].is_null());
        let token = json
            .split(r#""fval":"#)
            .nth(1)
            .and_then(|rest| rest.split(',').next())
            .unwrap();
        assert_eq!(token.parse::<f64>().unwrap(), 0.1 + 0.2);
    }
}

use parfit_engine::{Contours, Hesse, Migrad, Minimize, Minos, Scan, Simplex, Strategy};
use tracing::{debug, warn};

use crate::{Diagnostic, Error, Minimizer, MinosSummary, RunResult, WorkloadId};

/// Run a workload's minimizer and diagnostics, in order, and collect the
/// result. Scan and contour output is computed and dropped; the reported
/// minimum is the one left after the last Hesse step.
pub fn run_workload(id: WorkloadId) -> Result<RunResult, Error> {
    let workload = id.workload();
    let fcn = workload.objective;
    let parameters = workload.engine_parameters()?;

    let mut minimum = match workload.minimizer {
        Minimizer::Migrad { strategy } => Migrad::new(&fcn, &parameters)
            .with_strategy(Strategy::new(strategy))
            .minimize(),
        Minimizer::Simplex => Simplex::new(&fcn, &parameters).minimize(),
        Minimizer::Minimize => Minimize::new(&fcn, &parameters).minimize(),
    };
    debug!(
        workload = %id,
        valid = minimum.is_valid(),
        fval = minimum.fval(),
        nfcn = minimum.nfcn(),
        "minimized"
    );

    let mut minos = None;
    for diagnostic in workload.diagnostics {
        match *diagnostic {
            Diagnostic::Hesse => Hesse::new().refine(&fcn, &mut minimum),
            Diagnostic::Minos { parameter } => {
                let interval = Minos::new(&fcn, &minimum).minos(parameter)?;
                if !interval.is_valid() {
                    warn!(workload = %id, parameter, "minos interval is not valid");
                }
                minos = Some(MinosSummary::from(&interval));
            }
            Diagnostic::Scan { parameter, points } => {
                let scanned = Scan::new(&fcn, minimum.user_state().parameters()).scan(
                    parameter, points, 0.0, 0.0,
                )?;
                debug!(workload = %id, parameter, points = scanned.len(), "scan done");
            }
            Diagnostic::Contours { x, y, points } => {
                let contour = Contours::new(&fcn, &minimum).points(x, y, points)?;
                if !contour.is_valid() {
                    warn!(workload = %id, x, y, "contour is not closed");
                }
            }
        }
    }

    Ok(RunResult::from_minimum(id, workload.algorithm, &minimum, minos))
}

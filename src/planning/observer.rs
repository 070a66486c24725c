//! Optional diagnostics hooks for the planners

use crate::path::Path;
use crate::planning::obstacle_importer::ImportReport;

/// Receives planner events. Every method has a no-op default, so an
/// observer only implements what it cares about.
pub trait PlannerObserver {
    fn obstacles_imported(&mut self, _report: &ImportReport) {}

    fn path_computed(&mut self, _path: &Path) {}
}

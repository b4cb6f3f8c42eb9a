use std::sync::Arc;

use crate::model::ReconOutcome;

/// Holds the last successful outcome. Each run replaces it wholesale; readers
/// get a shared handle that stays valid after a later replace.
#[derive(Debug, Default)]
pub struct ReportSlot {
    last: Option<Arc<ReconOutcome>>,
}

impl ReportSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, outcome: ReconOutcome) -> Arc<ReconOutcome> {
        let handle = Arc::new(outcome);
        self.last = Some(Arc::clone(&handle));
        handle
    }

    pub fn current(&self) -> Option<Arc<ReconOutcome>> {
        self.last.clone()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }
}

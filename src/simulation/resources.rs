use crate::simulation::OperationOutcome;
use std::sync::{Arc, Mutex};

/// A named, capacity-bounded quantity shared between subsystems.
///
/// All mutation goes through `withdraw` and `deposit`, each a single critical
/// section on the internal lock. Outside a held lock the amount never leaves
/// the range `0..=max_capacity`.
#[derive(Debug)]
pub struct Resource {
    name: String,
    max_capacity: u64,
    amount: Mutex<u64>,
}

impl Resource {
    /// Creates a new resource. The caller is responsible for ensuring
    /// `initial <= max_capacity`; the constructor does not re-validate.
    pub fn new<S: Into<String>>(name: S, initial: u64, max_capacity: u64) -> Arc<Resource> {
        debug_assert!(initial <= max_capacity);
        Arc::new(Resource { name: name.into(), max_capacity, amount: Mutex::new(initial) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_capacity(&self) -> u64 {
        self.max_capacity
    }

    /// Current amount. The value can be stale as soon as the lock is released.
    pub fn amount(&self) -> u64 {
        *self.amount.lock().unwrap()
    }

    /// Attempts to withdraw `requested` units.
    ///
    /// Succeeds iff the current amount covers the request. On failure the
    /// amount is untouched and the outcome distinguishes a completely empty
    /// resource from one that merely cannot cover the request.
    pub fn withdraw(&self, requested: u64) -> OperationOutcome {
        let mut amount = self.amount.lock().unwrap();
        if *amount >= requested {
            *amount -= requested;
            OperationOutcome::Ok
        } else if *amount == 0 {
            OperationOutcome::Empty
        } else {
            OperationOutcome::Insufficient
        }
    }

    /// Deposits up to `offered` units, clamped at the maximum capacity.
    /// Returns the remainder that did not fit.
    pub fn deposit(&self, offered: u64) -> u64 {
        let mut amount = self.amount.lock().unwrap();
        let available = self.max_capacity - *amount;
        let stored = offered.min(available);
        *amount += stored;
        offered - stored
    }
}

/// Binds a resource to the per-cycle amount a subsystem consumes or produces.
///
/// `resource == None` means no resource is involved on that side of the
/// conversion: consumption trivially succeeds, production evaporates.
#[derive(Debug, Clone)]
pub struct ResourceAmount {
    pub resource: Option<Arc<Resource>>,
    pub amount: u64,
}

impl ResourceAmount {
    pub fn new(resource: Arc<Resource>, amount: u64) -> ResourceAmount {
        ResourceAmount { resource: Some(resource), amount }
    }

    pub fn none() -> ResourceAmount {
        ResourceAmount { resource: None, amount: 0 }
    }
}

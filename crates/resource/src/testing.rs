//! Test doubles for resource lifecycles.

use crate::{AcquireError, ReleaseError, Resource};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Shared record of release calls, in the order they happened.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReleaseLog(Rc<RefCell<Vec<String>>>);

impl ReleaseLog {
    fn push(&self, name: &str) {
        self.0.borrow_mut().push(name.to_string());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// A resource that logs every release call and can be told to fail it.
#[derive(Debug)]
pub(crate) struct Probe {
    name: String,
    log: ReleaseLog,
    fail: bool,
}

impl Probe {
    pub(crate) fn new(name: &str, log: &ReleaseLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            fail: false,
        }
    }

    pub(crate) fn failing(name: &str, log: &ReleaseLog) -> Self {
        Self {
            fail: true,
            ..Self::new(name, log)
        }
    }
}

impl Resource for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        self.log.push(&self.name);
        if self.fail {
            Err(ReleaseError::failed(&self.name, "probe release failure"))
        } else {
            Ok(())
        }
    }
}

pub(crate) type Spec = Box<dyn FnOnce() -> Result<Probe, AcquireError>>;

pub(crate) fn probe(name: &str, log: &ReleaseLog) -> Spec {
    let probe = Probe::new(name, log);
    Box::new(move || Ok(probe))
}

pub(crate) fn failing_probe(name: &str, log: &ReleaseLog) -> Spec {
    let probe = Probe::failing(name, log);
    Box::new(move || Ok(probe))
}

pub(crate) fn refused(name: &str) -> Spec {
    let name = name.to_string();
    Box::new(move || Err(AcquireError::failed(name, "refused")))
}

/// Body failure used by scope tests.
#[derive(Debug, Error, PartialEq)]
#[error("boom: {0}")]
pub(crate) struct Boom(pub &'static str);

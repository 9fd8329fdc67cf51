//! The resource capability and how resources are acquired.

use crate::{AcquireError, ReleaseError};

/// Something that holds an external asset and must give it back.
///
/// `release` may fail, and the failure is reported to whoever drives the
/// release. Implementations must tolerate a redundant `release` call: once
/// the asset is gone, a second call is a no-op returning `Ok(())`.
/// `release` must not panic.
pub trait Resource {
    /// Identity used in logs and the journal.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Give the underlying asset back.
    fn release(&mut self) -> Result<(), ReleaseError>;
}

impl<R: Resource + ?Sized> Resource for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        (**self).release()
    }
}

/// A description of how to obtain a resource.
///
/// Any `FnOnce() -> Result<R, AcquireError>` is an acquisition, so most
/// callers pass a closure such as `|| FileHandle::open(path)`.
pub trait Acquire {
    type Resource: Resource;

    fn acquire(self) -> Result<Self::Resource, AcquireError>;
}

impl<R, F> Acquire for F
where
    R: Resource,
    F: FnOnce() -> Result<R, AcquireError>,
{
    type Resource = R;

    fn acquire(self) -> Result<R, AcquireError> {
        self()
    }
}

/// Erase the resource type of an acquisition.
///
/// Lets resources of different types share one `Scope<Box<dyn Resource>>`.
pub fn boxed<'a, A>(spec: A) -> impl Acquire<Resource = Box<dyn Resource + 'a>>
where
    A: Acquire,
    A::Resource: 'a,
{
    move || {
        spec.acquire()
            .map(|resource| Box::new(resource) as Box<dyn Resource + 'a>)
    }
}

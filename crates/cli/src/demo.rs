//! Demonstration scenarios for scoped release.

use journal::Journal;
use resource::{
    AcquireError, Deferred, FileHandle, ReleaseError, Resource, Scope, ScopeError, boxed, defer,
    with_scope_journaled,
};
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

pub const BODY: &str = "--body--";
pub const CLOSE: &str = "--close--";
pub const EXCEPTION: &str = "--exception--";
pub const FINALLY: &str = "--finally--";

const DEMO_RESOURCE: &str = "demo resource";

/// Bytes read from a file by `compare`.
const BLOCK: usize = 1024;

/// Line output shared by a scope body and the resources it holds.
pub struct Console<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn line(&self, text: &str) -> io::Result<()> {
        writeln!(self.out.borrow_mut(), "{text}")
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

/// Failure raised by a demo body.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("body failed on purpose")]
    Requested,

    #[error(transparent)]
    Output(#[from] io::Error),
}

#[derive(Debug, Default)]
pub struct DemoOptions {
    pub fail_body: bool,
    pub fail_release: bool,
    /// Acquire this file instead of the marker resource.
    pub missing: Option<PathBuf>,
}

/// Acquire one resource, run a body, and print lifecycle markers.
///
/// Prints `--body--` when the body runs, `--close--` when the marker resource
/// is released, `--exception--` if the scope reports any failure, and always
/// `--finally--` last.
pub fn run_demo<W: Write>(
    console: &Console<W>,
    journal: &Journal,
    options: &DemoOptions,
) -> io::Result<Option<ScopeError<DemoError>>> {
    let mut scope: Scope<Box<dyn Resource + '_>> = Scope::new().with_journal(journal.clone());

    let acquired = match &options.missing {
        Some(path) => scope.acquire(boxed(|| FileHandle::open(path))),
        None => scope.acquire(boxed(|| {
            Ok::<_, AcquireError>(close_marker(console, options.fail_release))
        })),
    }
    .map(|_| ());

    let outcome = match acquired {
        Ok(()) => scope.finish(demo_body(console, options.fail_body)),
        Err(e) => Err(scope.abort(e)),
    };

    let failure = outcome.err();
    if let Some(e) = &failure {
        warn!(error = %e, suppressed = e.suppressed().len(), "demo scope failed");
        for suppressed in e.suppressed() {
            warn!(error = %suppressed, "suppressed release failure");
        }
        console.line(EXCEPTION)?;
    }
    console.line(FINALLY)?;
    Ok(failure)
}

fn close_marker<W: Write>(
    console: &Console<W>,
    fail: bool,
) -> Deferred<impl FnOnce() -> Result<(), ReleaseError> + '_> {
    defer(DEMO_RESOURCE, move || {
        console
            .line(CLOSE)
            .map_err(|e| ReleaseError::io(DEMO_RESOURCE, e))?;
        if fail {
            Err(ReleaseError::failed(DEMO_RESOURCE, "release failed on purpose"))
        } else {
            Ok(())
        }
    })
}

fn demo_body<W: Write>(console: &Console<W>, fail: bool) -> Result<(), DemoError> {
    console.line(BODY)?;
    if fail {
        return Err(DemoError::Requested);
    }
    Ok(())
}

#[derive(Debug, Error)]
enum ReadError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error("read failed: {0}")]
    Read(#[from] io::Error),
}

/// Outcome of reading one block through each cleanup style.
#[derive(Debug)]
pub struct Comparison {
    pub manual: Result<usize, String>,
    pub scoped: Result<usize, String>,
}

/// Read a block from `path` with manual cleanup, then with scoped cleanup.
///
/// Neither style escalates: a missing file or a failed release is logged and
/// reported in the returned [`Comparison`].
pub fn compare<W: Write>(
    console: &Console<W>,
    path: &Path,
    journal: &Journal,
) -> io::Result<Comparison> {
    let comparison = Comparison {
        manual: manual_cleanup(path),
        scoped: scoped_cleanup(path, journal),
    };
    console.line(&format!("manual cleanup: {}", describe(&comparison.manual)))?;
    console.line(&format!("scoped cleanup: {}", describe(&comparison.scoped)))?;
    Ok(comparison)
}

fn manual_cleanup(path: &Path) -> Result<usize, String> {
    let mut handle: Option<FileHandle> = None;
    let read = (|| -> Result<usize, ReadError> {
        let file = handle.insert(FileHandle::open(path)?);
        Ok(read_block(file)?)
    })();

    // finally: release only what was actually acquired
    if let Some(mut file) = handle.take() {
        if let Err(e) = file.release() {
            error!(error = %e, "manual cleanup: release failed");
        }
    }

    read.map_err(|e| {
        warn!(error = %e, "manual cleanup: read failed");
        e.to_string()
    })
}

fn scoped_cleanup(path: &Path, journal: &Journal) -> Result<usize, String> {
    with_scope_journaled(
        journal,
        [|| FileHandle::open(path)],
        |files: &mut [FileHandle]| files.iter_mut().map(read_block).sum::<io::Result<usize>>(),
    )
    .map_err(|e| {
        match &e {
            ScopeError::Acquire { source, .. } if source.is_not_found() => {
                warn!(error = %source, "scoped cleanup: file not found");
            }
            _ => error!(error = %e, "scoped cleanup failed"),
        }
        e.to_string()
    })
}

fn read_block(file: &mut FileHandle) -> io::Result<usize> {
    let mut buf = [0u8; BLOCK];
    file.read(&mut buf)
}

fn describe(outcome: &Result<usize, String>) -> String {
    match outcome {
        Ok(n) => format!("read {n} bytes"),
        Err(e) => format!("failed ({e})"),
    }
}

#[derive(Debug, Default)]
pub struct ChainOptions {
    pub names: Vec<String>,
    pub fail_acquire: Option<String>,
    pub fail_body: bool,
    pub fail_release: Vec<String>,
}

/// A named resource that announces its release.
struct Link<'a, W: Write> {
    name: String,
    console: &'a Console<W>,
    fail: bool,
    released: bool,
}

impl<W: Write> Resource for Link<'_, W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.console
            .line(&format!("release {}", self.name))
            .map_err(|e| ReleaseError::io(&self.name, e))?;
        if self.fail {
            Err(ReleaseError::failed(&self.name, "release failed on purpose"))
        } else {
            Ok(())
        }
    }
}

fn link<'a, W: Write>(
    console: &'a Console<W>,
    name: &str,
    options: &ChainOptions,
) -> impl FnOnce() -> Result<Link<'a, W>, AcquireError> + use<'a, W> {
    let name = name.to_string();
    let refuse = options.fail_acquire.as_deref() == Some(name.as_str());
    let fail = options.fail_release.contains(&name);

    move || {
        if refuse {
            console
                .line(&format!("refuse {name}"))
                .map_err(|e| AcquireError::from_io(&name, e))?;
            return Err(AcquireError::failed(name, "acquisition refused on purpose"));
        }
        console
            .line(&format!("acquire {name}"))
            .map_err(|e| AcquireError::from_io(&name, e))?;
        Ok(Link {
            name,
            console,
            fail,
            released: false,
        })
    }
}

/// Acquire the named resources in order and print how they are released.
pub fn run_chain<W: Write>(
    console: &Console<W>,
    journal: &Journal,
    options: &ChainOptions,
) -> io::Result<Option<ScopeError<DemoError>>> {
    let specs: Vec<_> = options
        .names
        .iter()
        .map(|name| link(console, name, options))
        .collect();

    let outcome = with_scope_journaled(journal, specs, |held| {
        let names: Vec<&str> = held.iter().map(|link| link.name()).collect();
        console.line(&format!("body holds [{}]", names.join(", ")))?;
        if options.fail_body {
            return Err(DemoError::Requested);
        }
        Ok(())
    });

    let failure = outcome.err();
    match &failure {
        None => {
            info!(resources = options.names.len(), "chain scope completed");
            console.line("scope completed")?;
        }
        Some(e) => {
            console.line(&format!("scope failed: {e}"))?;
            for suppressed in e.suppressed() {
                console.line(&format!("  suppressed: {suppressed}"))?;
            }
        }
    }
    Ok(failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use journal::EventKind;
    use pretty_assertions::assert_eq;

    fn lines(console: Console<Vec<u8>>) -> Vec<String> {
        String::from_utf8(console.into_inner())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn demo(options: DemoOptions) -> (Vec<String>, Option<ScopeError<DemoError>>, Journal) {
        let console = Console::new(Vec::new());
        let journal = Journal::new();
        let failure = run_demo(&console, &journal, &options).unwrap();
        (lines(console), failure, journal)
    }

    #[test]
    fn test_demo_success_markers() {
        let (lines, failure, _) = demo(DemoOptions::default());
        assert!(failure.is_none());
        assert_eq!(lines, vec![BODY, CLOSE, FINALLY]);
    }

    #[test]
    fn test_demo_body_failure_still_closes() {
        let (lines, failure, _) = demo(DemoOptions {
            fail_body: true,
            ..Default::default()
        });
        assert_eq!(lines, vec![BODY, CLOSE, EXCEPTION, FINALLY]);
        assert!(failure.unwrap().is_body());
    }

    #[test]
    fn test_demo_release_failure_is_reported() {
        let (lines, failure, _) = demo(DemoOptions {
            fail_release: true,
            ..Default::default()
        });
        assert_eq!(lines, vec![BODY, CLOSE, EXCEPTION, FINALLY]);
        assert!(failure.unwrap().is_release());
    }

    #[test]
    fn test_demo_body_failure_wins_over_release_failure() {
        let (_, failure, journal) = demo(DemoOptions {
            fail_body: true,
            fail_release: true,
            ..Default::default()
        });
        let failure = failure.unwrap();
        assert!(failure.is_body());
        assert_eq!(failure.suppressed().len(), 1);
        assert!(journal.events().iter().any(|e| matches!(
            e.kind,
            EventKind::ReleaseFailed {
                suppressed: true,
                ..
            }
        )));
    }

    #[test]
    fn test_demo_missing_target_skips_body() {
        let dir = tempfile::tempdir().unwrap();
        let (lines, failure, journal) = demo(DemoOptions {
            missing: Some(dir.path().join("absent.txt")),
            ..Default::default()
        });

        assert_eq!(lines, vec![EXCEPTION, FINALLY]);
        match failure.unwrap() {
            ScopeError::Acquire { source, suppressed } => {
                assert!(source.is_not_found());
                assert!(suppressed.is_empty());
            }
            other => panic!("expected acquire failure, got {other:?}"),
        }
        assert!(!journal
            .events()
            .iter()
            .any(|e| matches!(e.kind, EventKind::Released { .. })));
    }

    #[test]
    fn test_compare_missing_file_is_reported_not_escalated() {
        let console = Console::new(Vec::new());
        let journal = Journal::new();

        let comparison = compare(&console, Path::new(""), &journal).unwrap();

        assert!(comparison.manual.is_err());
        assert!(comparison.scoped.is_err());
        let lines = lines(console);
        assert!(lines[0].starts_with("manual cleanup: failed"));
        assert!(lines[1].starts_with("scoped cleanup: failed"));
    }

    #[test]
    fn test_compare_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "twelve bytes").unwrap();
        let console = Console::new(Vec::new());
        let journal = Journal::new();

        let comparison = compare(&console, &path, &journal).unwrap();

        assert_eq!(comparison.manual, Ok(12));
        assert_eq!(comparison.scoped, Ok(12));
        let released = journal
            .events()
            .into_iter()
            .filter(|e| matches!(e.kind, EventKind::Released { .. }))
            .count();
        assert_eq!(released, 1);
    }

    fn chain(options: ChainOptions) -> (Vec<String>, Option<ScopeError<DemoError>>) {
        let console = Console::new(Vec::new());
        let journal = Journal::new();
        let failure = run_chain(&console, &journal, &options).unwrap();
        (lines(console), failure)
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_chain_releases_in_reverse() {
        let (lines, failure) = chain(ChainOptions {
            names: names(&["a", "b", "c"]),
            ..Default::default()
        });
        assert!(failure.is_none());
        assert_eq!(
            lines,
            vec![
                "acquire a",
                "acquire b",
                "acquire c",
                "body holds [a, b, c]",
                "release c",
                "release b",
                "release a",
                "scope completed",
            ]
        );
    }

    #[test]
    fn test_chain_acquire_failure_releases_earlier_links() {
        let (lines, failure) = chain(ChainOptions {
            names: names(&["a", "b", "c"]),
            fail_acquire: Some("b".into()),
            ..Default::default()
        });
        assert!(failure.unwrap().is_acquire());
        assert_eq!(
            lines,
            vec![
                "acquire a",
                "refuse b",
                "release a",
                "scope failed: scope aborted: failed to acquire b: acquisition refused on purpose",
            ]
        );
    }

    #[test]
    fn test_chain_body_failure_suppresses_release_failure() {
        let (lines, failure) = chain(ChainOptions {
            names: names(&["a", "b"]),
            fail_body: true,
            fail_release: names(&["a"]),
            ..Default::default()
        });
        assert!(failure.unwrap().is_body());
        assert_eq!(
            lines,
            vec![
                "acquire a",
                "acquire b",
                "body holds [a, b]",
                "release b",
                "release a",
                "scope failed: scope body failed: body failed on purpose",
                "  suppressed: failed to release a: release failed on purpose",
            ]
        );
    }
}

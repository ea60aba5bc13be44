//! Combinators over `Result` and `Option` that the standard library lacks.
//!
//! Construction, narrowing, `map`/`and_then`/`map_err`, exhaustive `match`
//! and panicking `unwrap` come from `std`. The helpers here keep command
//! validation declarative: guards read as a list of `ensure` calls chained
//! with `?`, and multi-field validation can report every failure at once.

use std::panic::{self, UnwindSafe};

/// Collects an iterator of results, stopping at the first error.
pub fn all<A, E>(results: impl IntoIterator<Item = Result<A, E>>) -> Result<Vec<A>, E> {
    results.into_iter().collect()
}

/// Collects an iterator of results, accumulating every error.
///
/// Returns `Ok` with all values only when no result failed.
pub fn collect_errors<A, E>(
    results: impl IntoIterator<Item = Result<A, E>>,
) -> Result<Vec<A>, Vec<E>> {
    let mut values = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(error) => errors.push(error),
        }
    }
    if errors.is_empty() {
        Ok(values)
    } else {
        Err(errors)
    }
}

/// Turns an absent value into an error.
pub fn from_nullable<A, E>(value: Option<A>, on_none: impl FnOnce() -> E) -> Result<A, E> {
    value.ok_or_else(on_none)
}

/// Fails with `on_false()` unless `condition` holds.
pub fn ensure<E>(condition: bool, on_false: impl FnOnce() -> E) -> Result<(), E> {
    if condition { Ok(()) } else { Err(on_false()) }
}

/// Runs `f`, converting a panic into an error.
///
/// `on_panic` receives the panic message when it is a string payload.
pub fn try_catch<A, E>(
    f: impl FnOnce() -> A + UnwindSafe,
    on_panic: impl FnOnce(String) -> E,
) -> Result<A, E> {
    panic::catch_unwind(f).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        on_panic(message)
    })
}

//! Updater construction.
//!
//! An [`Updater`] is a pure transformation from one state snapshot to the
//! next. The reducer hands it an owned copy of the current state, so purity
//! is structural: the previous state is kept aside for comparison and cannot
//! be touched by the updater.
//!
//! # Names
//!
//! An updater may carry a name. Every time a named updater is processed, the
//! reducer publishes the resulting state on the matching named channel (see
//! `Store::updaters`), before and independently of change detection.
//!
//! # Currying
//!
//! Updaters that need parameters beyond the state are built through
//! [`Updater::factory`]: the factory pre-applies the leading arguments and
//! returns the finished updater, leaving only the state to be supplied by
//! the reducer. A function that takes nothing but the state *is* the updater
//! already; pass it to [`Updater::new`] or [`Updater::named`] directly.

use std::fmt;
use std::sync::Arc;

use super::State;

/// A pure state transformation, optionally named for correlation.
///
/// Cloning is cheap; the transformation lives behind an `Arc`.
#[derive(Clone)]
pub struct Updater {
    name: Option<Arc<str>>,
    run: Arc<dyn Fn(State) -> State + Send + Sync>,
}

impl Updater {
    /// Create an anonymous updater.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(State) -> State + Send + Sync + 'static,
    {
        Self {
            name: None,
            run: Arc::new(run),
        }
    }

    /// Create a named updater.
    ///
    /// Matching against named channels is by exact name equality.
    pub fn named<F>(name: impl Into<Arc<str>>, run: F) -> Self
    where
        F: Fn(State) -> State + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            run: Arc::new(run),
        }
    }

    /// Build a factory of named updaters from a function that takes leading
    /// arguments before the state.
    ///
    /// Calling the factory with the leading arguments (a tuple when there
    /// are several) pre-applies them:
    ///
    /// ```rust,ignore
    /// let update_baz = Updater::factory("updateBaz", |value: i64, mut state: State| {
    ///     state["baz"] = value.into();
    ///     state
    /// });
    ///
    /// store.dispatch(update_baz(3));
    /// ```
    ///
    /// The signature requires the state parameter, so a function consuming
    /// no state is rejected at compile time.
    pub fn factory<A, F>(name: impl Into<Arc<str>>, run: F) -> impl Fn(A) -> Updater + Clone
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, State) -> State + Send + Sync + Clone + 'static,
    {
        let name: Arc<str> = name.into();
        move |args: A| {
            let run = run.clone();
            Updater {
                name: Some(Arc::clone(&name)),
                run: Arc::new(move |state| run(args.clone(), state)),
            }
        }
    }

    /// The updater's correlation name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Apply the transformation to a state snapshot.
    pub fn apply(&self, state: State) -> State {
        (self.run)(state)
    }

    pub(crate) fn name_arc(&self) -> Option<Arc<str>> {
        self.name.clone()
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("name", &self.name.as_deref().unwrap_or("<anonymous>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn anonymous_updater_has_no_name() {
        let updater = Updater::new(|state| state);
        assert_eq!(updater.name(), None);
    }

    #[test]
    fn named_updater_keeps_its_name() {
        let updater = Updater::named("updateBaz", |state| state);
        assert_eq!(updater.name(), Some("updateBaz"));
    }

    #[test]
    fn apply_runs_the_transformation() {
        let updater = Updater::new(|mut state: State| {
            state["count"] = 1.into();
            state
        });
        assert_eq!(updater.apply(json!({})), json!({ "count": 1 }));
    }

    #[test]
    fn factory_preapplies_leading_arguments() {
        let set_pair = Updater::factory("setPair", |(a, b): (i64, i64), mut state: State| {
            state["a"] = a.into();
            state["b"] = b.into();
            state
        });

        let updater = set_pair((1, 2));
        assert_eq!(updater.name(), Some("setPair"));
        assert_eq!(updater.apply(json!({})), json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn factory_is_reusable() {
        let set_baz = Updater::factory("updateBaz", |value: i64, mut state: State| {
            state["baz"] = value.into();
            state
        });

        assert_eq!(set_baz(1).apply(json!({})), json!({ "baz": 1 }));
        assert_eq!(set_baz(2).apply(json!({})), json!({ "baz": 2 }));
    }

    #[test]
    fn debug_shows_name() {
        let named = Updater::named("updateFoo", |state| state);
        assert!(format!("{named:?}").contains("updateFoo"));

        let anonymous = Updater::new(|state| state);
        assert!(format!("{anonymous:?}").contains("<anonymous>"));
    }
}

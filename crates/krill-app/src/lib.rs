//! Scene/state machine for applications built on the Krill runtime.
//!
//! An [`App`] owns a map from state key to state factory, the current
//! `(key, state)` pair, and an optional cached previous pair. States
//! implement [`State`] and drive transitions by returning a
//! [`Transition`] from `update` — switch to another state, switch while
//! caching the current one for later restoration (pause screens), or
//! exit the application.
//!
//! All states share one *common region* `R` (typically holding the
//! registry and other long-lived resources) through `Rc<RefCell<R>>`;
//! the machine runs on a single thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Directive returned by [`State::update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition<K> {
    /// Keep running the current state.
    Stay,
    /// Discard the current state and switch to `K`.
    Switch(K),
    /// Cache the current state, then switch to `K`. Switching back to
    /// the cached key later restores the cached instance instead of
    /// building a fresh one.
    SwitchCaching(K),
    /// Terminate the application loop.
    Exit,
}

/// A scene in the application.
///
/// `init` runs once when the state becomes current (including after a
/// cached restore); `update` runs every frame and steers the machine.
pub trait State<K, R> {
    /// Called when the state becomes current.
    fn init(&mut self, common: &Rc<RefCell<R>>);

    /// Called every frame while current.
    fn update(&mut self, common: &Rc<RefCell<R>>) -> Transition<K>;
}

type BoxedState<K, R> = Box<dyn State<K, R>>;
type Factory<K, R> = Box<dyn Fn() -> BoxedState<K, R>>;

/// The application: registered states, the current one, and the shared
/// common region.
pub struct App<K, R> {
    common: Rc<RefCell<R>>,
    factories: HashMap<K, Factory<K, R>>,
    current: Option<(K, BoxedState<K, R>)>,
    cache: Option<(K, BoxedState<K, R>)>,
    first_key: Option<K>,
    finished: bool,
    /// A transition happened; re-init the current state on next update.
    changed: bool,
}

impl<K: Eq + Hash + Clone, R> App<K, R> {
    /// Create an application around an existing common region.
    pub fn new(common: R) -> Self {
        Self {
            common: Rc::new(RefCell::new(common)),
            factories: HashMap::new(),
            current: None,
            cache: None,
            first_key: None,
            finished: false,
            changed: false,
        }
    }

    /// The shared common region.
    pub fn common(&self) -> &Rc<RefCell<R>> {
        &self.common
    }

    /// Register a state under `key`.
    ///
    /// The first registered key becomes the default initial state.
    /// Registering a key twice is a caller contract violation: debug
    /// builds assert, release builds keep the original.
    pub fn add_state<S, F>(&mut self, key: K, factory: F)
    where
        S: State<K, R> + 'static,
        F: Fn() -> S + 'static,
    {
        if self.factories.contains_key(&key) {
            debug_assert!(false, "state key registered twice");
            return;
        }
        if self.first_key.is_none() {
            self.first_key = Some(key.clone());
        }
        self.factories
            .insert(key, Box::new(move || Box::new(factory())));
    }

    /// Enter the initial state and run its `init`.
    ///
    /// Uses `first_key` when given, otherwise the first registered
    /// state.
    ///
    /// # Panics
    ///
    /// Panics if the chosen key has no registered factory.
    pub fn init(&mut self, first_key: Option<K>) {
        let key = first_key
            .or_else(|| self.first_key.clone())
            .expect("no states registered");
        let mut state = self
            .factories
            .get(&key)
            .expect("initial state key is registered")();
        state.init(&self.common);
        self.current = Some((key, state));
        self.finished = false;
        self.changed = false;
    }

    /// Run one frame: re-init after a transition, then update the
    /// current state and apply its directive.
    ///
    /// # Panics
    ///
    /// Panics if called before [`App::init`].
    pub fn update(&mut self) {
        let (_, state) = self.current.as_mut().expect("App::init was not called");
        if self.changed {
            state.init(&self.common);
            self.changed = false;
        }

        match state.update(&self.common) {
            Transition::Stay => {}
            Transition::Switch(key) => self.change_state(key, false),
            Transition::SwitchCaching(key) => self.change_state(key, true),
            Transition::Exit => self.finished = true,
        }
    }

    /// Whether an [`Transition::Exit`] has been requested.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Key of the current state, once initialised.
    pub fn current_key(&self) -> Option<&K> {
        self.current.as_ref().map(|(key, _)| key)
    }

    fn change_state(&mut self, key: K, cache_current: bool) {
        debug_assert!(
            self.factories.contains_key(&key),
            "transition to an unregistered state"
        );

        let outgoing = self.current.take();
        if cache_current {
            self.cache = outgoing;
        }

        // Restore the cached instance when returning to its key,
        // otherwise build a fresh state from the factory.
        let restored = match self.cache.take() {
            Some((cached_key, state)) if cached_key == key => Some((cached_key, state)),
            other => {
                self.cache = other;
                None
            }
        };
        self.current = restored.or_else(|| {
            self.factories
                .get(&key)
                .map(|factory| (key.clone(), factory()))
        });
        self.changed = true;
    }
}

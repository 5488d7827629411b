//! Observable value cells.
//!
//! The engine publishes active-tool state, cursor and hover through
//! [`Signal`]s. The rendering layer subscribes; the engine only ever calls
//! `set`. Updates made inside [`batch`] notify subscribers once, after the
//! outermost batch closes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Subscriber<T> = Box<dyn Fn(&T)>;

struct Inner<T> {
    value: Rc<T>,
    subscribers: Vec<Subscriber<T>>,
    version: u64,
    /// Queued on the current batch, waiting for it to close.
    pending: bool,
    /// Subscribers are running; nested sets are picked up by the running loop.
    notifying: bool,
}

/// A shared, single-threaded observable value.
pub struct Signal<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Default + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value: Rc::new(value),
                subscribers: Vec::new(),
                version: 0,
                pending: false,
                notifying: false,
            })),
        }
    }

    /// Number of `set` calls so far.
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = Rc::clone(&self.inner.borrow().value);
        f(&value)
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) {
        self.inner.borrow_mut().subscribers.push(Box::new(f));
    }

    pub fn set(&self, value: T) {
        let batching = BATCH.with(|b| b.borrow().depth > 0);
        let first_in_batch = {
            let mut inner = self.inner.borrow_mut();
            inner.value = Rc::new(value);
            inner.version += 1;
            let first = batching && !inner.pending;
            if first {
                inner.pending = true;
            }
            first
        };
        if !batching {
            self.notify();
        } else if first_in_batch {
            let this = self.clone();
            BATCH.with(|b| b.borrow_mut().pending.push(Box::new(move || this.notify())));
        }
    }

    fn notify(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.pending = false;
            if inner.notifying {
                return;
            }
            inner.notifying = true;
        }
        // Take the list out while calling so a subscriber may subscribe or
        // set; no borrow is held while subscribers run.
        let subscribers = std::mem::take(&mut self.inner.borrow_mut().subscribers);
        loop {
            let (value, version) = {
                let inner = self.inner.borrow();
                (Rc::clone(&inner.value), inner.version)
            };
            for s in &subscribers {
                s(&value);
            }
            if self.inner.borrow().version == version {
                break;
            }
        }
        let mut inner = self.inner.borrow_mut();
        inner.notifying = false;
        let added = std::mem::replace(&mut inner.subscribers, subscribers);
        inner.subscribers.extend(added);
    }
}

impl<T: Clone + 'static> Signal<T> {
    pub fn get(&self) -> T {
        T::clone(&self.inner.borrow().value)
    }
}

// ─── Batching ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct BatchState {
    depth: usize,
    pending: Vec<Box<dyn FnOnce()>>,
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// Run `f` with subscriber notification deferred until it returns.
/// Nested batches flush only when the outermost one ends.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    BATCH.with(|b| b.borrow_mut().depth += 1);
    let result = f();
    let pending = BATCH.with(|b| {
        let mut b = b.borrow_mut();
        b.depth -= 1;
        if b.depth == 0 {
            std::mem::take(&mut b.pending)
        } else {
            Vec::new()
        }
    });
    for notify in pending {
        notify();
    }
    result
}

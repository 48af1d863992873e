use std::cell::RefCell;
use std::rc::{Rc, Weak};

use runtime::Subscription;

/// Pointer click in client pixels (origin top left).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerClick {
    pub x: f64,
    pub y: f64,
    /// DOM button number; 0 is the primary button.
    pub button: i16,
}

impl PointerClick {
    pub fn primary(x: f64, y: f64) -> Self {
        Self { x, y, button: 0 }
    }

    pub fn is_primary(&self) -> bool {
        self.button == 0
    }
}

pub type ClickHandler = Box<dyn FnMut(PointerClick)>;

/// Host source of pointer clicks. Dropping or disposing the returned
/// subscription deregisters `handler`.
pub trait ClickSource {
    fn subscribe(&self, handler: ClickHandler) -> Subscription;
}

type SharedHandler = Rc<RefCell<ClickHandler>>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    handlers: Vec<(u64, SharedHandler)>,
}

/// Click source fed by hand.
#[derive(Clone, Default)]
pub struct ManualClickSource {
    listeners: Rc<RefCell<Listeners>>,
}

impl ManualClickSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().handlers.len()
    }

    pub fn click(&self, x: f64, y: f64) -> usize {
        self.emit(PointerClick::primary(x, y))
    }

    /// Delivers `click` to every listener registered when the call starts
    /// and still registered when its turn comes. Returns the delivery count.
    pub fn emit(&self, click: PointerClick) -> usize {
        let snapshot: Vec<(u64, SharedHandler)> = self.listeners.borrow().handlers.clone();
        let mut delivered = 0;
        for (id, handler) in snapshot {
            let live = self.listeners.borrow().handlers.iter().any(|(h, _)| *h == id);
            if !live {
                continue;
            }
            if let Ok(mut handler) = handler.try_borrow_mut() {
                handler(click);
                delivered += 1;
            }
        }
        delivered
    }
}

impl ClickSource for ManualClickSource {
    fn subscribe(&self, handler: ClickHandler) -> Subscription {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.handlers.push((id, Rc::new(RefCell::new(handler))));
            id
        };
        let weak: Weak<RefCell<Listeners>> = Rc::downgrade(&self.listeners);
        Subscription::new("click", move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.borrow_mut().handlers.retain(|(h, _)| *h != id);
            }
        })
    }
}

impl std::fmt::Debug for ManualClickSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualClickSource")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

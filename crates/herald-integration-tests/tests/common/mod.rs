//! Shared helpers for integration tests.

use std::cell::RefCell;
use std::rc::Rc;

use herald_bus::{Bindings, Bus, Event, HandlerError, HandlerResult, Subscriber, kinds};
use herald_test::Journal;

/// A subscriber driven by a closure, for scenarios that need to call back
/// into the bus from a handler.
pub struct Scripted {
    label: &'static str,
    journal: Journal,
    script: Box<dyn Fn(&Scripted, &Event) -> HandlerResult<bool>>,
    /// Slot for a strong handle to itself, so the script can unregister it.
    pub me: RefCell<Option<Rc<Scripted>>>,
}

#[allow(dead_code)]
impl Scripted {
    pub fn new(
        label: &'static str,
        journal: &Journal,
        script: impl Fn(&Scripted, &Event) -> HandlerResult<bool> + 'static,
    ) -> Rc<Self> {
        let scripted = Rc::new(Self {
            label,
            journal: journal.clone(),
            script: Box::new(script),
            me: RefCell::new(None),
        });
        *scripted.me.borrow_mut() = Some(Rc::clone(&scripted));
        scripted
    }

    /// Drop the self-reference so the subscriber can be freed.
    pub fn release(&self) -> Option<Rc<Scripted>> {
        self.me.borrow_mut().take()
    }

    /// Unregister this subscriber from `bus`.
    pub fn unregister_from(&self, bus: &Bus) {
        if let Some(me) = self.me.borrow().as_ref() {
            bus.unregister(me);
        }
    }

    fn handle(&self, event: &Event) -> HandlerResult<bool> {
        self.journal.record(format!("{}:{}", self.label, event.kind()));
        (self.script)(self, event)
    }
}

impl Subscriber for Scripted {
    fn bindings(&self) -> Bindings<Self> {
        Bindings::new().on("handle", kinds::EVENT, Self::handle)
    }

    fn type_name(&self) -> &str {
        "Scripted"
    }
}

/// A script that does nothing and lets the event continue.
#[allow(dead_code)]
pub fn pass(_: &Scripted, _: &Event) -> HandlerResult<bool> {
    Ok(false)
}

/// A script that vetoes every event.
#[allow(dead_code)]
pub fn veto(_: &Scripted, _: &Event) -> HandlerResult<bool> {
    Err(HandlerError::veto("vetoed by script"))
}

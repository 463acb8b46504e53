use std::cell::RefCell;
use std::rc::Rc;

/// Something that has to follow a module as its GPU resources come and go.
pub trait ModuleObserver {
    fn realise(&mut self);
    fn unrealise(&mut self);
}

pub type SharedObserver = Rc<RefCell<dyn ModuleObserver>>;

/// Observers in attach order.  Realise notifies front to back, unrealise back
/// to front, so later observers never outlive the ones they were built on.
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<SharedObserver>,
}

impl ObserverList {
    /// false if `observer` was already attached
    pub fn attach(&mut self, observer: SharedObserver) -> bool {
        if self.contains(&observer) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// false if `observer` was not attached
    pub fn detach(&mut self, observer: &SharedObserver) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
        self.observers.len() != before
    }

    pub fn contains(&self, observer: &SharedObserver) -> bool {
        self.observers.iter().any(|o| Rc::ptr_eq(o, observer))
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn realise(&self) {
        for observer in &self.observers {
            observer.borrow_mut().realise();
        }
    }

    pub fn unrealise(&self) {
        for observer in self.observers.iter().rev() {
            observer.borrow_mut().unrealise();
        }
    }
}

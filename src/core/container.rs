use std::{
    cell::{Ref, RefCell, RefMut},
    fmt::{Debug, Error, Formatter},
    rc::{Rc, Weak},
};

/// A shared, interior-mutable handle. Interpreter objects with identity (modules, classes,
/// instances, functions) live behind one of these so that aliasing in Python code aliases the
/// same Rust value.
pub struct Container<T>(Rc<RefCell<T>>);

impl<T> Container<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Object identity, as in Python's `is`.
    pub fn same_identity(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn downgrade(&self) -> WeakContainer<T> {
        WeakContainer(Rc::downgrade(&self.0))
    }
}

impl<T> Clone for Container<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: PartialEq> PartialEq for Container<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other) || *self.borrow() == *other.borrow()
    }
}

impl<T: Debug> Debug for Container<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        // A re-entrant borrow during formatting (e.g. a list containing itself) must not panic.
        match self.0.try_borrow() {
            Ok(inner) => inner.fmt(f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

/// Non-owning counterpart of [`Container`], used for back-references that would otherwise form
/// reference cycles (a method pointing at its defining class).
pub struct WeakContainer<T>(Weak<RefCell<T>>);

impl<T> WeakContainer<T> {
    pub fn upgrade(&self) -> Option<Container<T>> {
        self.0.upgrade().map(Container)
    }
}

impl<T> Clone for WeakContainer<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<T> Debug for WeakContainer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "<weak>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let a = Container::new(vec![1]);
        let b = a.clone();
        b.borrow_mut().push(2);

        assert!(a.same_identity(&b));
        assert_eq!(*a.borrow(), vec![1, 2]);
    }

    #[test]
    fn weak_does_not_keep_value_alive() {
        let a = Container::new(5);
        let weak = a.downgrade();
        assert!(weak.upgrade().is_some());

        drop(a);
        assert!(weak.upgrade().is_none());
    }
}

//! Locking shim shared by the `std` and `no_std` builds of the kernel.
//!
//! Run-to-completion dispatch means these locks are uncontended in normal
//! operation; they exist so active objects can be shared as
//! `Arc<dyn ActiveRunnable>`. Poisoning is deliberately ignored on the `std`
//! path: a panic inside a handler has already aborted that dispatch, and
//! wedging every later `lock()` on the same object would take the whole
//! scheduler down with it. The guard is recovered from the poison error and
//! dispatch continues from the last consistent state.

#[cfg(feature = "std")]
mod imp {
    use std::sync::PoisonError;

    pub type Guard<'a, T> = std::sync::MutexGuard<'a, T>;

    pub struct Lock<T>(std::sync::Mutex<T>);

    impl<T> Lock<T> {
        pub fn new(value: T) -> Self {
            Self(std::sync::Mutex::new(value))
        }

        pub fn lock(&self) -> Guard<'_, T> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

#[cfg(not(feature = "std"))]
mod imp {
    pub type Guard<'a, T> = spin::MutexGuard<'a, T>;

    pub struct Lock<T>(spin::Mutex<T>);

    impl<T> Lock<T> {
        pub fn new(value: T) -> Self {
            Self(spin::Mutex::new(value))
        }

        pub fn lock(&self) -> Guard<'_, T> {
            self.0.lock()
        }
    }
}

pub use imp::Lock;

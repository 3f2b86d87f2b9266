// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::ops::{Deref, DerefMut, Drop};
use std::sync::{Mutex, MutexGuard};

/// A very simple memory pool for managing the scratch space of the matching
/// engines.
///
/// A compiled regex is immutable and may be shared by any number of threads.
/// Every search however needs mutable scratch space: the lazy DFA's state
/// cache, the NFA's thread lists and the backtracker's visited set. Each
/// search borrows one such cache from the pool and gives it back when done,
/// so that concurrent searches never contend on a single cache and repeated
/// searches (as with `find_iter` or `replace_all`) don't re-allocate.
///
/// There is no limit on the number of caches that are created. If a search
/// requests one and one isn't available, a new one is created.
pub struct Pool<T> {
    stack: Mutex<Vec<T>>,
    create: CreateFn<T>,
}

/// The type of the function used to create resources if none exist.
pub type CreateFn<T> = Box<dyn Fn() -> T + Send + Sync>;

/// A guard the provides access to a value pulled from the pool.
#[derive(Debug)]
pub struct PoolGuard<'a, T: 'a> {
    pool: &'a Pool<T>,
    val: Option<T>,
}

impl<T> Pool<T> {
    /// Create a new pool.
    ///
    /// When a caller requests a resource from the pool and one does not
    /// exist, then `create` is called to allocate a new resource for the
    /// caller.
    ///
    /// All resources are created lazily/on-demand.
    pub fn new(create: CreateFn<T>) -> Pool<T> {
        Pool { stack: Mutex::new(vec![]), create }
    }

    /// Request a resource from the pool.
    ///
    /// If no resources are available, a new one is created.
    ///
    /// Once the guard is dropped, the resource is returned to the pool.
    pub fn get(&self) -> PoolGuard<'_, T> {
        let val = match self.lock().pop() {
            None => (self.create)(),
            Some(v) => v,
        };
        PoolGuard { pool: self, val: Some(val) }
    }

    /// Add a resource to the pool.
    ///
    /// This makes the resource available for use with `get`.
    fn put(&self, v: T) {
        self.lock().push(v);
    }

    /// A poisoned pool only means some search panicked while holding the
    /// lock. The caches in it are still valid, so keep using them.
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.stack.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl<'a, T> PoolGuard<'a, T> {
    fn value(&self) -> &T {
        match self.val {
            Some(ref v) => v,
            None => unreachable!("pool guard used after drop"),
        }
    }
}

impl<'a, T> Deref for PoolGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.value()
    }
}

impl<'a, T> DerefMut for PoolGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.val {
            Some(ref mut v) => v,
            None => unreachable!("pool guard used after drop"),
        }
    }
}

impl<'a, T> Drop for PoolGuard<'a, T> {
    fn drop(&mut self) {
        if let Some(val) = self.val.take() {
            self.pool.put(val);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.lock().fmt(f)
    }
}

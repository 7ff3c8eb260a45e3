//! Scoped secret buffers.
//!
//! `Secret<T>` is the destructor-backed stand-in for a `defer`/`finally`
//! block: whatever it wraps is overwritten with zeros the moment it goes
//! out of scope, on every exit path including panics and early returns.
//! Used for ORK bytes, unwrapped TEKs, field data keys, and plaintext PII —
//! anything the spec requires not to survive the request that introduced it.

use std::fmt;
use std::ops::{Deref, DerefMut};
use zeroize::Zeroize;

pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> Deref for Secret<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> DerefMut for Secret<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Never prints the wrapped value — a `Secret` earns its name even under
/// `{:?}` in a log line or a panic message.
impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Overwrite a buffer in place. Exposed directly for call sites that need
/// to zeroise without wrapping in `Secret` (e.g. a local stack array).
pub fn zeroise(buf: &mut [u8]) {
    buf.zeroize();
}

pub type SecretBytes = Secret<Vec<u8>>;
pub type SecretKey32 = Secret<[u8; 32]>;
pub type SecretString = Secret<String>;

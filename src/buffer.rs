//! Owned byte buffer for secret material
//!
//! Every intermediate value that can hold plaintext, key material, or other
//! secrets lives in a [`SecureBuffer`]. The buffer wipes its backing storage
//! before releasing it, and that zeroizing path is the only release path the
//! type exposes: dropping the buffer is the release.

use std::fmt;

use zeroize::Zeroize;

use crate::error::Result;

/// An owned, length-tracked byte buffer that zeroizes its contents on release.
///
/// `SecureBuffer` is the result type of every operation that produces secret
/// bytes. Ownership of the buffer carries the zeroization obligation with it;
/// the `Drop` implementation discharges that obligation exactly once.
pub struct SecureBuffer {
    bytes: Vec<u8>,
}

impl SecureBuffer {
    /// Creates an empty buffer
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates a buffer by taking ownership of an existing byte vector.
    ///
    /// No copy is made; the vector's storage becomes the buffer's storage and
    /// will be wiped on drop.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Creates a buffer by copying the given bytes
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Returns the number of bytes held
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the buffer contents as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Runs a closure over the buffer contents.
    ///
    /// Scoped access in the style of a secret accessor: the slice must not
    /// escape the closure.
    pub fn with_bytes<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        f(&self.bytes)
    }

    /// Wipes the contents and resets the buffer to empty.
    ///
    /// The backing storage is zeroized before the length is reset, so the
    /// secret bytes never outlive the call.
    pub fn clear(&mut self) {
        // Zeroize on Vec wipes the full capacity and truncates to empty.
        self.bytes.zeroize();
    }
}

impl Default for SecureBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for SecureBuffer {
    // Contents are secret; show the length only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl AsRef<[u8]> for SecureBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for SecureBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}

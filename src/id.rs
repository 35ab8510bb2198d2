//! See [`Id`].

use std::fmt::{self, Display, Formatter};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// The type to create new todo item IDs with.
///
/// Todo items created by other means (like image intake) may have IDs of any shape.
pub type NewTodoId = Id<[u8; 16]>;

/// A random ID that displays as `base64url` (without padding).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Id<T>(T);

impl<const N: usize> Id<[u8; N]> {
    /// Generates a cryptographically secure pseudorandom ID.
    pub fn generate() -> Self {
        let mut id = Self([0; N]);
        id.reroll();
        id
    }
}

impl<T: AsMut<[u8]>> Id<T> {
    /// Overwrites this ID with a new cryptographically secure pseudorandom ID, reusing the existing
    /// memory.
    pub fn reroll(&mut self) {
        rand::thread_rng().fill_bytes(self.0.as_mut());
    }
}

impl<T: AsRef<[u8]>> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let bytes: &[u8] = self.0.as_ref();
        write!(f, "{}", URL_SAFE_NO_PAD.encode(bytes))
    }
}

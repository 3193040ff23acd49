//! The bounce transformation rules
//!
//! Every value a bounce call returns is produced by [`Bounce::bounce`], which
//! consumes its input and builds the transformed mirror of it:
//!
//! - integers are doubled with wrapping arithmetic at their own width
//! - floats are doubled at their declared precision
//! - booleans are negated
//! - strings get the `"hello "` prefix
//! - byte strings get the `" abc"` suffix
//! - absent wrappers stay absent
//!
//! Records recurse field by field. Boxed Any values are resolved through the
//! registry in [`crate::any`] (see [`resolve_any`]); a box that cannot be
//! resolved is dropped from its record with a warning while the rest of the
//! record still transforms.
//!
//! Copyright (c) 2025 Bouncer Team
//! Licensed under the Apache-2.0 license

pub mod complex;
pub mod dynamic;
pub mod resolve;
pub mod scalars;
pub mod wrappers;


pub use complex::SELF_MASK_PATH;
pub use resolve::resolve_any;

/// Prefix prepended to every bounced string
pub const GREETING_PREFIX: &str = "hello ";

/// Suffix appended to every bounced byte string
pub const BYTES_SUFFIX: &[u8] = b" abc";

/// A value with a bounce rule
pub trait Bounce: Sized {
    /// Consume the value and return its transformed mirror
    fn bounce(self) -> Self;
}

/// Bounce every element, keeping order and length
pub fn bounce_all<T: Bounce>(values: Vec<T>) -> Vec<T> {
    values.into_iter().map(Bounce::bounce).collect()
}

impl<T: Bounce> Bounce for Option<T> {
    fn bounce(self) -> Self {
        self.map(Bounce::bounce)
    }
}

impl<T: Bounce> Bounce for Box<T> {
    fn bounce(self) -> Self {
        Box::new((*self).bounce())
    }
}

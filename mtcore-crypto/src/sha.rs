//! Hash helpers over any number of byte slices.
//!
//! The macros expand through [`crate::__private`] so downstream crates can
//! hash without depending on `sha1`/`sha2` themselves.

/// SHA-1 of the concatenation of one or more byte slices.
#[macro_export]
macro_rules! sha1 {
    ( $( $x:expr ),+ ) => {{
        use $crate::__private::sha1::{Digest, Sha1};
        let mut h = Sha1::new();
        $( h.update($x); )+
        let out: [u8; 20] = h.finalize().into();
        out
    }};
}

/// SHA-256 of the concatenation of one or more byte slices.
#[macro_export]
macro_rules! sha256 {
    ( $( $x:expr ),+ ) => {{
        use $crate::__private::sha2::{Digest, Sha256};
        let mut h = Sha256::new();
        $( h.update($x); )+
        let out: [u8; 32] = h.finalize().into();
        out
    }};
}

/// Function form of [`sha256!`] for callers holding a single buffer.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    sha256!(data)
}

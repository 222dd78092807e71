#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::similar_names)]

pub mod codec;
pub mod crypto;
pub mod kdf;
pub mod totp;
pub mod verifier;

pub use crate::codec::*;
pub use crate::crypto::*;
pub use crate::kdf::*;
pub use crate::totp::*;
pub use crate::verifier::*;

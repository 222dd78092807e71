#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod access;
pub mod events;
pub mod file;
pub mod memory;
pub mod mirror;
pub mod ops;
pub mod session;
pub mod vault;

pub use crate::access::VaultAccess;
pub use crate::events::{VaultEvent, VaultSnapshot};
pub use crate::file::FileSecretStore;
pub use crate::memory::MemorySecretStore;
pub use crate::mirror::{CacheSink, MemoryCacheSink, SinkError, TrayEntry, TrayMirror};
pub use crate::ops::VaultOp;
pub use crate::session::{Session, SessionError, UnlockMaterial};
pub use crate::vault::{FetchedVault, StoreConfig, VaultStore, WritePolicy};

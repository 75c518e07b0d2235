//! Remote collection access: transports and the snapshot-owning store.

pub mod collection;
pub mod http;
pub mod memory;
pub mod transport;

pub use collection::{LoadTransform, RemoteCollectionStore};
pub use self::http::HttpTransport;
pub use memory::{MemoryCollection, MemoryTransport, TransportCall};
pub use transport::{CollectionTransport, TransportResponse};

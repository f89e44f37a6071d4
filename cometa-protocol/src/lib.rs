//! Wire protocol for the Cometa device client.
//!
//! Two pieces: the chunked-transfer framer used for the life of the
//! relay connection (`codec`), and a minimal incremental HTTP/1 response
//! reader used only during the handshake (`http1`).

pub mod codec;
pub mod http1;

pub use codec::{ChunkCodec, OutgoingChunk};
pub use http1::{read_response, HttpResponse};

pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod session;

pub use audio::{decode_audio, segment, Frame};
pub use config::{Config, StorageBackend};
pub use error::{AsrError, Result};
pub use http::{create_router, AppState};
pub use pipeline::{Phrase, Pipeline, StubPipeline};
pub use session::{MemoryStore, RedisStore, SessionController, SessionRecord, SessionStore};

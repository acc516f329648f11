mod chunking;
mod embedder;
mod index;
mod loader;
mod tokenize;

pub use chunking::{TextSplitter, TextWindow, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use embedder::{cosine_similarity, Embedder};
pub use index::{RetrievalIndex, RetrievalStats, ScoredChunk, DEFAULT_TOP_K, NOT_INITIALIZED};
pub use loader::{
    load, load_policies, load_schedule, DocumentSources, DEFAULT_POLICY_PATH,
    DEFAULT_SCHEDULE_PATH,
};
pub use tokenize::tokenize;

mod distance;
mod embedding;
mod lexical;

pub use distance::{cosine_distance, euclidean_distance, vector_distance};
#[cfg(feature = "fastembed")]
pub use embedding::FastEmbedService;
pub use embedding::{embedding_input, EmbeddingService};
pub use lexical::{LexicalEmbeddingService, DEFAULT_EMBEDDING_DIM};

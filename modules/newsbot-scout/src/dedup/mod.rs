// Three-layer duplicate filter: delivered identifier, content hash of a body
// window, and embedding similarity against everything delivered before.

mod fingerprint;
mod gate;
mod similarity;

pub use fingerprint::{content_fingerprint, hash_window, normalize};
pub use gate::{Classification, DedupGate, Verdict};
pub use similarity::cosine_similarity_f32;

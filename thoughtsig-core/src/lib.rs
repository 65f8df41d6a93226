pub mod engine;

pub use engine::{
    CacheKey, SignatureCacheStore, ThoughtSignature, ThoughtSignatureEngine,
    MIN_REAL_SIGNATURE_LEN,
};

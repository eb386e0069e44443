mod pool;
mod replacer;

pub use pool::{BufferPool, PageRef};
pub use replacer::{FifoReplacer, LruReplacer, Replacer};

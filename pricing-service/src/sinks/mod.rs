pub mod store;

pub use store::ReadingStoreSink;

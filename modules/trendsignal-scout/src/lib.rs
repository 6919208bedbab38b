pub mod context;
pub mod deps;
pub mod discovery;
pub mod extractor;
pub mod fetcher;
pub mod pipeline;
pub mod publisher;
pub mod selectors;
pub mod terms;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

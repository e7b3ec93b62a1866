pub mod analysis;
pub mod client;
pub mod edit;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use analysis::GeminiAnalysisClient;
pub use client::GeminiHttpClient;
pub use edit::GeminiEditClient;

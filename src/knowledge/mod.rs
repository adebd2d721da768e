pub mod similarity;
pub mod store;
pub mod types;

pub use store::KnowledgeStore;

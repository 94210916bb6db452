pub mod normalize;
pub mod safety;
pub mod storage;
pub mod rag;

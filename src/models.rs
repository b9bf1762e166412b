mod chunk_answer;
mod question;

pub use chunk_answer::ChunkAnswer;
pub use question::Question;

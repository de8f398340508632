pub mod answer_key;
pub mod choice_shuffler;
pub mod materializer;
pub mod permutation;
pub mod preview;
pub mod question_shuffler;
pub mod warn_writer;

pub use answer_key::{choice_letter, reconstruct_answer_key};
pub use choice_shuffler::shuffle_choices;
pub use materializer::materialize_version;
pub use preview::render_preview;
pub use question_shuffler::{shuffle_questions, Partitioning};
pub use warn_writer::WarnWriter;

pub mod channel;
pub mod stage;

pub use channel::Channel;
pub use stage::{CompositorStage, EncoderStage, InferenceStage, Stage};

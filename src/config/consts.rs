/// Depth of the inbound command queue
pub const DEFAULT_COMMAND_DEPTH: usize = 2;
/// Depth of the inbound position queue (one full batch of samples)
pub const DEFAULT_POSITION_DEPTH: usize = 192;
/// Depth of the inbound memory-initialization queue
pub const DEFAULT_MEMORY_INIT_DEPTH: usize = 1024;
/// Depth of the queue between the command dispatcher and the memory router
pub const DEFAULT_MEMORY_REQUEST_DEPTH: usize = 16;
/// Depth of the queue between the encoder and the inference stage
pub const DEFAULT_ENCODER_TO_INFERENCE_DEPTH: usize = 4;
/// Depth of the queue between the compositor and the caller
pub const DEFAULT_OUTPUT_DEPTH: usize = 8;

/// Placeholder ray step handed to the compositor for every sample
pub const DEFAULT_STEP_SIZE: f32 = 0.1;

/// Number of frequency octaves per axis in the reference encoder
pub const DEFAULT_ENCODER_FREQUENCIES: usize = 4;
/// Hidden width of the reference inference network
pub const DEFAULT_INFERENCE_HIDDEN: usize = 16;
/// Width of an inference result (emission triple + density)
pub const INFERENCE_OUTPUT_WIDTH: usize = 4;

/// Capacity of each async inbound/outbound port of the runtime
pub const DEFAULT_PORT_CAPACITY: usize = 64;

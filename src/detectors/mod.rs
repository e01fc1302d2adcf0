pub mod coordination;
pub mod tracked;
pub mod volume_spike;
pub mod whale;

pub use whale::WhaleVerdict;

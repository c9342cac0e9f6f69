pub mod base;
#[cfg(test)]
pub mod test_functions;

pub use base::{ErasedSegment, SegmentBuilder, SegmentKwargs, Tables};

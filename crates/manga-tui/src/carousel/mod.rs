//! Featured carousel state: a cyclic cursor plus its auto-advance timer.

pub mod auto_advance;
pub mod selector;

pub use auto_advance::{AutoAdvance, CarouselTick};
pub use selector::{CyclicSelector, OutOfRange};

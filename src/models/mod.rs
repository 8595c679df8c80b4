mod annotation;
mod bar;
mod instrument;

pub use annotation::{Anchor, Annotation, WatchType};
pub use bar::Bar;
pub use instrument::{CreateInstrument, Instrument, InstrumentKind, UpdateInstrument};

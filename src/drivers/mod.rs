// Acquisition, history and rendering helpers shared by the GUI.
pub mod error;
pub mod history;
pub mod plot;
pub mod range;
pub mod source;
pub mod ubertooth;
pub use error::SpecanError;
pub use history::FrameHistory;
pub use plot::{render_sweep_png, PlotStyle};
pub use range::DisplayRange;
#[cfg(test)]
pub use source::ManualSource;
pub use source::{FrameSource, SimulatedSource};
pub use ubertooth::Ubertooth;

pub mod track;
pub mod visitor;

pub use track::{TrackRequest, TrackResponse, UtmParams};
pub use visitor::Visitor;

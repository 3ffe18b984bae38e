pub mod realtime;
pub mod track;
pub mod visitors;

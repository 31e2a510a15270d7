pub mod standard;

pub use standard::StandardLocalMoving;

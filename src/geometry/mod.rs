pub mod units;
pub mod util;
pub mod vect;

pub use units::{Unit, UnitError};
pub use util::Precision;
pub use vect::{Vect2, Vect3, Velocity};

pub mod climate;
pub mod dust;
pub mod gpio;
pub mod pressure;

pub use climate::{read_climate, wait_for_climate};
pub use dust::measure_air_quality;
pub use pressure::read_pressure;

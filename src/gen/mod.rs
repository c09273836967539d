pub mod square_wave;

pub use self::square_wave::*;

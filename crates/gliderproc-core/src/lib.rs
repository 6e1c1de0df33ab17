pub mod coordinates;
pub mod error;
pub mod fusion;
pub mod interpolation;
pub mod options;
pub mod physics;
pub mod pipeline;
pub mod profiles;
pub mod qc;
pub mod raw;
pub mod recipe;
pub mod sensor_lag;
pub mod sync;
pub mod thermal_lag;
pub mod timebase;
pub mod timeseries;
pub mod transects;

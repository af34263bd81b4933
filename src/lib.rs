pub mod analysis;
pub mod distributions;
pub mod error;
pub mod etl;
pub mod gof;
pub mod input;
pub mod output;
pub mod report;
pub mod sample;

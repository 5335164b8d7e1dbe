pub mod batch;
pub mod features;
pub mod outcome;
pub mod resolver;
pub mod scoreline;
pub mod tuning;

pub use batch::{current_week_window, predict_window, UpcomingPrediction};
pub use outcome::{predict_cross, predict_h2h, OutcomeProbabilities};
pub use scoreline::estimate_scoreline;
pub use tuning::Tuning;

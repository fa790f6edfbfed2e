pub mod calendar;
pub mod clock;
pub mod model;
pub mod pricing;
pub mod report;
pub mod settings;

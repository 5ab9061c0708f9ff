pub mod dump;
pub mod engine;
pub mod export;
pub mod io;
pub mod pot;
pub mod report;
pub mod stats;

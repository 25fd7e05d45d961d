pub mod acks;
pub mod admin;
pub mod correlations;
pub mod drafts;
pub mod entities;
pub mod jobs;

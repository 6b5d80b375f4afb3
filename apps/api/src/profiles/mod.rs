// Client tone profiles: the model, the two store backends and brand-concept summarisation.

pub mod brand_concept;
pub mod github;
pub mod handlers;
pub mod models;
pub mod store;

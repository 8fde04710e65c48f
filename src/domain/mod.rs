//! Domain layer: storefront input, back-office model and the transformation between them
pub mod aggregates;
pub mod events;
pub mod services;
pub mod value_objects;

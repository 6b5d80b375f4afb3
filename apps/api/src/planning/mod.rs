// Turns a declarative plan into dated slots and item assignments.

pub mod assignment;
pub mod plan;
pub mod schedule;
pub mod seasonal;

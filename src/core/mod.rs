//! Core geometry shared by every layer

pub mod coordinates;

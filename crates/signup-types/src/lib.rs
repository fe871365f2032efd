//! Wire types shared by the signup HTTP surface and its tests.

pub mod api;

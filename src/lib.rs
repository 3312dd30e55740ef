#![warn(clippy::all, rust_2018_idioms)]

pub mod cluster;
pub mod config;
pub mod constituent;
pub mod event;
pub mod hist;
pub mod import;
pub mod jets;
pub mod kinematics;
pub mod particle;
pub mod softdrop;
pub mod spectrum;
pub mod tree;

//! Core scene-graph functionality shared by the physics bridge

pub mod entity;

// src/models/mod.rs

pub mod assessment;
pub mod invitation;
pub mod job;
pub mod question;
pub mod quiz;
pub mod skill;

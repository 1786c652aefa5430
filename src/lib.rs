//! Bottle-firing plans for CTD rosette casts.
//!
//! A station belongs to a hydrographic basin; the basin has a standard set of
//! target depths and the pressure at which a bottle should close at each.
//! This crate resolves station → basin → pressure table, derives a fire plan
//! (bottle number and target pressure per closure), checks it against the
//! rosette, and writes it into the acquisition software's settings.

pub mod acquisition;
pub mod autofire;
pub mod config;
pub mod launcher;
pub mod logging;
pub mod model;
pub mod reference;
pub mod service;

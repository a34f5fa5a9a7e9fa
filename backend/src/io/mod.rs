//! # IO Module
//!
//! Interface layer between the browser UI and the page controllers. The
//! only transport is the local REST bridge in [`rest`]; it translates HTTP
//! requests into controller calls and controller results into JSON.

pub mod rest;

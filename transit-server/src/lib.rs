//! Bus journey planner server.
//!
//! A web service that answers: "how do I get from here to there by bus?"
//! Schedules are read from a directory of per-line JSON timetables, stitched
//! into a routing graph and searched for itineraries with walking legs,
//! scheduled departures and street geometry.

pub mod cache;
pub mod config;
pub mod domain;
pub mod geometry;
pub mod graph;
pub mod planner;
pub mod schedule;
pub mod web;
